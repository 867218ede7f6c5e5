//! Bearer-authenticated fetch client for REST consoles: single-flight token refresh, one-shot
//! 401 retry, and transport-aware observability in one small crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod problem;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::TokenSecret,
		client::{AuthenticatedClient, ConsoleClient},
		config::ClientConfig,
		http::ReqwestTransport,
		session::{Session, TokenRefresher},
	};

	/// Builds a [`ClientConfig`] rooted at a mock server URL (loopback HTTP is accepted).
	pub fn test_config(base_url: &str) -> ClientConfig {
		let base_url = Url::parse(base_url).expect("Mock server URL should parse.");

		ClientConfig::builder(base_url)
			.request_timeout(std::time::Duration::from_secs(5))
			.refresh_timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Test client configuration should validate.")
	}

	/// Constructs a [`ConsoleClient`] against `base_url` using the default HTTP refresher.
	pub fn build_test_client(base_url: &str) -> ConsoleClient {
		ConsoleClient::new(test_config(base_url))
			.expect("Failed to build reqwest-backed console client for tests.")
	}

	/// Constructs a [`ConsoleClient`] whose session is already logged in with `token`.
	pub fn build_logged_in_client(base_url: &str, token: &str) -> ConsoleClient {
		let client = build_test_client(base_url);

		client.session().login(TokenSecret::new(token));

		client
	}

	/// Constructs a reqwest-backed client that refreshes through a caller-supplied refresher.
	pub fn build_client_with_refresher(
		base_url: &str,
		refresher: Arc<dyn TokenRefresher>,
	) -> (ConsoleClient, Arc<Session>) {
		let config = test_config(base_url);
		let transport = ReqwestTransport::from_config(&config)
			.expect("Failed to build reqwest transport for tests.");
		let session = Arc::new(Session::new(refresher));
		let client = AuthenticatedClient::<ReqwestTransport>::with_transport(
			config,
			transport,
			session.clone(),
		);

		(client, session)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
