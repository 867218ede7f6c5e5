//! Validated client configuration: backend base URL, refresh endpoint, and call deadlines.
//!
//! Configurations are assembled through [`ClientConfigBuilder`] or loaded from a JSON
//! document with [`ClientConfig::from_json`]; both paths run the same validation so a
//! [`ClientConfig`] value is always usable.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Immutable configuration consumed by the client, session refresher, and transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Backend root; relative request targets are joined onto it. Always ends in `/`.
	pub base_url: Url,
	/// Refresh endpoint path, relative to [`ClientConfig::base_url`].
	#[serde(default = "ClientConfig::default_refresh_endpoint")]
	pub refresh_endpoint: String,
	/// Deadline applied to every resource request.
	#[serde(default = "ClientConfig::default_request_timeout")]
	pub request_timeout: Duration,
	/// Deadline applied to every refresh call.
	#[serde(default = "ClientConfig::default_refresh_timeout")]
	pub refresh_timeout: Duration,
	/// Optional `User-Agent` sent on every call.
	#[serde(default)]
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_ENDPOINT: &'static str = "auth/refresh/";
	/// Default resource request deadline.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
	/// Default refresh call deadline.
	pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

	/// Creates a new builder for the provided backend root.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: ClientConfig = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.into_builder().build()
	}

	/// Returns a builder seeded with this configuration.
	pub fn into_builder(self) -> ClientConfigBuilder {
		ClientConfigBuilder {
			base_url: self.base_url,
			refresh_endpoint: self.refresh_endpoint,
			request_timeout: self.request_timeout,
			refresh_timeout: self.refresh_timeout,
			user_agent: self.user_agent,
		}
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		join_relative(&self.base_url, &self.refresh_endpoint).map_err(|source| {
			ConfigError::InvalidRefreshEndpoint { endpoint: self.refresh_endpoint.clone(), source }
		})
	}

	/// Resolves a request target against the base URL.
	///
	/// Relative targets (`leads/42/`, `/students/`) are joined onto the base URL. Absolute
	/// targets are accepted only when they share the base URL's origin, so bearer tokens are
	/// never attached to third-party hosts.
	pub fn resolve(&self, target: &str) -> Result<Url> {
		match Url::parse(target) {
			Ok(absolute) => {
				if absolute.origin() == self.base_url.origin() {
					Ok(absolute)
				} else {
					Err(Error::invalid_request(format_args!(
						"target `{absolute}` is outside the configured origin `{}`",
						self.base_url.origin().ascii_serialization()
					)))
				}
			},
			Err(url::ParseError::RelativeUrlWithoutBase) => join_relative(&self.base_url, target)
				.map_err(|e| Error::invalid_request(format_args!("target `{target}`: {e}"))),
			Err(e) => Err(Error::invalid_request(format_args!("target `{target}`: {e}"))),
		}
	}

	fn default_refresh_endpoint() -> String {
		Self::DEFAULT_REFRESH_ENDPOINT.into()
	}

	fn default_request_timeout() -> Duration {
		Self::DEFAULT_REQUEST_TIMEOUT
	}

	fn default_refresh_timeout() -> Duration {
		Self::DEFAULT_REFRESH_TIMEOUT
	}
}

fn join_relative(base: &Url, target: &str) -> Result<Url, url::ParseError> {
	base.join(target.trim_start_matches('/'))
}
