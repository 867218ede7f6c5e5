//! Authenticated request loop: bearer attachment, 401 detection, and the single retry.
//!
//! Every logical request walks an explicit two-step attempt loop. The first dispatch carries
//! the token the session currently holds (refreshing first when it holds none). A 401 sends
//! the client through [`Session::refresh_after`], which joins any refresh that already
//! superseded the rejected token, and the request is dispatched exactly once more. A second
//! 401 ends the request with [`Error::AuthExpired`]; every other status is handed back as an
//! [`ApiResponse`] without interpretation.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

// crates.io
use ::http::StatusCode;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ExpiryReason,
	http::{self, HttpTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{Session, TokenLease},
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestTransport,
	session::{HttpTokenRefresher, NoopObserver, SessionObserver},
};

/// Client specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ConsoleClient = AuthenticatedClient<ReqwestTransport>;

/// Issues bearer-authenticated requests against one backend.
///
/// The client owns the transport and shares the [`Session`] that holds the access token, so
/// cloning a client (or building several over the same session) never duplicates refreshes.
pub struct AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<ClientConfig>,
	transport: Arc<T>,
	session: Arc<Session>,
}
impl<T> AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that dispatches through `transport` and reads tokens from `session`.
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		session: Arc<Session>,
	) -> Self {
		Self { config: Arc::new(config), transport: transport.into(), session }
	}

	/// Session holding the access token and refresh state.
	pub fn session(&self) -> &Arc<Session> {
		&self.session
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Sends `request`, refreshing and retrying once if the backend answers 401.
	///
	/// # Errors
	///
	/// - [`Error::AuthExpired`] when no token can be obtained, or the refreshed token is
	///   rejected as well.
	/// - [`Error::Network`] when either dispatch (or the refresh) fails without a response.
	/// - [`Error::RefreshUnavailable`] when the refresh endpoint answers with a transient status.
	/// - [`Error::InvalidRequest`] when the target or headers cannot form a request.
	pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let span = CallSpan::request(request.method(), request.target());
		let result = span.instrument(self.dispatch(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Sends a `GET` to `target`.
	pub async fn get(&self, target: impl Into<String>) -> Result<ApiResponse> {
		self.request(ApiRequest::get(target)).await
	}

	/// Sends a `DELETE` to `target`.
	pub async fn delete(&self, target: impl Into<String>) -> Result<ApiResponse> {
		self.request(ApiRequest::delete(target)).await
	}

	/// Sends a `POST` to `target` with `body` serialized as JSON.
	pub async fn post_json<B>(&self, target: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(ApiRequest::post(target).json(body)?).await
	}

	/// Sends a `PUT` to `target` with `body` serialized as JSON.
	pub async fn put_json<B>(&self, target: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(ApiRequest::put(target).json(body)?).await
	}

	/// Sends a `PATCH` to `target` with `body` serialized as JSON.
	pub async fn patch_json<B>(&self, target: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.request(ApiRequest::patch(target).json(body)?).await
	}

	async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		let url = self.config.resolve(request.target())?;
		let mut lease = self.session.access_token().await?;
		let mut attempt = Attempt::First;

		loop {
			let response = self.send(&request, &url, &lease).await?;

			if response.status() != StatusCode::UNAUTHORIZED {
				return Ok(ApiResponse::new(url, response));
			}

			match attempt {
				Attempt::First => {
					obs::emit_unauthorized(&http::redacted_url(&url), true);
					obs::record_call_outcome(CallKind::Request, CallOutcome::Retry);

					lease = self.session.refresh_after(lease.generation).await?;
					attempt = Attempt::Retry;
				},
				Attempt::Retry => {
					obs::emit_unauthorized(&http::redacted_url(&url), false);
					self.session.notify_expired(ExpiryReason::RetryRejected);

					return Err(Error::auth_expired(ExpiryReason::RetryRejected));
				},
			}
		}
	}

	async fn send(
		&self,
		request: &ApiRequest,
		url: &Url,
		lease: &TokenLease,
	) -> Result<http::HttpResponse> {
		let prepared = request.prepare(url, &lease.token)?;

		Ok(self.transport.execute(prepared, self.config.request_timeout).await?)
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticatedClient<ReqwestTransport> {
	/// Creates a client with the default reqwest transport and HTTP refresher.
	///
	/// The transport keeps a cookie store shared with the refresher, so a session cookie set
	/// at login doubles as the refresh credential.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_observer(config, Arc::new(NoopObserver))
	}

	/// Same as [`AuthenticatedClient::new`], notifying `observer` about refreshes and expiry.
	pub fn with_observer(config: ClientConfig, observer: Arc<dyn SessionObserver>) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::from_config(&config)?);
		let refresher =
			HttpTokenRefresher::<ReqwestTransport>::from_config(transport.clone(), &config)?;
		let session = Session::new(Arc::new(refresher)).with_observer(observer);

		Ok(Self::with_transport(config, transport, Arc::new(session)))
	}
}
impl<T> Clone for AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			session: self.session.clone(),
		}
	}
}
impl<T> Debug for AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("session", &self.session)
			.finish()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	First,
	Retry,
}
