//! Refresh capability injected into sessions, plus the default HTTP implementation.

// crates.io
use ::http::{
	Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	error::{ConfigError, ExpiryReason, TransportError},
	http::{HttpRequest, HttpTransport},
};

/// Boxed future returned by [`TokenRefresher::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, RefreshError>> + 'a + Send>>;

/// Exchanges a longer-lived credential (session cookie, refresh token) for a new access token.
///
/// Sessions call [`refresh`](TokenRefresher::refresh) under their singleflight guard, so an
/// implementation never sees two overlapping calls from the same session.
pub trait TokenRefresher
where
	Self: Send + Sync,
{
	/// Performs one refresh exchange.
	fn refresh(&self) -> RefreshFuture<'_>;
}

/// Failure classes reported by a [`TokenRefresher`].
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// The refresh credential is invalid or expired; the session must log in again.
	#[error("Refresh credential was rejected: {reason}.")]
	Rejected {
		/// HTTP status code, when one was received.
		status: Option<u16>,
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// The refresh endpoint answered with a transient status (408, 429, 5xx).
	#[error("Refresh endpoint is temporarily unavailable (HTTP {status}).")]
	Unavailable {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// No response was received from the refresh endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl RefreshError {
	/// Builds a rejection with an optional status.
	pub fn rejected(status: Option<u16>, reason: impl Into<String>) -> Self {
		Self::Rejected { status, reason: reason.into() }
	}

	/// Returns `true` when the failure invalidates the session (as opposed to a transient
	/// failure that a later refresh may overcome).
	pub fn is_rejection(&self) -> bool {
		matches!(self, Self::Rejected { .. })
	}
}
impl From<RefreshError> for Error {
	fn from(e: RefreshError) -> Self {
		match e {
			RefreshError::Rejected { .. } => Error::auth_expired(ExpiryReason::RefreshRejected),
			RefreshError::Unavailable { status } => Error::RefreshUnavailable { status },
			RefreshError::Transport(inner) => Error::Network(inner),
		}
	}
}

#[derive(Deserialize)]
struct RefreshResponse {
	#[serde(alias = "access")]
	access_token: String,
	#[serde(default, alias = "refresh_token")]
	refresh: Option<String>,
}

/// Default refresher: `POST`s to the configured refresh endpoint and reads `access_token`.
///
/// When constructed with a refresh credential the request body is `{"refresh": "<credential>"}`;
/// otherwise the body is `{}` and the transport's cookie store is expected to carry the
/// session credential. A rotated `refresh`/`refresh_token` in the response replaces the
/// stored credential.
pub struct HttpTokenRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	endpoint: Url,
	timeout: Duration,
	credential: RwLock<Option<TokenSecret>>,
}
impl<T> HttpTokenRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a refresher targeting `endpoint` through `transport`.
	pub fn new(transport: impl Into<Arc<T>>, endpoint: Url, timeout: Duration) -> Self {
		Self { transport: transport.into(), endpoint, timeout, credential: RwLock::new(None) }
	}

	/// Creates a refresher from the client configuration's refresh endpoint and deadline.
	pub fn from_config(
		transport: impl Into<Arc<T>>,
		config: &ClientConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(transport, config.refresh_url()?, config.refresh_timeout))
	}

	/// Sends `credential` in the body of every refresh request.
	pub fn with_credential(self, credential: TokenSecret) -> Self {
		*self.credential.write() = Some(credential);

		self
	}

	/// Refresh credential currently in use, if any.
	pub fn credential(&self) -> Option<TokenSecret> {
		self.credential.read().clone()
	}

	fn build_request(&self) -> Result<HttpRequest, RefreshError> {
		let body = match self.credential.read().as_ref() {
			Some(secret) => serde_json::json!({ "refresh": secret.expose() }),
			None => serde_json::json!({}),
		};
		let body = serde_json::to_vec(&body)
			.map_err(|e| RefreshError::rejected(None, format!("refresh body: {e}")))?;

		::http::Request::builder()
			.method(Method::POST)
			.uri(self.endpoint.as_str())
			.header(ACCEPT, "application/json")
			.header(CONTENT_TYPE, "application/json")
			.body(body)
			.map_err(|e| RefreshError::rejected(None, format!("refresh request: {e}")))
	}

	fn classify(&self, status: StatusCode, body: &[u8]) -> Result<TokenSecret, RefreshError> {
		if status.is_success() {
			return self.decode(status, body);
		}
		if status == StatusCode::REQUEST_TIMEOUT
			|| status == StatusCode::TOO_MANY_REQUESTS
			|| status.is_server_error()
		{
			return Err(RefreshError::Unavailable { status: status.as_u16() });
		}

		Err(RefreshError::rejected(Some(status.as_u16()), body_preview(body)))
	}

	fn decode(&self, status: StatusCode, body: &[u8]) -> Result<TokenSecret, RefreshError> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let response: RefreshResponse = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			RefreshError::rejected(
				Some(status.as_u16()),
				format!("malformed refresh response at `{}`", e.path()),
			)
		})?;

		if let Some(rotated) = response.refresh.filter(|value| !value.trim().is_empty()) {
			*self.credential.write() = Some(TokenSecret::new(rotated));
		}

		Ok(TokenSecret::new(response.access_token))
	}
}
impl<T> TokenRefresher for HttpTokenRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(async move {
			let request = self.build_request()?;
			let response = self.transport.execute(request, self.timeout).await?;

			self.classify(response.status(), response.body())
		})
	}
}
impl<T> Debug for HttpTokenRefresher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenRefresher")
			.field("endpoint", &self.endpoint.as_str())
			.field("timeout", &self.timeout)
			.field("credential_set", &self.credential.read().is_some())
			.finish()
	}
}

fn body_preview(body: &[u8]) -> String {
	const LIMIT: usize = 160;

	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return "empty response body".into();
	}

	match text.char_indices().nth(LIMIT) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}
