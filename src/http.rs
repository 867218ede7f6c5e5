//! Transport primitives for authenticated resource calls and refresh exchanges.
//!
//! The module exposes [`HttpTransport`], the crate's only dependency on an HTTP stack,
//! together with the [`HttpRequest`]/[`HttpResponse`] aliases built on the `http` crate.
//! Implementations receive a fully prepared request (URL, method, headers, serialized body)
//! plus the deadline for that call, and must surface any failure to obtain a response as
//! a [`TransportError`]. Received responses, whatever their status, are returned as `Ok`.

// crates.io
#[cfg(feature = "reqwest")] use ::http::header::USER_AGENT;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, error::ConfigError};

/// Fully prepared outbound request.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Response received from the backend, body fully buffered.
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing prepared requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// request loop and the refresher, and the futures they return must be `Send` so callers
/// can spawn requests on multi-threaded executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`, giving up once `timeout` elapses.
	///
	/// # Contract
	///
	/// - Any response that arrives, including 4xx/5xx, resolves to `Ok`.
	/// - Deadline expiry resolves to [`TransportError::Timeout`].
	/// - Connection, DNS, and TLS failures resolve to [`TransportError::Network`].
	fn execute(&self, request: HttpRequest, timeout: Duration) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Clients built through [`ReqwestTransport::from_config`] keep a cookie store, which lets
/// the default refresher exchange a session cookie for a new access token.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a cookie-aware client honoring the configured user agent.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().cookie_store(true);

		if let Some(user_agent) = config.user_agent.as_deref() {
			let value = ::http::HeaderValue::from_str(user_agent).map_err(|_| {
				ConfigError::InvalidUserAgent { user_agent: user_agent.to_owned() }
			})?;
			let mut headers = ::http::HeaderMap::new();

			headers.insert(USER_AGENT, value);

			builder = builder.default_headers(headers);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest, timeout: Duration) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let target = redacted_target(request.uri());
			let mut request = reqwest::Request::try_from(request)
				.map_err(|e| map_reqwest_error(&target, timeout, e))?;

			*request.timeout_mut() = Some(timeout);

			let response =
				client.execute(request).await.map_err(|e| map_reqwest_error(&target, timeout, e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body =
				response.bytes().await.map_err(|e| map_reqwest_error(&target, timeout, e))?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(target: &str, timeout: Duration, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		return TransportError::timeout(target, timeout);
	}

	TransportError::network(target, err)
}

/// Renders a URI without its query string, which may carry filters or identifiers.
pub(crate) fn redacted_target(uri: &::http::Uri) -> String {
	match (uri.scheme_str(), uri.authority()) {
		(Some(scheme), Some(authority)) => format!("{scheme}://{authority}{}", uri.path()),
		_ => uri.path().to_owned(),
	}
}

/// Renders a URL without its query string or fragment.
pub(crate) fn redacted_url(url: &Url) -> String {
	let mut shown = url.clone();

	shown.set_query(None);
	shown.set_fragment(None);

	shown.into()
}
