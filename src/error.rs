//! Client-level error types shared across the session, transport, and request loop.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout); no response was received.
	#[error(transparent)]
	Network(#[from] TransportError),

	/// No valid credential could be obtained; the caller must re-authenticate.
	#[error("Session credentials expired and re-authentication is required: {reason}.")]
	AuthExpired {
		/// Why the session could not supply a usable credential.
		reason: ExpiryReason,
	},
	/// Refresh endpoint answered with a transient upstream status.
	#[error("Refresh endpoint is temporarily unavailable (HTTP {status}).")]
	RefreshUnavailable {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// Response body did not match the shape requested by the caller.
	#[error("Response body from {target} could not be decoded.")]
	Decode {
		/// Resource URL (query removed) whose body failed to decode.
		target: String,
		/// Structured decoding failure naming the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request could not be turned into a dispatchable HTTP call.
	#[error("Request could not be constructed: {reason}.")]
	InvalidRequest {
		/// Human-readable description of the construction failure.
		reason: String,
	},
}
impl Error {
	/// Returns `true` when the caller should send the user back through login.
	pub fn is_auth_expired(&self) -> bool {
		matches!(self, Self::AuthExpired { .. })
	}

	pub(crate) fn auth_expired(reason: ExpiryReason) -> Self {
		Self::AuthExpired { reason }
	}

	pub(crate) fn invalid_request(reason: impl Display) -> Self {
		Self::InvalidRequest { reason: reason.to_string() }
	}
}

/// Reasons attached to [`Error::AuthExpired`] and session observer notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
	/// No token was present and none could be obtained.
	NoCredential,
	/// The refresh endpoint rejected the refresh credential.
	RefreshRejected,
	/// A freshly refreshed token was rejected again by the resource endpoint.
	RetryRejected,
	/// The session already failed and awaits an explicit login.
	SessionFailed,
	/// The session was logged out while the request waited for a token.
	LoggedOut,
}
impl ExpiryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExpiryReason::NoCredential => "no_credential",
			ExpiryReason::RefreshRejected => "refresh_rejected",
			ExpiryReason::RetryRejected => "retry_rejected",
			ExpiryReason::SessionFailed => "session_failed",
			ExpiryReason::LoggedOut => "logged_out",
		}
	}
}
impl Display for ExpiryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Configuration document could not be parsed.
	#[error("Client configuration could not be parsed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Base URL is not usable as a join root (e.g. `mailto:` or `data:` URLs).
	#[error("Base URL `{url}` cannot be used as a base for relative endpoints.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must use HTTPS unless it points at a loopback host.
	#[error("Base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh endpoint cannot be resolved against the base URL.
	#[error("Refresh endpoint `{endpoint}` is invalid.")]
	InvalidRefreshEndpoint {
		/// Endpoint path as configured.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Timeouts must be strictly positive.
	#[error("The {timeout} timeout must be greater than zero.")]
	ZeroTimeout {
		/// Which timeout failed validation.
		timeout: &'static str,
	},
	/// User agent contains characters that cannot appear in a header.
	#[error("User agent `{user_agent}` is not a valid header value.")]
	InvalidUserAgent {
		/// User agent as configured.
		user_agent: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout). No response was received.
///
/// Sources are reference counted so a single failure can be handed to every caller that
/// joined the same refresh.
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Endpoint (or endpoint class) being called.
		target: String,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Call did not complete within its deadline.
	#[error("Call to {target} timed out after {after:?}.")]
	Timeout {
		/// Endpoint (or endpoint class) being called.
		target: String,
		/// Deadline that elapsed.
		after: Duration,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[source] Arc<std::io::Error>),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(target: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { target: target.into(), source: Arc::new(src) }
	}

	/// Builds a timeout failure for `target`.
	pub fn timeout(target: impl Into<String>, after: Duration) -> Self {
		Self::Timeout { target: target.into(), after }
	}

	/// Returns `true` when the failure was a deadline expiry.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(Arc::new(e))
	}
}
