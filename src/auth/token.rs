//! Bearer access tokens held in memory by a session.

// crates.io
use ::http::HeaderValue;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Short-lived bearer credential plus the instant the session obtained it.
///
/// Expiry is defined by the server; the session learns about it only through a 401.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Instant the session stored the token (login or refresh).
	pub obtained_at: OffsetDateTime,
}
impl AccessToken {
	/// Wraps a secret obtained right now.
	pub fn new(secret: TokenSecret) -> Self {
		Self::with_obtained_at(secret, OffsetDateTime::now_utc())
	}

	/// Wraps a secret obtained at the provided instant.
	pub fn with_obtained_at(secret: TokenSecret, instant: OffsetDateTime) -> Self {
		Self { secret, obtained_at: instant }
	}

	/// Builds the `Authorization` header value (`Bearer <token>`), flagged as sensitive.
	pub fn bearer_header(&self) -> Result<HeaderValue> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.secret.expose()))
			.map_err(|_| Error::invalid_request("access token is not a valid header value"))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("obtained_at", &self.obtained_at)
			.finish()
	}
}
