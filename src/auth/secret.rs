//! Bearer secrets that stay out of logs and debug output.

// self
use crate::_prelude::*;

/// Opaque bearer secret shared cheaply between the session and every waiter.
///
/// `Debug` and `Display` never print the value; [`TokenSecret::hint`] exposes only the
/// last characters for correlating log lines.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TokenSecret(Arc<str>);
impl TokenSecret {
	const HINT_CHARS: usize = 4;

	/// Wraps a secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Arc::from(value.into()))
	}

	/// Raw value, for building the `Authorization` header. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the secret is empty or whitespace; such a value cannot authenticate anything.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Masked rendering (`...wxyz`) that reveals at most the final four characters.
	///
	/// Secrets shorter than eight characters are fully masked.
	pub fn hint(&self) -> String {
		let count = self.0.chars().count();

		if count < Self::HINT_CHARS * 2 {
			return "...".into();
		}

		let tail = self.0.chars().skip(count - Self::HINT_CHARS).collect::<String>();

		format!("...{tail}")
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<TokenSecret> for String {
	fn from(secret: TokenSecret) -> Self {
		secret.0.as_ref().to_owned()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({})", self.hint())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
