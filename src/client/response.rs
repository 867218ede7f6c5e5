//! Responses handed back by the client, plus helpers for the backend's JSON conventions.

// crates.io
use ::http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	http::{self, HttpResponse},
	problem::FieldErrors,
};

/// Final response of a logical request; any status other than 401 ends up here.
#[derive(Debug)]
pub struct ApiResponse {
	url: Url,
	inner: HttpResponse,
}
impl ApiResponse {
	/// Wraps a received response for `url`.
	pub fn new(url: Url, inner: HttpResponse) -> Self {
		Self { url, inner }
	}

	/// Resolved URL the response came from.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Response status.
	pub fn status(&self) -> StatusCode {
		self.inner.status()
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status().is_success()
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		self.inner.headers()
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		self.inner.body()
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(self.body()).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(self.body());

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { target: http::redacted_url(&self.url), source })
	}

	/// Decodes the body as a paginated list envelope.
	pub fn page<T>(&self) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		self.json()
	}

	/// Decodes validation errors (`field -> first message`); empty for non-JSON bodies.
	pub fn field_errors(&self) -> FieldErrors {
		FieldErrors::from_slice(self.body())
	}

	/// Returns the underlying `http` response.
	pub fn into_inner(self) -> HttpResponse {
		self.inner
	}
}

/// Paginated list envelope: `{ "count", "next", "previous", "results" }`.
///
/// Every field is optional on the wire; a bare `{"results": [...]}` decodes with `count = 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Total number of items across all pages.
	#[serde(default)]
	pub count: u64,
	/// Absolute URL of the next page.
	#[serde(default)]
	pub next: Option<String>,
	/// Absolute URL of the previous page.
	#[serde(default)]
	pub previous: Option<String>,
	/// Items on this page.
	#[serde(default = "Vec::new")]
	pub results: Vec<T>,
}
impl<T> Page<T> {
	/// Returns `true` when a further page is advertised.
	pub fn has_next(&self) -> bool {
		self.next.as_deref().is_some_and(|next| !next.is_empty())
	}
}
