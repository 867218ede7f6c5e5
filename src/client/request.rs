//! Logical request description, independent of the token it will eventually carry.

// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, IntoHeaderName},
};
// self
use crate::{_prelude::*, auth::AccessToken, http::HttpRequest};

/// One logical request: method, target, headers, and an already-serialized body.
///
/// The same value is dispatched for the first attempt and for the retry, each time with the
/// token current at dispatch time.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	target: String,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request with an arbitrary method.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), headers: HeaderMap::new(), body: None }
	}

	/// `GET` request.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(Method::GET, target)
	}

	/// `POST` request.
	pub fn post(target: impl Into<String>) -> Self {
		Self::new(Method::POST, target)
	}

	/// `PUT` request.
	pub fn put(target: impl Into<String>) -> Self {
		Self::new(Method::PUT, target)
	}

	/// `PATCH` request.
	pub fn patch(target: impl Into<String>) -> Self {
		Self::new(Method::PATCH, target)
	}

	/// `DELETE` request.
	pub fn delete(target: impl Into<String>) -> Self {
		Self::new(Method::DELETE, target)
	}

	/// Sets a header, replacing earlier values. `Authorization` is always overwritten at
	/// dispatch.
	pub fn header<K>(mut self, name: K, value: HeaderValue) -> Self
	where
		K: IntoHeaderName,
	{
		self.headers.insert(name, value);

		self
	}

	/// Attaches a pre-serialized body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and sets `content-type: application/json`.
	pub fn json<B>(self, value: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)
			.map_err(|e| Error::invalid_request(format_args!("JSON body: {e}")))?;

		Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")).body(body))
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target as supplied by the caller (absolute URL or base-relative path).
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Caller-supplied headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Serialized body, if any.
	pub fn body_bytes(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Builds the dispatchable request for `url`, carrying `token` as the bearer credential.
	pub fn prepare(&self, url: &Url, token: &AccessToken) -> Result<HttpRequest> {
		let mut request = ::http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone().unwrap_or_default())
			.map_err(|e| Error::invalid_request(format_args!("target `{url}`: {e}")))?;
		let headers = request.headers_mut();

		headers.extend(self.headers.clone());
		headers.insert(AUTHORIZATION, token.bearer_header()?);

		if !headers.contains_key(ACCEPT) {
			headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		}

		Ok(request)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn url() -> Url {
		Url::parse("https://crm.example.com/api/leads/").expect("Fixture URL should parse.")
	}

	#[test]
	fn prepare_attaches_bearer_and_defaults_accept() {
		let request = ApiRequest::post("leads/")
			.header(AUTHORIZATION, HeaderValue::from_static("Bearer spoofed"))
			.json(&serde_json::json!({ "name": "Jane" }))
			.expect("JSON body should serialize.");

		assert_eq!(request.body_bytes(), Some(&br#"{"name":"Jane"}"#[..]));

		let prepared = request
			.prepare(&url(), &AccessToken::new(TokenSecret::new("current")))
			.expect("Request should prepare.");

		assert_eq!(prepared.method(), &Method::POST);
		assert_eq!(prepared.uri(), "https://crm.example.com/api/leads/");
		assert_eq!(prepared.headers()[AUTHORIZATION], "Bearer current");
		assert_eq!(prepared.headers()[ACCEPT], "application/json");
		assert_eq!(prepared.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(prepared.body().as_slice(), br#"{"name":"Jane"}"#);
	}

	#[test]
	fn caller_accept_header_is_kept() {
		let request = ApiRequest::get("reports/attendance.pdf")
			.header(ACCEPT, HeaderValue::from_static("application/pdf"));

		assert!(request.body_bytes().is_none());

		let prepared = request
			.prepare(&url(), &AccessToken::new(TokenSecret::new("current")))
			.expect("Request should prepare.");

		assert_eq!(prepared.headers()[ACCEPT], "application/pdf");
		assert!(prepared.body().is_empty());
	}
}
