// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, config::ClientConfig, error::ConfigError};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend root URL.
	pub base_url: Url,
	/// Refresh endpoint path relative to the base URL.
	pub refresh_endpoint: String,
	/// Resource request deadline.
	pub request_timeout: Duration,
	/// Refresh call deadline.
	pub refresh_timeout: Duration,
	/// Optional `User-Agent` header value.
	pub user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided backend root and defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_endpoint: ClientConfig::DEFAULT_REFRESH_ENDPOINT.into(),
			request_timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT,
			refresh_timeout: ClientConfig::DEFAULT_REFRESH_TIMEOUT,
			user_agent: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.refresh_endpoint = endpoint.into();

		self
	}

	/// Overrides the resource request deadline.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the refresh call deadline.
	pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Sets the `User-Agent` header value.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = self.base_url;

		if base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: base_url.to_string() });
		}

		validate_scheme(&base_url)?;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		if self.request_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { timeout: "request" });
		}
		if self.refresh_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { timeout: "refresh" });
		}
		if let Some(user_agent) = self.user_agent.as_ref()
			&& ::http::HeaderValue::from_str(user_agent).is_err()
		{
			return Err(ConfigError::InvalidUserAgent { user_agent: user_agent.clone() });
		}

		let config = ClientConfig {
			base_url,
			refresh_endpoint: self.refresh_endpoint,
			request_timeout: self.request_timeout,
			refresh_timeout: self.refresh_timeout,
			user_agent: self.user_agent,
		};

		config.refresh_url()?;

		Ok(config)
	}
}

fn validate_scheme(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureBaseUrl { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn loopback_http_is_accepted_remote_http_is_not() {
		ClientConfig::builder(url("http://127.0.0.1:8080/"))
			.build()
			.expect("Loopback HTTP should be accepted.");
		ClientConfig::builder(url("http://localhost:8000/api/"))
			.build()
			.expect("localhost HTTP should be accepted.");

		let err = ClientConfig::builder(url("http://crm.example.com/"))
			.build()
			.expect_err("Remote HTTP should be rejected.");

		assert!(matches!(err, ConfigError::InsecureBaseUrl { .. }));
	}

	#[test]
	fn zero_timeouts_are_rejected() {
		let err = ClientConfig::builder(url("https://crm.example.com/"))
			.refresh_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero refresh timeout should be rejected.");

		assert!(matches!(err, ConfigError::ZeroTimeout { timeout: "refresh" }));
	}

	#[test]
	fn non_base_urls_and_bad_user_agents_are_rejected() {
		let err = ClientConfig::builder(url("mailto:admin@example.com"))
			.build()
			.expect_err("mailto URLs cannot be a base.");

		assert!(matches!(err, ConfigError::CannotBeABase { .. }));

		let err = ClientConfig::builder(url("https://crm.example.com/"))
			.user_agent("console\n1.0")
			.build()
			.expect_err("Control characters are not valid in headers.");

		assert!(matches!(err, ConfigError::InvalidUserAgent { .. }));
	}
}
