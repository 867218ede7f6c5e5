//! Walks a console session through the token lifecycle against a local mock backend.
//!
//! 1. Log in with an access token the backend has already expired.
//! 2. Fetch a paginated lead list: the first attempt gets a 401, the session refreshes through
//!    `POST /auth/refresh/`, and the request is retried once with the new token.
//! 3. Submit an invalid form and print the decoded field errors.
//! 4. Revoke the refresh credential and watch the observer receive the expiry notice.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use url::Url;
// self
use authed_fetch::{
	auth::{AccessToken, TokenSecret},
	client::ConsoleClient,
	config::ClientConfig,
	error::ExpiryReason,
	session::SessionObserver,
};

#[derive(Debug, Deserialize)]
struct Lead {
	id: u64,
	name: String,
}

struct PrintingObserver;
impl SessionObserver for PrintingObserver {
	fn token_refreshed(&self, token: &AccessToken) {
		println!("Token refreshed at {}.", token.obtained_at);
	}

	fn session_expired(&self, reason: ExpiryReason) {
		println!("Session expired ({reason}); redirecting to login.");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let config = ClientConfig::builder(Url::parse(&server.url("/api/"))?)
		.user_agent("console-demo/0.1")
		.build()?;
	let client = ConsoleClient::with_observer(config, Arc::new(PrintingObserver))?;
	let mut refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-access\"}");
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/leads/").header("authorization", "Bearer expired-access");
			then.status(401).body("{\"detail\":\"Given token not valid for any token type\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/leads/").header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"count\":2,\"next\":null,\"previous\":null,\"results\":[{\"id\":1,\"name\":\"Ada\"},{\"id\":2,\"name\":\"Grace\"}]}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/leads/");
			then.status(400).header("content-type", "application/json").body(
				"{\"phone\":[\"This field is required.\"],\"email\":\"Enter a valid email address.\"}",
			);
		})
		.await;

	client.session().login(TokenSecret::new("expired-access"));

	let page = client.get("leads/").await?.page::<Lead>()?;

	for lead in &page.results {
		println!("Lead #{}: {}.", lead.id, lead.name);
	}

	let rejected =
		client.post_json("leads/", &serde_json::json!({ "name": "Linus", "email": "nope" })).await?;

	println!("Create lead answered {}.", rejected.status());

	for (field, message) in rejected.field_errors().iter() {
		println!("  {field}: {message}");
	}

	refresh.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(401).body("{\"detail\":\"Token is blacklisted\"}");
		})
		.await;

	match client.session().force_refresh().await {
		Ok(lease) => println!("Unexpected refresh success: {:?}.", lease.token),
		Err(e) if e.is_auth_expired() => println!("Refresh rejected: {e}"),
		Err(e) => return Err(e.into()),
	}

	println!("Session state: {}.", client.session().state());

	Ok(())
}
