#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use authed_fetch::{
	_preludet::*,
	error::ExpiryReason,
	http_types::StatusCode,
	session::RefreshState,
};

const REFRESH_PATH: &str = "/auth/refresh/";

#[tokio::test]
async fn valid_token_returns_body_without_refresh() {
	let server = MockServer::start_async().await;
	let client = build_logged_in_client(&server.base_url(), "valid");
	let lead = server
		.mock_async(|when, then| {
			when.method(GET).path("/leads/42/").header("authorization", "Bearer valid");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":42,\"name\":\"Jane Doe\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).body("{\"access_token\":\"unexpected\"}");
		})
		.await;
	let response = client.get("/leads/42/").await.expect("Valid token should be accepted.");

	assert_eq!(response.status(), StatusCode::OK);

	let body: serde_json::Value = response.json().expect("Lead body should decode.");

	assert_eq!(body["name"], "Jane Doe");

	lead.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_retried_once() {
	let server = MockServer::start_async().await;
	let client = build_logged_in_client(&server.base_url(), "stale");
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/students/").header("authorization", "Bearer stale");
			then.status(401).body("{\"detail\":\"Given token not valid for any token type\"}");
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/students/").header("authorization", "Bearer fresh");
			then.status(200).body("{\"count\":0,\"results\":[]}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh\"}");
		})
		.await;
	let response = client.get("students/").await.expect("Retry should succeed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		client.session().current().expect("Refreshed token should be stored.").secret.expose(),
		"fresh"
	);

	rejected.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn second_unauthorized_is_terminal() {
	let server = MockServer::start_async().await;
	let client = build_logged_in_client(&server.base_url(), "stale");
	let resource = server
		.mock_async(|when, then| {
			when.method(GET).path("/tasks/");
			then.status(401).body("{\"detail\":\"User is inactive\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).body("{\"access_token\":\"also-rejected\"}");
		})
		.await;
	let err = client.get("tasks/").await.expect_err("Two 401s should be terminal.");

	assert!(matches!(err, Error::AuthExpired { reason: ExpiryReason::RetryRejected }));

	resource.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_unauthorized_statuses_pass_through() {
	for status in [200_u16, 201, 400, 403, 404, 500] {
		let server = MockServer::start_async().await;
		let client = build_logged_in_client(&server.base_url(), "valid");
		let resource = server
			.mock_async(|when, then| {
				when.method(POST).path("/leads/");
				then.status(status).body(format!("{{\"status\":{status}}}"));
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path(REFRESH_PATH);
				then.status(200).body("{\"access_token\":\"unexpected\"}");
			})
			.await;
		let response = client
			.post_json("leads/", &serde_json::json!({ "name": "Jane" }))
			.await
			.expect("Every non-401 status should be returned.");

		assert_eq!(response.status().as_u16(), status);
		assert_eq!(response.text(), format!("{{\"status\":{status}}}"));

		resource.assert_calls_async(1).await;
		refresh.assert_calls_async(0).await;
	}
}

#[tokio::test]
async fn validation_errors_decode_from_bad_request() {
	let server = MockServer::start_async().await;
	let client = build_logged_in_client(&server.base_url(), "valid");

	server
		.mock_async(|when, then| {
			when.method(PATCH).path("/staff/9/").json_body(serde_json::json!({ "email": "nope" }));
			then.status(400).body(
				"{\"email\":[\"Enter a valid email address.\"],\"non_field_errors\":[\"Staff member is archived.\"]}",
			);
		})
		.await;

	let response = client
		.patch_json("staff/9/", &serde_json::json!({ "email": "nope" }))
		.await
		.expect("400 should be returned as a response.");
	let errors = response.field_errors();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(errors.get("email"), Some("Enter a valid email address."));
	assert_eq!(errors.get("non_field_errors"), Some("Staff member is archived."));
}

#[tokio::test]
async fn rejected_refresh_without_token_never_dispatches() {
	let server = MockServer::start_async().await;
	let client = build_test_client(&server.base_url());
	let resource = server
		.mock_async(|when, then| {
			when.method(GET).path("/leads/");
			then.status(200).body("[]");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401).body("{\"detail\":\"Token is invalid or expired\"}");
		})
		.await;
	let err = client.get("leads/").await.expect_err("No token can be obtained.");

	assert!(matches!(err, Error::AuthExpired { reason: ExpiryReason::NoCredential }));
	assert_eq!(client.session().state(), RefreshState::Failed);

	let err = client.get("leads/").await.expect_err("Failed sessions fail fast.");

	assert!(matches!(err, Error::AuthExpired { reason: ExpiryReason::SessionFailed }));

	resource.assert_calls_async(0).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_outage_surfaces_as_unavailable() {
	let server = MockServer::start_async().await;
	let client = build_logged_in_client(&server.base_url(), "stale");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/notifications/");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(503).body("maintenance");
		})
		.await;

	let err = client.get("notifications/").await.expect_err("503 refresh should fail.");

	assert!(matches!(err, Error::RefreshUnavailable { status: 503 }));
	assert_eq!(client.session().state(), RefreshState::Idle);
	assert_eq!(
		client.session().current().expect("Transient failures keep the token.").secret.expose(),
		"stale"
	);
}
