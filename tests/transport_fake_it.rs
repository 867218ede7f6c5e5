// std
use std::{
	collections::HashSet,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// self
use authed_fetch::{
	auth::{AccessToken, TokenSecret},
	client::{ApiRequest, AuthenticatedClient},
	config::ClientConfig,
	error::{Error, ExpiryReason, TransportError},
	http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
	http_types::{StatusCode, header::AUTHORIZATION},
	session::{RefreshFuture, Session, SessionObserver, TokenRefresher},
	url::Url,
};
use parking_lot::Mutex;

type Dispatch = (String, String);

/// Records every dispatch and answers 401 to revoked tokens.
#[derive(Default)]
struct RecordingTransport {
	revoked: Mutex<HashSet<String>>,
	dispatched: Mutex<Vec<Dispatch>>,
	network_down: Mutex<bool>,
}
impl RecordingTransport {
	fn revoke(&self, token: &str) {
		self.revoked.lock().insert(format!("Bearer {token}"));
	}

	fn dispatched(&self) -> Vec<Dispatch> {
		self.dispatched.lock().clone()
	}
}
impl HttpTransport for RecordingTransport {
	fn execute(&self, request: HttpRequest, timeout: std::time::Duration) -> TransportFuture<'_> {
		let path = request.uri().path().to_owned();
		let bearer = request
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.unwrap_or("<missing>")
			.to_owned();

		if *self.network_down.lock() {
			return Box::pin(async move { Err(TransportError::timeout(path, timeout)) });
		}

		let status = if self.revoked.lock().contains(&bearer) {
			StatusCode::UNAUTHORIZED
		} else {
			StatusCode::OK
		};

		self.dispatched.lock().push((path, bearer));

		let mut response = HttpResponse::new(b"{}".to_vec());

		*response.status_mut() = status;

		Box::pin(async move { Ok(response) })
	}
}

/// Hands out `rotated-1`, `rotated-2`, ... on each refresh.
#[derive(Default)]
struct CountingRefresher {
	calls: AtomicUsize,
}
impl TokenRefresher for CountingRefresher {
	fn refresh(&self) -> RefreshFuture<'_> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

		Box::pin(async move { Ok(TokenSecret::new(format!("rotated-{call}"))) })
	}
}

#[derive(Default)]
struct ExpiryLog {
	refreshed: Mutex<Vec<String>>,
	expired: Mutex<Vec<ExpiryReason>>,
}
impl SessionObserver for ExpiryLog {
	fn token_refreshed(&self, token: &AccessToken) {
		self.refreshed.lock().push(token.secret.expose().to_owned());
	}

	fn session_expired(&self, reason: ExpiryReason) {
		self.expired.lock().push(reason);
	}
}

struct Harness {
	client: AuthenticatedClient<RecordingTransport>,
	transport: Arc<RecordingTransport>,
	refresher: Arc<CountingRefresher>,
	log: Arc<ExpiryLog>,
}

fn harness() -> Harness {
	let config = ClientConfig::builder(
		Url::parse("https://crm.example.com/api/").expect("Fixture URL should parse."),
	)
	.build()
	.expect("Fixture configuration should validate.");
	let transport = Arc::new(RecordingTransport::default());
	let refresher = Arc::new(CountingRefresher::default());
	let log = Arc::new(ExpiryLog::default());
	let session = Arc::new(Session::new(refresher.clone()).with_observer(log.clone()));
	let client = AuthenticatedClient::<RecordingTransport>::with_transport(
		config,
		transport.clone(),
		session,
	);

	Harness { client, transport, refresher, log }
}

#[tokio::test]
async fn every_dispatch_carries_the_token_current_at_dispatch_time() {
	let Harness { client, transport, refresher, log } = harness();

	client.session().login(TokenSecret::new("login-1"));
	client.get("leads/").await.expect("First token should be accepted.");

	transport.revoke("login-1");
	client.get("students/").await.expect("Retry with the rotated token should succeed.");
	client.get("tasks/").await.expect("Rotated token should be reused.");

	client.session().login(TokenSecret::new("login-2"));
	client
		.request(ApiRequest::delete("notifications/7/"))
		.await
		.expect("Latest login should be used.");

	assert_eq!(
		transport.dispatched(),
		vec![
			("/api/leads/".to_owned(), "Bearer login-1".to_owned()),
			("/api/students/".to_owned(), "Bearer login-1".to_owned()),
			("/api/students/".to_owned(), "Bearer rotated-1".to_owned()),
			("/api/tasks/".to_owned(), "Bearer rotated-1".to_owned()),
			("/api/notifications/7/".to_owned(), "Bearer login-2".to_owned()),
		]
	);
	assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
	assert_eq!(*log.refreshed.lock(), vec!["rotated-1".to_owned()]);
}

#[tokio::test]
async fn retry_rejection_notifies_the_observer() {
	let Harness { client, transport, refresher, log } = harness();

	client.session().login(TokenSecret::new("login-1"));
	transport.revoke("login-1");
	transport.revoke("rotated-1");

	let err = client.get("staff/").await.expect_err("Both tokens are revoked.");

	assert!(matches!(err, Error::AuthExpired { reason: ExpiryReason::RetryRejected }));
	assert_eq!(transport.dispatched().len(), 2);
	assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
	assert_eq!(*log.expired.lock(), vec![ExpiryReason::RetryRejected]);
}

#[tokio::test]
async fn network_failures_are_returned_without_retry() {
	let Harness { client, transport, refresher, .. } = harness();

	client.session().login(TokenSecret::new("login-1"));
	*transport.network_down.lock() = true;

	let err = client.get("leads/").await.expect_err("Network failures should surface.");

	assert!(matches!(err, Error::Network(TransportError::Timeout { .. })));
	assert!(transport.dispatched().is_empty());
	assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
}
