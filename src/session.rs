//! Token slot and refresh coordination with singleflight guards, generation tracking, and
//! observer hooks.
//!
//! A [`Session`] owns the in-memory access token and the refresh state machine
//! (`Idle -> Refreshing -> Idle | Failed`). Every refresh runs under a single async guard:
//! callers that arrive while a refresh is in flight wait on that guard and, once released,
//! observe the outcome of the refresh they overlapped instead of starting another one.
//! Overlap is decided with the session generation captured in each [`TokenLease`]: the
//! generation advances on every completed refresh, login, and logout, so a caller whose
//! lease predates the latest successful refresh reuses its token. Transient failures are
//! shared only with callers that arrived while the failing refresh was still pending; anyone
//! arriving afterwards starts a new refresh.

mod metrics;
pub mod refresher;

pub use metrics::{RefreshCounts, RefreshMetrics};
pub use refresher::*;

// crates.io
use parking_lot::RwLockWriteGuard;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenSecret},
	error::ExpiryReason,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Observable refresh state of a [`Session`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
	/// No refresh in flight; the session may or may not hold a token.
	#[default]
	Idle,
	/// A refresh call is in flight; new refresh requests join it.
	Refreshing,
	/// The refresh credential was rejected; only [`Session::login`] recovers.
	Failed,
}
impl RefreshState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshState::Idle => "idle",
			RefreshState::Refreshing => "refreshing",
			RefreshState::Failed => "failed",
		}
	}
}
impl Display for RefreshState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access token snapshot paired with the session generation observed when it was read.
///
/// Pass [`TokenLease::generation`] to [`Session::refresh_after`] when the token is rejected;
/// the session uses it to join a refresh that already superseded this lease.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenLease {
	/// Token to attach to the next dispatch.
	pub token: AccessToken,
	/// Session generation at the moment the token was read.
	pub generation: u64,
}

/// Hooks for the external auth collaborator (persistence, login redirects).
///
/// Hooks run synchronously after the session state is updated and without any session lock
/// held, so implementations may call back into the session.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Called after a refresh stored a new token.
	fn token_refreshed(&self, token: &AccessToken) {
		let _ = token;
	}

	/// Called when the session can no longer supply credentials; the collaborator is
	/// expected to send the user through login.
	fn session_expired(&self, reason: ExpiryReason) {
		let _ = reason;
	}
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;
impl SessionObserver for NoopObserver {}

#[derive(Debug, Default)]
struct SessionState {
	token: Option<AccessToken>,
	token_generation: u64,
	generation: u64,
	phase: RefreshState,
	refreshes_started: u64,
	last_failure: Option<TransientFailure>,
}
impl SessionState {
	/// Oldest refresh whose transient failure a caller arriving now may share.
	fn joinable_from(&self) -> u64 {
		match self.phase {
			RefreshState::Refreshing => self.refreshes_started,
			_ => self.refreshes_started + 1,
		}
	}
}

#[derive(Debug)]
struct TransientFailure {
	refresh: u64,
	error: RefreshError,
}

/// Process-wide (per client) token slot plus refresh state machine.
pub struct Session {
	state: Arc<RwLock<SessionState>>,
	refresh_guard: AsyncMutex<()>,
	refresher: Arc<dyn TokenRefresher>,
	observer: Arc<dyn SessionObserver>,
	metrics: Arc<RefreshMetrics>,
}
impl Session {
	/// Creates an idle, logged-out session that refreshes through `refresher`.
	pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
		Self {
			state: Default::default(),
			refresh_guard: AsyncMutex::new(()),
			refresher,
			observer: Arc::new(NoopObserver),
			metrics: Default::default(),
		}
	}

	/// Installs the observer notified about refreshes and expiries.
	pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Shared refresh counters.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// Current refresh state.
	pub fn state(&self) -> RefreshState {
		self.state.read().phase
	}

	/// Current session generation.
	pub fn generation(&self) -> u64 {
		self.state.read().generation
	}

	/// Token currently held, if any.
	pub fn current(&self) -> Option<AccessToken> {
		self.state.read().token.clone()
	}

	/// Stores a token obtained by an external login and resets the session to `Idle`.
	pub fn login(&self, secret: TokenSecret) -> TokenLease {
		let token = AccessToken::new(secret);
		let mut state = self.state.write();

		state.generation += 1;
		state.token = Some(token.clone());
		state.token_generation = state.generation;
		state.phase = RefreshState::Idle;
		state.last_failure = None;

		TokenLease { token, generation: state.generation }
	}

	/// Discards the token and resets the session to `Idle`.
	pub fn logout(&self) {
		let mut state = self.state.write();

		state.generation += 1;
		state.token = None;
		state.phase = RefreshState::Idle;
		state.last_failure = None;
	}

	/// Returns the current token, refreshing (or joining a refresh) when none is held.
	///
	/// Fails fast with [`Error::AuthExpired`] while the session is `Failed`.
	pub async fn access_token(&self) -> Result<TokenLease> {
		let generation = {
			let state = self.state.read();

			if state.phase == RefreshState::Failed {
				return Err(Error::auth_expired(ExpiryReason::SessionFailed));
			}
			if let Some(token) = state.token.as_ref() {
				return Ok(TokenLease { token: token.clone(), generation: state.generation });
			}

			state.generation
		};

		self.refresh_after(generation).await.map_err(|err| match err {
			Error::AuthExpired { reason: ExpiryReason::RefreshRejected } =>
				Error::auth_expired(ExpiryReason::NoCredential),
			other => other,
		})
	}

	/// Forces a refresh of whatever token is currently held.
	pub async fn force_refresh(&self) -> Result<TokenLease> {
		let generation = self.generation();

		self.refresh_after(generation).await
	}

	/// Refreshes the token that was read at `observed_generation`.
	///
	/// If a refresh already replaced that token, the new token is returned without contacting
	/// the refresh endpoint again. A transient failure is returned only when the failing
	/// refresh was pending, or started, while this call waited for its turn.
	pub async fn refresh_after(&self, observed_generation: u64) -> Result<TokenLease> {
		const KIND: CallKind = CallKind::Refresh;

		let joinable_from = self.state.read().joinable_from();
		let span = CallSpan::refresh(observed_generation);
		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				if let Some(joined) = self.joined_outcome(observed_generation, joinable_from) {
					self.metrics.record_join();
					obs::record_call_outcome(KIND, CallOutcome::Joined);

					return joined;
				}

				obs::record_call_outcome(KIND, CallOutcome::Attempt);
				self.metrics.record_attempt();

				self.run_refresh().await
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	pub(crate) fn notify_expired(&self, reason: ExpiryReason) {
		obs::emit_session_expired(reason);
		self.observer.session_expired(reason);
	}

	/// Decides whether a caller holding `observed_generation` must refresh or can reuse the
	/// outcome of a refresh that already completed.
	fn joined_outcome(
		&self,
		observed_generation: u64,
		joinable_from: u64,
	) -> Option<Result<TokenLease>> {
		let state = self.state.read();

		if state.phase == RefreshState::Failed {
			return Some(Err(Error::auth_expired(ExpiryReason::SessionFailed)));
		}
		if state.generation == observed_generation {
			return None;
		}
		if let Some(token) = state.token.as_ref()
			&& state.token_generation > observed_generation
		{
			return Some(Ok(TokenLease { token: token.clone(), generation: state.generation }));
		}

		state
			.last_failure
			.as_ref()
			.filter(|failure| failure.refresh >= joinable_from)
			.map(|failure| Err(failure.error.clone().into()))
	}

	async fn run_refresh(&self) -> Result<TokenLease> {
		let (started, refresh) = {
			let mut state = self.state.write();

			state.phase = RefreshState::Refreshing;
			state.refreshes_started += 1;

			(state.generation, state.refreshes_started)
		};
		let mut phase = RefreshingPhase::new(self.state.clone());
		let outcome = self.refresher.refresh().await;

		phase.disarm();

		let mut state = self.state.write();

		if state.generation != started {
			// Login or logout landed while the refresh was in flight.
			let superseded = match state.token.as_ref() {
				Some(token) => Ok(TokenLease { token: token.clone(), generation: state.generation }),
				None => Err(Error::auth_expired(ExpiryReason::LoggedOut)),
			};

			drop(state);
			self.metrics.record_superseded();

			return superseded;
		}

		state.generation += 1;

		match outcome {
			Ok(secret) if !secret.is_blank() => {
				let token = AccessToken::new(secret);

				state.token = Some(token.clone());
				state.token_generation = state.generation;
				state.phase = RefreshState::Idle;
				state.last_failure = None;

				let lease = TokenLease { token, generation: state.generation };

				drop(state);
				self.metrics.record_success();
				obs::emit_token_refreshed(&lease.token.secret);
				self.observer.token_refreshed(&lease.token);

				Ok(lease)
			},
			Ok(_) => self.fail_session(
				state,
				RefreshError::rejected(None, "refresh response carried an empty access token"),
			),
			Err(failure) if failure.is_rejection() => self.fail_session(state, failure),
			Err(failure) => {
				state.phase = RefreshState::Idle;
				state.last_failure = Some(TransientFailure { refresh, error: failure.clone() });

				drop(state);
				self.metrics.record_failure();
				obs::emit_refresh_failure(&failure);

				Err(failure.into())
			},
		}
	}

	/// Moves to `Failed` under the guard taken when the refresh finished, so a concurrent login
	/// cannot land between the outcome check and the transition.
	fn fail_session(
		&self,
		mut state: RwLockWriteGuard<'_, SessionState>,
		failure: RefreshError,
	) -> Result<TokenLease> {
		state.token = None;
		state.phase = RefreshState::Failed;
		state.last_failure = None;

		drop(state);

		self.metrics.record_failure();
		obs::emit_refresh_failure(&failure);
		self.notify_expired(ExpiryReason::RefreshRejected);

		Err(failure.into())
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("Session")
			.field("phase", &state.phase)
			.field("generation", &state.generation)
			.field("token_set", &state.token.is_some())
			.finish()
	}
}

/// Returns the session to `Idle` if the refresh future is dropped before completing.
struct RefreshingPhase {
	state: Arc<RwLock<SessionState>>,
	armed: bool,
}
impl RefreshingPhase {
	fn new(state: Arc<RwLock<SessionState>>) -> Self {
		Self { state, armed: true }
	}

	fn disarm(&mut self) {
		self.armed = false;
	}
}
impl Drop for RefreshingPhase {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}

		let mut state = self.state.write();

		if state.phase == RefreshState::Refreshing {
			state.phase = RefreshState::Idle;
		}
	}
}
