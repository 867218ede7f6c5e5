//! Spans, events, and counters emitted by the request loop and the session.
//!
//! Both concerns sit behind crate features so a build without them compiles every hook down
//! to nothing:
//!
//! - `tracing` (default) opens an `authed_fetch.request` span around each resource call and an
//!   `authed_fetch.refresh` span around each refresh attempt. Rejected tokens, failed refreshes,
//!   and expired sessions are reported as warn/error events; a successful refresh is a debug
//!   event carrying only the token hint.
//! - `metrics` bumps `authed_fetch_call_total`, labeled by `call` and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What the client was doing when an outcome was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Authenticated resource request (including its single retry).
	Request,
	/// Token refresh coordinated by the session.
	Refresh,
}
impl CallKind {
	/// Label used for the `call` metric dimension.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::Refresh => "refresh",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a request or refresh ended, or that it started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// The call began.
	Attempt,
	/// The call returned a value.
	Success,
	/// The call returned an error.
	Failure,
	/// A 401 sent the request back through refresh for its one retry.
	Retry,
	/// The refresh was answered by a refresh another caller already ran.
	Joined,
}
impl CallOutcome {
	/// Label used for the `outcome` metric dimension.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
			CallOutcome::Retry => "retry",
			CallOutcome::Joined => "joined",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
