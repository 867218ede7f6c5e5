// crates.io
use ::http::Method;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ExpiryReason, session::RefreshError};

/// Future returned by [`CallSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`CallSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapped around one resource request or one refresh.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Span for a resource call; `target` is the caller-supplied path, never a full URL.
	pub fn request(method: &Method, target: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!("authed_fetch.request", method = %method, target),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, target);

			Self {}
		}
	}

	/// Span for a refresh requested by a caller holding `observed_generation`.
	pub fn refresh(observed_generation: u64) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("authed_fetch.refresh", observed_generation) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = observed_generation;

			Self {}
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn emit_unauthorized(target: &str, retrying: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(target_url = target, retrying, "resource rejected the access token (401)");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (target, retrying);
	}
}

pub(crate) fn emit_refresh_failure(error: &RefreshError) {
	#[cfg(feature = "tracing")]
	{
		if error.is_rejection() {
			tracing::warn!(error = %error, "refresh credential rejected");
		} else {
			tracing::error!(error = %error, "refresh call failed");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

pub(crate) fn emit_token_refreshed(secret: &TokenSecret) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(token = %secret.hint(), "access token refreshed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = secret;
	}
}

pub(crate) fn emit_session_expired(reason: ExpiryReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason = reason.as_str(), "session expired; re-authentication required");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
