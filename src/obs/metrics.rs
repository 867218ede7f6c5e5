// self
use crate::obs::{CallKind, CallOutcome};

/// Bumps `authed_fetch_call_total{call, outcome}` on the installed recorder.
///
/// Compiles to nothing without the `metrics` feature.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"authed_fetch_call_total",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::BTreeSet;
	// self
	use super::*;

	#[test]
	fn every_outcome_label_is_distinct() {
		let outcomes = [
			CallOutcome::Attempt,
			CallOutcome::Success,
			CallOutcome::Failure,
			CallOutcome::Retry,
			CallOutcome::Joined,
		];
		let labels = outcomes.iter().map(|outcome| outcome.as_str()).collect::<BTreeSet<_>>();

		assert_eq!(labels.len(), outcomes.len());

		for outcome in outcomes {
			record_call_outcome(CallKind::Refresh, outcome);
			record_call_outcome(CallKind::Request, outcome);
		}
	}
}
