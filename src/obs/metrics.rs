// self
use crate::obs::{OpOutcome, PipelineOp};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(op: PipelineOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"auth_relay_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}
