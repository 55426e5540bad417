// self
use crate::{error::ErrorKind, obs::ExchangeOutcome};

/// Records an exchange outcome via the global metrics recorder (when enabled).
pub fn record_exchange_outcome(outcome: ExchangeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth_exchange_flow_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a classified terminal error via the global metrics recorder (when enabled).
pub fn record_exchange_error(kind: ErrorKind) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth_exchange_error_total", "kind" => kind.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = kind;
	}
}
