//! Optional observability helpers for the exchange flow.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth_exchange.flow` with the `provider` and
//!   `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth_exchange_flow_total` counter for every
//!   attempt/success/failure (labeled by `outcome`) and `oauth_exchange_error_total` labeled by
//!   classified error `kind`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each exchange invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeOutcome {
	/// Entry to the exchange operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl ExchangeOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ExchangeOutcome::Attempt => "attempt",
			ExchangeOutcome::Success => "success",
			ExchangeOutcome::Failure => "failure",
		}
	}
}
impl Display for ExchangeOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
