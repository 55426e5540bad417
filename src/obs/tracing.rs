// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedExchange<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedExchange<F> = F;

/// A span builder used by the exchange flow.
#[derive(Clone, Debug)]
pub struct ExchangeSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ExchangeSpan {
	/// Creates a new span tagged with the provider slug + stage.
	pub fn new(provider: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth_exchange.flow", provider, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (provider, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedExchange<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = ExchangeSpan::new("github", "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[cfg(not(feature = "tracing"))]
	#[test]
	fn span_noop_without_tracing() {
		let _span = ExchangeSpan::new("github", "test");
	}
}
