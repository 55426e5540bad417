//! Fire-and-forget lifecycle telemetry.
//!
//! One event is emitted per exchange milestone (`oauth_start`,
//! `oauth_exchange_success`, `oauth_exchange_failure`), each a flat JSON object
//! carrying a timestamp and the session trace id. Emission is decoupled from
//! the exchange path through a bounded [`TelemetryQueue`]: `emit` never blocks
//! and never fails, and sink failures during the drain are swallowed so they
//! can never alter an exchange result.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{_prelude::*, error::ErrorKind};

/// Lifecycle telemetry event payloads.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event")]
pub enum TelemetryEvent {
	/// Exchange invocation started.
	#[serde(rename = "oauth_start")]
	Start {
		/// Identity provider slug.
		provider: String,
		/// Session trace id for cross-system correlation.
		trace_id: String,
		/// Emission instant.
		#[serde(with = "time::serde::rfc3339")]
		at: OffsetDateTime,
	},
	/// Exchange resolved successfully.
	#[serde(rename = "oauth_exchange_success")]
	ExchangeSuccess {
		/// Identity provider slug.
		provider: String,
		/// Number of attempts actually made.
		attempts: u32,
		/// Session trace id for cross-system correlation.
		trace_id: String,
		/// Emission instant.
		#[serde(with = "time::serde::rfc3339")]
		at: OffsetDateTime,
	},
	/// Exchange surfaced a terminal classified error.
	#[serde(rename = "oauth_exchange_failure")]
	ExchangeFailure {
		/// Identity provider slug.
		provider: String,
		/// Classified error kind label.
		kind: ErrorKind,
		/// Number of attempts actually made.
		attempts: u32,
		/// Human-readable failure summary.
		message: String,
		/// Session trace id for cross-system correlation.
		trace_id: String,
		/// Emission instant.
		#[serde(with = "time::serde::rfc3339")]
		at: OffsetDateTime,
	},
}
impl TelemetryEvent {
	/// Builds a start event stamped with the current instant.
	pub fn start(provider: impl Into<String>, trace_id: impl Into<String>) -> Self {
		Self::Start {
			provider: provider.into(),
			trace_id: trace_id.into(),
			at: OffsetDateTime::now_utc(),
		}
	}

	/// Builds a success event stamped with the current instant.
	pub fn success(
		provider: impl Into<String>,
		trace_id: impl Into<String>,
		attempts: u32,
	) -> Self {
		Self::ExchangeSuccess {
			provider: provider.into(),
			attempts,
			trace_id: trace_id.into(),
			at: OffsetDateTime::now_utc(),
		}
	}

	/// Builds a failure event stamped with the current instant.
	pub fn failure(
		provider: impl Into<String>,
		trace_id: impl Into<String>,
		kind: ErrorKind,
		attempts: u32,
		message: impl Into<String>,
	) -> Self {
		Self::ExchangeFailure {
			provider: provider.into(),
			kind,
			attempts,
			message: message.into(),
			trace_id: trace_id.into(),
			at: OffsetDateTime::now_utc(),
		}
	}
}

/// Error type produced by [`TelemetrySink`] implementations.
///
/// Sink errors are logged (when `tracing` is enabled) and discarded; they never
/// propagate to exchange callers.
#[derive(Clone, Debug, ThisError)]
#[error("Telemetry sink rejected the event: {message}.")]
pub struct TelemetrySinkError {
	/// Human-readable error payload.
	pub message: String,
}
impl TelemetrySinkError {
	/// Creates a sink error from a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Future returned by [`TelemetrySink::send`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TelemetrySinkError>> + 'a + Send>>;

/// Outbound delivery contract for telemetry events.
pub trait TelemetrySink
where
	Self: Send + Sync,
{
	/// Delivers one event to the sink.
	fn send(&self, event: TelemetryEvent) -> SinkFuture<'_>;
}

/// Bounded in-process event queue decoupling emission from delivery.
///
/// At capacity the oldest event is dropped; stale lifecycle events are not
/// worth blocking a login for.
#[derive(Debug)]
pub struct TelemetryQueue {
	events: Mutex<VecDeque<TelemetryEvent>>,
	capacity: usize,
	dropped: AtomicU64,
}
impl TelemetryQueue {
	const DEFAULT_CAPACITY: usize = 64;

	/// Creates a queue bounded to `capacity` events (minimum 1).
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			events: Mutex::new(VecDeque::new()),
			capacity: capacity.max(1),
			dropped: AtomicU64::new(0),
		}
	}

	/// Enqueues an event; never blocks and never fails.
	pub fn emit(&self, event: TelemetryEvent) {
		let mut events = self.events.lock();

		if events.len() == self.capacity {
			events.pop_front();
			self.dropped.fetch_add(1, Ordering::Relaxed);
		}

		events.push_back(event);
	}

	/// Takes every queued event, leaving the queue empty.
	pub fn drain(&self) -> Vec<TelemetryEvent> {
		self.events.lock().drain(..).collect()
	}

	/// Returns the number of currently queued events.
	pub fn len(&self) -> usize {
		self.events.lock().len()
	}

	/// Returns `true` when no events are queued.
	pub fn is_empty(&self) -> bool {
		self.events.lock().is_empty()
	}

	/// Returns the number of events discarded due to the capacity bound.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	/// Forwards every queued event to `sink`, swallowing delivery failures.
	pub async fn forward_to(&self, sink: &dyn TelemetrySink) {
		for event in self.drain() {
			match sink.send(event).await {
				Ok(()) => {},
				Err(_err) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(error = %_err, "Telemetry sink rejected an event.");
				},
			}
		}
	}
}
impl Default for TelemetryQueue {
	fn default() -> Self {
		Self::with_capacity(Self::DEFAULT_CAPACITY)
	}
}

/// Spawns a background task that drains `queue` into `sink` every `interval`.
///
/// Abort the returned handle to stop the drain; any events still queued remain
/// available via [`TelemetryQueue::drain`].
#[cfg(feature = "reqwest")]
pub fn spawn_drain(
	queue: Arc<TelemetryQueue>,
	sink: Arc<dyn TelemetrySink>,
	interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			tokio::time::sleep(interval).await;
			queue.forward_to(sink.as_ref()).await;
		}
	})
}
