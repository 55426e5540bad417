//! Session-scoped slots backing the state-integrity check and trace correlation.
//!
//! The exchange client never reaches for ambient storage; callers inject a
//! [`SessionStore`] so the expected-state lifecycle (write before redirect,
//! read-and-clear exactly once on success) and the lazily created trace id are
//! testable without a simulated browser environment.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const STATE_LEN: usize = 32;
const TRACE_ID_LEN: usize = 32;

/// Session-scoped storage contract for the expected-state and trace-id slots.
///
/// At most one expected-state value is outstanding at a time. An empty slot
/// causes the integrity check to be skipped rather than failing closed; this
/// leniency tolerates multi-tab flows at the cost of a weaker anti-CSRF
/// guarantee and is preserved deliberately.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the stored expected-state value without consuming it.
	fn expected_state(&self) -> Option<String>;

	/// Replaces the expected-state slot with a new value.
	fn put_expected_state(&self, value: String);

	/// Consumes the expected-state slot, returning the value it held.
	///
	/// Called exactly once per successful exchange so the same state value can
	/// never be replayed.
	fn take_expected_state(&self) -> Option<String>;

	/// Returns the session trace id, creating it on first use.
	///
	/// The id is attached to every attempt's `X-Client-Trace` header and to
	/// telemetry events for cross-system log correlation. It persists for the
	/// life of the store.
	fn trace_id(&self) -> String;

	/// Generates a fresh state value, stores it as the expected state, and
	/// returns it for embedding in the provider redirect.
	fn begin(&self) -> String {
		let state = random_string(STATE_LEN);

		self.put_expected_state(state.clone());

		state
	}
}

#[derive(Debug, Default)]
struct SessionSlots {
	expected_state: Option<String>,
	trace_id: Option<String>,
}

/// In-process [`SessionStore`] holding both slots behind a lock.
#[derive(Debug, Default)]
pub struct MemorySession(Mutex<SessionSlots>);
impl SessionStore for MemorySession {
	fn expected_state(&self) -> Option<String> {
		self.0.lock().expected_state.clone()
	}

	fn put_expected_state(&self, value: String) {
		self.0.lock().expected_state = Some(value);
	}

	fn take_expected_state(&self) -> Option<String> {
		self.0.lock().expected_state.take()
	}

	fn trace_id(&self) -> String {
		self.0.lock().trace_id.get_or_insert_with(|| random_string(TRACE_ID_LEN)).clone()
	}
}

pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
