//! OAuth authorization-code callback exchange client—state-integrity validation,
//! classified error taxonomy, bounded linear-backoff retries, single-use replay
//! protection, and fire-and-forget telemetry behind injectable collaborators.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod callback;
pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod session;
pub mod telemetry;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ExchangeConfig,
		exchange::ReqwestExchangeClient,
		session::{MemorySession, SessionStore},
	};

	/// Constructs a [`ReqwestExchangeClient`] against the provided API base with
	/// a fresh in-memory session, returning the session backend for assertions.
	pub fn build_reqwest_test_client(api_base: Url) -> (ReqwestExchangeClient, Arc<MemorySession>) {
		let session_backend = Arc::new(MemorySession::default());
		let session: Arc<dyn SessionStore> = session_backend.clone();
		let client = ReqwestExchangeClient::new(session, ExchangeConfig::new(api_base))
			.expect("Failed to build reqwest exchange client for tests.");

		(client, session_backend)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
