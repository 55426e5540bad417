//! Transport primitives for the callback exchange.
//!
//! The module exposes [`CallbackHttpClient`] so downstream crates can plug in
//! custom HTTP stacks (or test doubles) without losing the per-attempt timeout
//! contract, and [`BackoffTimer`] so the retry loop's sleeps can be observed by
//! tests instead of burning wall-clock time.

// std
use std::time::Duration;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::config::ConfigError;

/// Header carrying the session trace id on every attempt.
pub const TRACE_HEADER: &str = "X-Client-Trace";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One outbound exchange attempt.
#[derive(Clone, Debug)]
pub struct CallbackRequest {
	/// Fully-formed exchange endpoint URL including `code` and `state`.
	pub url: Url,
	/// Session trace id sent via [`TRACE_HEADER`].
	pub trace_id: String,
	/// Per-attempt timeout; expiry must surface as [`TransportFailure::TimedOut`].
	pub timeout: Duration,
}

/// Raw backend response handed to the classifier.
#[derive(Clone, Debug)]
pub struct CallbackResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}

/// Transport-level failures; both variants classify as the `network` kind.
#[derive(Debug, ThisError)]
pub enum TransportFailure {
	/// The per-attempt timeout fired before a response arrived.
	#[error("Request timed out while calling the exchange endpoint.")]
	TimedOut,
	/// The underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the exchange endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportFailure {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Future returned by [`CallbackHttpClient::get`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<CallbackResponse, TransportFailure>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing the exchange GET.
///
/// Implementations must enforce `request.timeout` themselves (the client has no
/// other cancellation source) and include session credentials (cookies) with
/// every request.
pub trait CallbackHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Issues the exchange GET and returns the raw status + body.
	fn get(&self, request: CallbackRequest) -> TransportFuture<'_>;
}

/// Future returned by [`BackoffTimer::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Timer seam used for the linear backoff between retry attempts.
pub trait BackoffTimer
where
	Self: Send + Sync,
{
	/// Suspends the retry loop for `delay`.
	fn sleep(&self, delay: Duration) -> SleepFuture<'_>;
}

/// Tokio-backed [`BackoffTimer`] used by the default stack.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;
#[cfg(feature = "reqwest")]
impl BackoffTimer for TokioTimer {
	fn sleep(&self, delay: Duration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(delay))
	}
}

/// Thin wrapper around [`ReqwestClient`] with the cookie store enabled so the
/// backend session cookie rides along with every exchange attempt.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a cookie-carrying reqwest client.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// Configure the client with a cookie store, because the backend identifies
	/// the browser session via credentials rather than request parameters.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CallbackHttpClient for ReqwestHttpClient {
	fn get(&self, request: CallbackRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.get(request.url)
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.header(reqwest::header::ACCEPT, "application/json")
				.header(TRACE_HEADER, request.trace_id)
				.timeout(request.timeout)
				.send()
				.await
				.map_err(map_reqwest_failure)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(map_reqwest_failure)?.to_vec();

			Ok(CallbackResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_failure(err: ReqwestError) -> TransportFailure {
	if err.is_timeout() {
		return TransportFailure::TimedOut;
	}

	TransportFailure::network(err)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transport_failures_describe_themselves() {
		let timed_out = TransportFailure::TimedOut;
		let network = TransportFailure::network(std::io::Error::other("connection refused"));

		assert!(timed_out.to_string().contains("timed out"));
		assert!(network.to_string().contains("Network error"));
		assert!(std::error::Error::source(&network).is_some());
		assert!(std::error::Error::source(&timed_out).is_none());
	}
}
