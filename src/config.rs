//! Backend endpoint configuration and per-exchange options.

// std
use std::time::Duration;
// self
use crate::_prelude::*;

/// Environment variable consulted when no explicit API base URL is supplied.
pub const API_BASE_ENV: &str = "OAUTH_EXCHANGE_API_BASE_URL";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No API base URL was supplied and the fallback variable is unset.
	#[error("API base URL is not configured; set {API_BASE_ENV} or pass one explicitly.")]
	MissingApiBase,
	/// The configured API base URL cannot be parsed.
	#[error("API base URL is invalid.")]
	InvalidApiBase {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Resolved backend configuration for the exchange client.
#[derive(Clone, Debug)]
pub struct ExchangeConfig {
	/// Base URL of the backend hosting the token-exchange endpoint.
	pub api_base: Url,
}
impl ExchangeConfig {
	/// Creates a configuration with an explicit base URL.
	pub fn new(api_base: Url) -> Self {
		Self { api_base }
	}

	/// Resolves the base URL from [`API_BASE_ENV`].
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_base_value(std::env::var(API_BASE_ENV).ok())
	}

	fn from_base_value(value: Option<String>) -> Result<Self, ConfigError> {
		let raw = value.ok_or(ConfigError::MissingApiBase)?;
		let api_base = Url::parse(&raw).map_err(|source| ConfigError::InvalidApiBase { source })?;

		Ok(Self { api_base })
	}
}

/// Per-exchange tuning knobs with spec'd defaults.
#[derive(Clone, Debug)]
pub struct ExchangeOptions {
	/// Per-attempt network timeout enforced via cancellation.
	pub timeout: Duration,
	/// Retry attempts granted after the first, applied only to transient kinds.
	pub retries: u32,
	/// Linear backoff multiplier; attempt `n`'s delay is `backoff_base * n`.
	///
	/// Linear without jitter is acceptable for one human-initiated login at a
	/// time; do not copy this policy into higher-throughput retry contexts.
	pub backoff_base: Duration,
	/// Override for the backend base URL; falls back to the client's config.
	pub api_base: Option<Url>,
}
impl ExchangeOptions {
	const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(400);
	const DEFAULT_RETRIES: u32 = 2;
	const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);

	/// Creates options with the default timeout (12 s), retries (2), and
	/// backoff base (400 ms).
	pub fn new() -> Self {
		Self {
			timeout: Self::DEFAULT_TIMEOUT,
			retries: Self::DEFAULT_RETRIES,
			backoff_base: Self::DEFAULT_BACKOFF_BASE,
			api_base: None,
		}
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the retry budget.
	pub fn with_retries(mut self, retries: u32) -> Self {
		self.retries = retries;

		self
	}

	/// Overrides the linear backoff base.
	pub fn with_backoff_base(mut self, base: Duration) -> Self {
		self.backoff_base = base;

		self
	}

	/// Overrides the backend base URL for this exchange only.
	pub fn with_api_base(mut self, api_base: Url) -> Self {
		self.api_base = Some(api_base);

		self
	}

	/// Computes the delay applied before retrying after attempt `attempt`.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		self.backoff_base * attempt
	}
}
impl Default for ExchangeOptions {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn options_default_to_spec_values() {
		let options = ExchangeOptions::default();

		assert_eq!(options.timeout, Duration::from_secs(12));
		assert_eq!(options.retries, 2);
		assert_eq!(options.backoff_base, Duration::from_millis(400));
		assert!(options.api_base.is_none());
	}

	#[test]
	fn backoff_grows_linearly_with_the_attempt() {
		let options = ExchangeOptions::new().with_backoff_base(Duration::from_millis(100));

		assert_eq!(options.backoff_delay(1), Duration::from_millis(100));
		assert_eq!(options.backoff_delay(2), Duration::from_millis(200));
		assert_eq!(options.backoff_delay(3), Duration::from_millis(300));
	}

	#[test]
	fn config_requires_a_parseable_base() {
		assert!(matches!(
			ExchangeConfig::from_base_value(None),
			Err(ConfigError::MissingApiBase)
		));
		assert!(matches!(
			ExchangeConfig::from_base_value(Some("not a url".into())),
			Err(ConfigError::InvalidApiBase { .. })
		));

		let config = ExchangeConfig::from_base_value(Some("https://api.example.com".into()))
			.expect("Valid base URL should resolve.");

		assert_eq!(config.api_base.as_str(), "https://api.example.com/");
	}
}
