//! Authorization-code exchange orchestration.
//!
//! The client validates the callback parameters, checks state integrity
//! against the injected session store, then drives a bounded retry loop over
//! the backend exchange endpoint. Attempts are numbered from 1; only the
//! `network` and `server` kinds are retried, each preceded by a linear
//! `backoff_base * attempt` sleep. The loop terminates within `retries + 1`
//! attempts. On success the expected-state slot is consumed so the same state
//! value can never be replayed; on failure it is left untouched so the user
//! can restart the provider flow from scratch.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{
	_prelude::*,
	config::{ExchangeConfig, ExchangeOptions},
	http::{BackoffTimer, CallbackHttpClient, CallbackRequest, CallbackResponse, TransportFailure},
	obs::{self, ExchangeOutcome, ExchangeSpan},
	session::SessionStore,
	telemetry::{TelemetryEvent, TelemetryQueue},
	token::TokenGrant,
};
#[cfg(feature = "reqwest")]
use crate::{
	config::ConfigError,
	http::{ReqwestHttpClient, TokioTimer},
};

const PROVIDER_MAX_LEN: usize = 64;

/// Error returned when provider slug validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ProviderSlugError {
	/// The slug was empty.
	#[error("Provider slug cannot be empty.")]
	Empty,
	/// The slug contains characters unsafe for a URL path segment.
	#[error("Provider slug contains characters outside [a-z0-9_-].")]
	InvalidCharacters,
	/// The slug exceeded the allowed character count.
	#[error("Provider slug exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Validated identity provider slug embedded in the exchange endpoint path.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderSlug(String);
impl ProviderSlug {
	/// Creates a new slug after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ProviderSlugError> {
		let view = value.as_ref();

		validate_slug(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ProviderSlug {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ProviderSlug {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ProviderSlug {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ProviderSlug> for String {
	fn from(value: ProviderSlug) -> Self {
		value.0
	}
}
impl TryFrom<String> for ProviderSlug {
	type Error = ProviderSlugError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_slug(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for ProviderSlug {
	type Err = ProviderSlugError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for ProviderSlug {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderSlug {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_slug(view: &str) -> Result<(), ProviderSlugError> {
	if view.is_empty() {
		return Err(ProviderSlugError::Empty);
	}
	if !view.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
	{
		return Err(ProviderSlugError::InvalidCharacters);
	}
	if view.len() > PROVIDER_MAX_LEN {
		return Err(ProviderSlugError::TooLong { max: PROVIDER_MAX_LEN });
	}

	Ok(())
}

/// Parameters received from the redirect callback, plus per-call options.
///
/// `code` and `state` stay optional here because the redirect may omit either;
/// validation happens inside [`ExchangeClient::exchange`] so absence surfaces
/// as the `missing_params` kind rather than a constructor error.
#[derive(Clone, Debug)]
pub struct ExchangeRequest {
	/// Identity provider slug.
	pub provider: ProviderSlug,
	/// Authorization code from the redirect, if present.
	pub code: Option<String>,
	/// State parameter from the redirect, if present.
	pub state: Option<String>,
	/// Per-call tuning knobs.
	pub options: ExchangeOptions,
}
impl ExchangeRequest {
	/// Creates a request with default [`ExchangeOptions`].
	pub fn new(
		provider: ProviderSlug,
		code: Option<impl Into<String>>,
		state: Option<impl Into<String>>,
	) -> Self {
		Self {
			provider,
			code: code.map(Into::into),
			state: state.map(Into::into),
			options: ExchangeOptions::default(),
		}
	}

	/// Overrides the per-call options.
	pub fn with_options(mut self, options: ExchangeOptions) -> Self {
		self.options = options;

		self
	}
}

#[cfg(feature = "reqwest")]
/// Exchange client specialized for the crate's default reqwest + tokio stack.
pub type ReqwestExchangeClient = ExchangeClient<ReqwestHttpClient, TokioTimer>;

/// Coordinates the authorization-code exchange against the backend.
///
/// The client owns the transport, backoff timer, session store, and telemetry
/// queue so the exchange operation can focus on protocol logic (validation
/// order, classification, retry bookkeeping).
#[derive(Clone)]
pub struct ExchangeClient<C, T>
where
	C: ?Sized + CallbackHttpClient,
	T: ?Sized + BackoffTimer,
{
	/// HTTP transport used for every exchange attempt.
	pub http_client: Arc<C>,
	/// Timer driving the linear backoff between retries.
	pub timer: Arc<T>,
	/// Session store holding the expected-state and trace-id slots.
	pub session: Arc<dyn SessionStore>,
	/// Resolved backend configuration.
	pub config: ExchangeConfig,
	telemetry: Arc<TelemetryQueue>,
}
impl<C, T> ExchangeClient<C, T>
where
	C: ?Sized + CallbackHttpClient,
	T: ?Sized + BackoffTimer,
{
	/// Creates a client that reuses the caller-provided transport + timer pair.
	pub fn with_http_client(
		session: Arc<dyn SessionStore>,
		config: ExchangeConfig,
		http_client: impl Into<Arc<C>>,
		timer: impl Into<Arc<T>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			timer: timer.into(),
			session,
			config,
			telemetry: Arc::new(TelemetryQueue::default()),
		}
	}

	/// Replaces the telemetry queue (e.g., one shared with a background drain).
	pub fn with_telemetry(mut self, telemetry: Arc<TelemetryQueue>) -> Self {
		self.telemetry = telemetry;

		self
	}

	/// Returns the telemetry queue for wiring up a drain task.
	pub fn telemetry(&self) -> Arc<TelemetryQueue> {
		self.telemetry.clone()
	}

	/// Exchanges an authorization code for tokens.
	///
	/// Validation order is fixed: missing/empty parameters fail first, then the
	/// state-integrity check, and only then is a network call made. When no
	/// expected state is stored the integrity check is skipped; see
	/// [`SessionStore::expected_state`] for why this stays permissive.
	pub async fn exchange(&self, request: ExchangeRequest) -> Result<TokenGrant> {
		let span = ExchangeSpan::new(&request.provider, "exchange");

		obs::record_exchange_outcome(ExchangeOutcome::Attempt);

		let trace_id = self.session.trace_id();

		self.telemetry.emit(TelemetryEvent::start(request.provider.as_ref(), &trace_id));

		let mut attempts = 0;
		let result = span.instrument(self.run(&request, &trace_id, &mut attempts)).await;

		match &result {
			Ok(_) => {
				obs::record_exchange_outcome(ExchangeOutcome::Success);
				self.telemetry.emit(TelemetryEvent::success(
					request.provider.as_ref(),
					&trace_id,
					attempts,
				));
			},
			Err(err) => {
				obs::record_exchange_outcome(ExchangeOutcome::Failure);
				obs::record_exchange_error(err.kind());
				self.telemetry.emit(TelemetryEvent::failure(
					request.provider.as_ref(),
					&trace_id,
					err.kind(),
					attempts,
					err.message(),
				));
			},
		}

		result
	}

	async fn run(
		&self,
		request: &ExchangeRequest,
		trace_id: &str,
		attempts: &mut u32,
	) -> Result<TokenGrant> {
		let code = non_empty(request.code.as_deref()).ok_or_else(|| Error::MissingParams {
			message: "authorization code is absent or empty".into(),
		})?;
		let state = non_empty(request.state.as_deref()).ok_or_else(|| Error::MissingParams {
			message: "state parameter is absent or empty".into(),
		})?;

		if let Some(expected) = self.session.expected_state()
			&& expected != state
		{
			return Err(Error::InvalidState {
				message: "state does not match the value stored before the redirect".into(),
			});
		}

		let url = build_endpoint(
			request.options.api_base.as_ref().unwrap_or(&self.config.api_base),
			&request.provider,
			code,
			state,
		)?;
		let mut attempt = 0;

		loop {
			attempt += 1;
			*attempts = attempt;

			let outcome = self
				.http_client
				.get(CallbackRequest {
					url: url.clone(),
					trace_id: trace_id.to_owned(),
					timeout: request.options.timeout,
				})
				.await;
			let failure = match outcome {
				Ok(response) => match classify_response(response) {
					Ok(grant) => {
						self.session.take_expected_state();

						return Ok(grant);
					},
					Err(err) => err,
				},
				Err(transport) => classify_transport(transport),
			};

			if failure.is_retryable() && attempt <= request.options.retries {
				self.timer.sleep(request.options.backoff_delay(attempt)).await;

				continue;
			}

			return Err(failure);
		}
	}
}
#[cfg(feature = "reqwest")]
impl ExchangeClient<ReqwestHttpClient, TokioTimer> {
	/// Creates a client backed by the default reqwest transport and tokio timer.
	pub fn new(
		session: Arc<dyn SessionStore>,
		config: ExchangeConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(session, config, ReqwestHttpClient::new()?, TokioTimer))
	}
}
impl<C, T> Debug for ExchangeClient<C, T>
where
	C: ?Sized + CallbackHttpClient,
	T: ?Sized + BackoffTimer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeClient").field("config", &self.config).finish()
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|view| !view.is_empty())
}

fn build_endpoint(base: &Url, provider: &ProviderSlug, code: &str, state: &str) -> Result<Url> {
	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|()| Error::Unknown {
			message: "API base URL cannot host the exchange path".into(),
			status: None,
		})?
		.pop_if_empty()
		.extend(["auth", "oauth", provider.as_ref(), "callback"]);
	url.query_pairs_mut().append_pair("code", code).append_pair("state", state);

	Ok(url)
}

fn classify_response(response: CallbackResponse) -> Result<TokenGrant> {
	match response.status {
		200..=299 => parse_grant(&response.body).map_err(|err| Error::Unknown {
			message: format!("exchange response body failed to parse at {}: {}", err.path(), err.inner()),
			status: Some(response.status),
		}),
		status if status >= 500 => Err(Error::Server {
			message: detail_or(&response.body, "exchange endpoint is temporarily unavailable"),
			status,
		}),
		status @ (400 | 401 | 403 | 422) => Err(Error::Client {
			message: detail_or(&response.body, "exchange request was rejected"),
			status,
		}),
		status => Err(Error::Unknown {
			message: detail_or(&response.body, "exchange endpoint returned an unexpected status"),
			status: Some(status),
		}),
	}
}

fn classify_transport(failure: TransportFailure) -> Error {
	match failure {
		TransportFailure::TimedOut => Error::Network {
			message: "request timed out before the exchange endpoint responded".into(),
			source: None,
		},
		TransportFailure::Network { source } =>
			Error::Network { message: source.to_string(), source: Some(source) },
	}
}

fn parse_grant(
	body: &[u8],
) -> Result<TokenGrant, serde_path_to_error::Error<serde_json::error::Error>> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

#[derive(Deserialize)]
struct ErrorBody {
	detail: Option<String>,
}

fn detail_or(body: &[u8], fallback: &str) -> String {
	serde_json::from_slice::<ErrorBody>(body)
		.ok()
		.and_then(|parsed| parsed.detail)
		.filter(|detail| !detail.trim().is_empty())
		.unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ErrorKind;

	fn response(status: u16, body: &str) -> CallbackResponse {
		CallbackResponse { status, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn provider_slugs_validate_path_safety() {
		assert!(ProviderSlug::new("github").is_ok());
		assert!(ProviderSlug::new("azure_ad-v2").is_ok());
		assert_eq!(ProviderSlug::new(""), Err(ProviderSlugError::Empty));
		assert_eq!(
			ProviderSlug::new("GitHub"),
			Err(ProviderSlugError::InvalidCharacters),
			"Uppercase must be rejected."
		);
		assert_eq!(ProviderSlug::new("a/b"), Err(ProviderSlugError::InvalidCharacters));
		assert_eq!(
			ProviderSlug::new("a".repeat(PROVIDER_MAX_LEN + 1)),
			Err(ProviderSlugError::TooLong { max: PROVIDER_MAX_LEN })
		);
	}

	#[test]
	fn endpoint_embeds_provider_and_parameters() {
		let base = Url::parse("https://api.example.com").expect("Base URL fixture should parse.");
		let provider = ProviderSlug::new("github").expect("Provider fixture should be valid.");
		let url = build_endpoint(&base, &provider, "code-1", "state-1")
			.expect("Endpoint should build from an HTTP base.");

		assert_eq!(
			url.as_str(),
			"https://api.example.com/auth/oauth/github/callback?code=code-1&state=state-1"
		);
	}

	#[test]
	fn endpoint_preserves_base_path_prefixes() {
		let base =
			Url::parse("https://api.example.com/v1/").expect("Base URL fixture should parse.");
		let provider = ProviderSlug::new("google").expect("Provider fixture should be valid.");
		let url = build_endpoint(&base, &provider, "c", "s")
			.expect("Endpoint should build from a prefixed base.");

		assert_eq!(url.path(), "/v1/auth/oauth/google/callback");
	}

	#[test]
	fn classification_matches_the_status_table() {
		let server = classify_response(response(502, "")).expect_err("5xx must classify.");
		let client_bad = classify_response(response(400, "")).expect_err("400 must classify.");
		let client_unauth = classify_response(response(401, "")).expect_err("401 must classify.");
		let client_forbidden = classify_response(response(403, "")).expect_err("403 must classify.");
		let client_unprocessable =
			classify_response(response(422, "")).expect_err("422 must classify.");
		let unknown = classify_response(response(302, "")).expect_err("3xx must classify.");

		assert_eq!(server.kind(), ErrorKind::Server);
		assert!(server.is_retryable());
		assert_eq!(client_bad.kind(), ErrorKind::Client);
		assert_eq!(client_unauth.kind(), ErrorKind::Client);
		assert_eq!(client_forbidden.kind(), ErrorKind::Client);
		assert_eq!(client_unprocessable.kind(), ErrorKind::Client);
		assert!(!client_bad.is_retryable());
		assert_eq!(unknown.kind(), ErrorKind::Unknown);
		assert_eq!(unknown.status(), Some(302));
	}

	#[test]
	fn failure_bodies_surface_the_detail_field() {
		let err = classify_response(response(422, "{\"detail\":\"code already redeemed\"}"))
			.expect_err("422 must classify.");

		assert_eq!(err.message(), "code already redeemed");

		let fallback = classify_response(response(500, "not json")).expect_err("5xx must classify.");

		assert_eq!(fallback.message(), "exchange endpoint is temporarily unavailable");
	}

	#[test]
	fn successful_body_parses_into_a_grant() {
		let grant = classify_response(response(
			200,
			"{\"access_token\":\"tok\",\"access_expires_at\":\"2025-06-01T12:00:00Z\"}",
		))
		.expect("2xx with a parseable body should succeed.");

		assert_eq!(grant.access_token.expose(), "tok");
	}

	#[test]
	fn unparseable_success_body_coerces_to_unknown() {
		let err = classify_response(response(200, "{\"access_token\":42}"))
			.expect_err("Malformed 2xx body must not leak a raw serde error.");

		assert_eq!(err.kind(), ErrorKind::Unknown);
		assert_eq!(err.status(), Some(200));
	}

	#[test]
	fn transport_failures_classify_as_network() {
		let timed_out = classify_transport(TransportFailure::TimedOut);
		let network = classify_transport(TransportFailure::network(std::io::Error::other(
			"connection refused",
		)));

		assert_eq!(timed_out.kind(), ErrorKind::Network);
		assert!(timed_out.is_retryable());
		assert_eq!(network.kind(), ErrorKind::Network);
	}
}
