//! Classified exchange errors shared across the crate.
//!
//! The taxonomy is closed: every failure path, including unexpected transport
//! exceptions on the final retry, is coerced into one of the seven kinds so UI
//! callers can branch on [`ErrorKind`] instead of string-matching messages.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical exchange error exposed by public APIs.
///
/// Variants map one-to-one onto the classified kinds; [`Error::kind`] returns
/// the matching label for telemetry and consumer branching.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The identity provider declined the authorization before any exchange.
	#[error("Provider declined the authorization: {message}.")]
	ProviderCancelled {
		/// Provider-supplied error code or description.
		message: String,
	},
	/// Supplied state differs from the stored expected state (CSRF/replay guard).
	#[error("State parameter failed the integrity check: {message}.")]
	InvalidState {
		/// Description of the mismatch.
		message: String,
	},
	/// Authorization code or state was absent or empty on the callback.
	#[error("Callback is missing required parameters: {message}.")]
	MissingParams {
		/// Which parameter failed validation.
		message: String,
	},
	/// Transport failure or per-attempt timeout; safe to retry.
	#[error("Network error occurred while calling the exchange endpoint: {message}.")]
	Network {
		/// Transport-supplied summary of the failure.
		message: String,
		/// Underlying transport error, when one was captured.
		#[source]
		source: Option<BoxError>,
	},
	/// Backend responded with a 5xx status; safe to retry.
	#[error("Exchange endpoint failed upstream: {message}.")]
	Server {
		/// Backend-supplied detail or a generic per-class message.
		message: String,
		/// HTTP status code returned by the backend.
		status: u16,
	},
	/// Backend rejected the request (400/401/403/422); not retryable.
	#[error("Exchange endpoint rejected the request: {message}.")]
	Client {
		/// Backend-supplied detail or a generic per-class message.
		message: String,
		/// HTTP status code returned by the backend.
		status: u16,
	},
	/// Any other failure the taxonomy cannot place more precisely.
	#[error("Exchange failed unexpectedly: {message}.")]
	Unknown {
		/// Human-readable summary of the failure.
		message: String,
		/// HTTP status code, when one was observed.
		status: Option<u16>,
	},
}
impl Error {
	/// Wraps a transport-specific failure as a retryable network error.
	pub fn network(
		message: impl Into<String>,
		source: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { message: message.into(), source: Some(Box::new(source)) }
	}

	/// Returns the classified kind label for this error.
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Error::ProviderCancelled { .. } => ErrorKind::ProviderCancelled,
			Error::InvalidState { .. } => ErrorKind::InvalidState,
			Error::MissingParams { .. } => ErrorKind::MissingParams,
			Error::Network { .. } => ErrorKind::Network,
			Error::Server { .. } => ErrorKind::Server,
			Error::Client { .. } => ErrorKind::Client,
			Error::Unknown { .. } => ErrorKind::Unknown,
		}
	}

	/// Returns the HTTP status attached to the error, when one was observed.
	pub const fn status(&self) -> Option<u16> {
		match self {
			Error::Server { status, .. } | Error::Client { status, .. } => Some(*status),
			Error::Unknown { status, .. } => *status,
			_ => None,
		}
	}

	/// Returns `true` when the retry loop may attempt the exchange again.
	pub const fn is_retryable(&self) -> bool {
		self.kind().is_retryable()
	}

	/// Returns the human-readable payload without the variant framing.
	pub fn message(&self) -> &str {
		match self {
			Error::ProviderCancelled { message }
			| Error::InvalidState { message }
			| Error::MissingParams { message }
			| Error::Network { message, .. }
			| Error::Server { message, .. }
			| Error::Client { message, .. }
			| Error::Unknown { message, .. } => message,
		}
	}
}

/// Closed set of classified error kinds consumers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Provider declined before the exchange was invoked.
	ProviderCancelled,
	/// State integrity check failed.
	InvalidState,
	/// Code or state missing from the callback.
	MissingParams,
	/// Transport failure or timeout.
	Network,
	/// Backend 5xx response.
	Server,
	/// Backend 4xx rejection (400/401/403/422).
	Client,
	/// Unclassifiable failure.
	Unknown,
}
impl ErrorKind {
	/// Returns a stable label suitable for telemetry payloads and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::ProviderCancelled => "provider_cancelled",
			ErrorKind::InvalidState => "invalid_state",
			ErrorKind::MissingParams => "missing_params",
			ErrorKind::Network => "network",
			ErrorKind::Server => "server",
			ErrorKind::Client => "client",
			ErrorKind::Unknown => "unknown",
		}
	}

	/// Returns `true` for the transient kinds the retry loop is allowed to repeat.
	pub const fn is_retryable(self) -> bool {
		matches!(self, ErrorKind::Network | ErrorKind::Server)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
