//! Exchange success payload and the redacting secret wrapper.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Tokens returned by a successful authorization-code exchange.
///
/// Ownership transfers to the caller on success; the exchange client keeps no
/// copy. `access_expires_at` is parsed from the backend's RFC 3339 timestamp.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute expiry instant of the access token.
	#[serde(with = "time::serde::rfc3339")]
	pub access_expires_at: OffsetDateTime,
	/// Refresh token secret, if the backend issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Token type hint (typically `bearer`), if the backend supplied one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
}
impl TokenGrant {
	/// Returns `true` if the access token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.access_expires_at
	}

	/// Returns `true` if the access token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("access_expires_at", &self.access_expires_at)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn grant_parses_backend_payload() {
		let payload = "{\"access_token\":\"access-abc\",\"access_expires_at\":\"2025-06-01T12:00:00Z\",\"refresh_token\":\"refresh-abc\",\"token_type\":\"bearer\"}";
		let grant: TokenGrant =
			serde_json::from_str(payload).expect("Grant payload should deserialize.");

		assert_eq!(grant.access_token.expose(), "access-abc");
		assert_eq!(grant.access_expires_at, macros::datetime!(2025-06-01 12:00 UTC));
		assert_eq!(grant.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-abc"));
		assert_eq!(grant.token_type.as_deref(), Some("bearer"));
	}

	#[test]
	fn grant_tolerates_omitted_optionals() {
		let payload =
			"{\"access_token\":\"access-min\",\"access_expires_at\":\"2025-06-01T12:00:00Z\"}";
		let grant: TokenGrant =
			serde_json::from_str(payload).expect("Minimal grant payload should deserialize.");

		assert!(grant.refresh_token.is_none());
		assert!(grant.token_type.is_none());
	}

	#[test]
	fn expiry_helpers_compare_instants() {
		let grant: TokenGrant = serde_json::from_str(
			"{\"access_token\":\"a\",\"access_expires_at\":\"2025-06-01T12:00:00Z\"}",
		)
		.expect("Grant fixture should deserialize.");

		assert!(!grant.is_expired_at(macros::datetime!(2025-06-01 11:59 UTC)));
		assert!(grant.is_expired_at(macros::datetime!(2025-06-01 12:00 UTC)));
	}

	#[test]
	fn grant_debug_redacts_secrets() {
		let grant: TokenGrant = serde_json::from_str(
			"{\"access_token\":\"top-secret-access\",\"access_expires_at\":\"2025-06-01T12:00:00Z\",\"refresh_token\":\"top-secret-refresh\"}",
		)
		.expect("Grant fixture should deserialize.");
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("top-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
