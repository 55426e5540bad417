//! Callback-consumer boundary helpers.
//!
//! The exchange client is never invoked when the provider declined the
//! authorization; consumers check [`CallbackParams::provider_denial`] first and
//! only then hand `code` + `state` to [`ExchangeClient::exchange`]. Terminal
//! errors map onto a small set of [`UserHint`] categories so UI layers render
//! targeted copy without string-matching messages.
//!
//! [`ExchangeClient::exchange`]: crate::exchange::ExchangeClient::exchange

// self
use crate::{
	_prelude::*,
	error::ErrorKind,
	exchange::{ExchangeRequest, ProviderSlug},
};

/// Query parameters received from the provider redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code, if the provider issued one.
	pub code: Option<String>,
	/// Round-tripped state parameter.
	pub state: Option<String>,
	/// Provider error code, if the authorization was declined.
	pub error: Option<String>,
	/// Provider-supplied human-readable error description.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Extracts callback parameters from a redirect URL.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"code" => params.code = Some(value.into_owned()),
				"state" => params.state = Some(value.into_owned()),
				"error" => params.error = Some(value.into_owned()),
				"error_description" => params.error_description = Some(value.into_owned()),
				_ => {},
			}
		}

		params
	}

	/// Returns the `provider_cancelled` error when the provider declined.
	///
	/// When this returns `Some`, the exchange must not be invoked at all.
	pub fn provider_denial(&self) -> Option<Error> {
		let error = self.error.as_deref()?;
		let message = match self.error_description.as_deref() {
			Some(description) => format!("{error}: {description}"),
			None => error.to_owned(),
		};

		Some(Error::ProviderCancelled { message })
	}

	/// Builds an exchange request from the received parameters.
	pub fn into_request(self, provider: ProviderSlug) -> ExchangeRequest {
		ExchangeRequest::new(provider, self.code, self.state)
	}
}

/// User-facing messaging categories derived from classified error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserHint {
	/// The user backed out at the provider; nothing went wrong.
	SignInCancelled,
	/// The callback cannot be completed; the user should sign in again.
	RestartSignIn,
	/// Transient infrastructure trouble; retrying shortly should work.
	TryAgainShortly,
}
impl UserHint {
	/// Maps a classified kind onto its messaging category.
	pub const fn for_kind(kind: ErrorKind) -> Self {
		match kind {
			ErrorKind::ProviderCancelled => UserHint::SignInCancelled,
			ErrorKind::InvalidState
			| ErrorKind::MissingParams
			| ErrorKind::Client
			| ErrorKind::Unknown => UserHint::RestartSignIn,
			ErrorKind::Network | ErrorKind::Server => UserHint::TryAgainShortly,
		}
	}

	/// Returns default user-facing copy for the category.
	pub const fn message(self) -> &'static str {
		match self {
			UserHint::SignInCancelled => "Sign-in was cancelled.",
			UserHint::RestartSignIn => "Something went wrong. Please try signing in again.",
			UserHint::TryAgainShortly =>
				"We could not reach the sign-in service. Please try again in a moment.",
		}
	}
}
