//! Credential material and redacted secret wrappers.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping credential material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(String);
impl ApiSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ApiSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiSecret").field(&"<redacted>").finish()
	}
}
impl Display for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque bearer token issued by the upstream token endpoint.
///
/// The upstream declares no expiry; validity is only discovered when a business call rejects the
/// token as forbidden.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a token string as received from the upstream.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw token value for header construction.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the token carries no material.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Externally supplied API credentials, immutable for the process lifetime.
#[derive(Clone, Debug)]
pub struct Credentials {
	user_id: String,
	password: ApiSecret,
	shared_secret: ApiSecret,
}
impl Credentials {
	/// Builds a credential set from the hosting application's configuration.
	pub fn new(
		user_id: impl Into<String>,
		password: impl Into<String>,
		shared_secret: impl Into<String>,
	) -> Self {
		Self {
			user_id: user_id.into(),
			password: ApiSecret::new(password),
			shared_secret: ApiSecret::new(shared_secret),
		}
	}

	/// Returns the upstream user identifier.
	pub fn user_id(&self) -> &str {
		&self.user_id
	}

	/// Returns the token-endpoint password.
	pub fn password(&self) -> &ApiSecret {
		&self.password
	}

	/// Returns the shared secret appended to every secure hash.
	pub fn shared_secret(&self) -> &ApiSecret {
		&self.shared_secret
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = ApiSecret::new("lab-key");

		assert_eq!(format!("{secret:?}"), "ApiSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn token_formatters_redact() {
		let token = BearerToken::new("opaque-token");

		assert_eq!(format!("{token:?}"), "BearerToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert!(!token.is_empty());
		assert!(BearerToken::new("").is_empty());
	}

	#[test]
	fn credentials_debug_never_leaks_secrets() {
		let credentials = Credentials::new("user-1", "hunter2", "lab-key");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("user-1"));
		assert!(!rendered.contains("hunter2"));
		assert!(!rendered.contains("lab-key"));
	}
}
