//! Client-wide error types shared across the token, transport, and dispatch layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Transient network failures never surface here directly; the transport retries them in place
/// and only exhaustion ([`Error::Timeout`], token path only) or a non-whitelisted failure
/// ([`Error::Api`]) bubbles up. Business-path retry exhaustion is reported as a sentinel response
/// value instead, see [`crate::dispatch::ApiResponse::RetriesExhausted`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Transport failure (DNS, TCP, TLS) that is not part of the retryable whitelist.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Transient retries were exhausted while acquiring a bearer token.
	#[error("Token endpoint timed out after {attempts} attempts.")]
	Timeout {
		/// Total attempts performed before giving up.
		attempts: u32,
	},
	/// Upstream (or its HTTP stack) failed with a non-retryable error.
	#[error("Ecobank API error: {message}.")]
	Api {
		/// Message describing the underlying failure.
		message: String,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Request path cannot be joined to the configured base URL.
	#[error("Request path `{path}` cannot be joined to the base URL.")]
	InvalidPath {
		/// The offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Ecobank API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Ecobank API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
