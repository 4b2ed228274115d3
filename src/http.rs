//! HTTP transport primitives and the bounded-retry combinator.
//!
//! The module exposes [`ApiHttpClient`] so downstream crates can integrate custom HTTP stacks,
//! plus [`TransportErrorMapper`] which classifies transport failures into the retryable whitelist
//! (connection reset, end-of-stream, malformed framing, timeout) versus fatal errors. The retry
//! combinator loops over a fixed attempt budget and reports a typed outcome; policy differences
//! between the token path (fatal on exhaustion) and the business path (sentinel on exhaustion)
//! live with the callers, not here.

// std
#[cfg(feature = "reqwest")] use std::io::ErrorKind;
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	obs::{self, RequestKind, RequestOutcome},
};

/// Client-side timeout applied to the token call and, for safety, to business calls as well.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Total transport attempts per logical call, counting the first one.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Response surface handed back by transports: status plus raw body bytes.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Parses the body as JSON.
	pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}
}

/// A single outbound POST, fully described so transports stay stateless.
#[derive(Clone, Debug)]
pub struct PostRequest {
	/// Absolute request URL.
	pub url: Url,
	/// Header name/value pairs, already rendered.
	pub headers: Vec<(&'static str, String)>,
	/// JSON-serialized request body.
	pub body: String,
	/// Per-attempt client-side timeout.
	pub timeout: Duration,
}

/// Boxed future returned by [`ApiHttpClient::post`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<RawResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing a single POST.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by the token manager and the
/// dispatcher, and the returned future must own whatever state it needs so retries can
/// re-submit a cloned [`PostRequest`].
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes the request, resolving to the raw response or a transport error.
	fn post(&self, request: PostRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Classification of a transport failure for retry purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
	/// Safe to retry without side effects.
	Transient,
	/// Must not be retried; surfaces to the caller.
	Fatal,
}

/// Maps transport failures onto the retryable whitelist.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Classifies a transport error as retryable or fatal.
	fn classify(&self, error: &E) -> ErrorClass;
}

/// Bounded retry budget shared by the token and business paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	attempts: u32,
}
impl RetryPolicy {
	/// Creates a policy performing `attempts` transport attempts in total, minimum one.
	pub fn new(attempts: u32) -> Self {
		Self { attempts: attempts.max(1) }
	}

	/// Returns the total attempt budget.
	pub fn attempts(&self) -> u32 {
		self.attempts
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(DEFAULT_RETRY_ATTEMPTS)
	}
}

/// Typed outcome of an exhausted or aborted retry loop.
#[derive(Clone, Debug)]
pub(crate) enum RetryFailure {
	/// Every attempt failed with a whitelisted transient error.
	Exhausted {
		/// Total attempts performed.
		attempts: u32,
		/// Message of the last transient failure observed.
		last: String,
	},
	/// A non-whitelisted error aborted the loop immediately.
	Fatal {
		/// Message of the underlying failure.
		message: String,
	},
}

/// Posts `request`, retrying whitelisted transient failures up to the policy's budget.
pub(crate) async fn post_with_retry<C, M>(
	client: &C,
	mapper: &M,
	kind: RequestKind,
	request: &PostRequest,
	policy: RetryPolicy,
) -> Result<RawResponse, RetryFailure>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut last = String::new();

	for attempt in 1..=policy.attempts() {
		match client.post(request.clone()).await {
			Ok(response) => return Ok(response),
			Err(error) => match mapper.classify(&error) {
				ErrorClass::Transient => {
					if attempt < policy.attempts() {
						obs::record_request_outcome(kind, RequestOutcome::Retry);
					}

					last = error.to_string();
				},
				ErrorClass::Fatal =>
					return Err(RetryFailure::Fatal { message: error.to_string() }),
			},
		}
	}

	Err(RetryFailure::Exhausted { attempts: policy.attempts(), last })
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
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
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post(&self, request: PostRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder =
				client.post(request.url).timeout(request.timeout).body(request.body);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn classify(&self, error: &ReqwestError) -> ErrorClass {
		// Timeouts, connect failures, and interrupted body transfers are the retryable
		// whitelist; protocol framing failures from the HTTP stack surface as body errors.
		if error.is_timeout() || error.is_connect() || error.is_body() {
			return ErrorClass::Transient;
		}
		if has_transient_io_source(error) {
			return ErrorClass::Transient;
		}

		ErrorClass::Fatal
	}
}

#[cfg(feature = "reqwest")]
fn has_transient_io_source(error: &ReqwestError) -> bool {
	let mut source = StdError::source(error);

	while let Some(current) = source {
		if let Some(io) = current.downcast_ref::<std::io::Error>()
			&& matches!(
				io.kind(),
				ErrorKind::ConnectionReset
					| ErrorKind::ConnectionAborted
					| ErrorKind::BrokenPipe
					| ErrorKind::UnexpectedEof
			) {
			return true;
		}

		source = current.source();
	}

	false
}
