//! Request dispatch with secure-hash signing and a single reauthentication retry.
//!
//! [`Dispatcher::send`] is the top-level entry point. Each call builds bearer headers, posts
//! through the bounded-retry transport, and inspects the response: a "Forbidden" error field
//! triggers exactly one invalidate-and-retry cycle with a freshly generated token, after which
//! the second outcome is returned verbatim. Retry exhaustion on this path never raises; it
//! degrades to the tagged [`ApiResponse::RetriesExhausted`] sentinel so end-user flows stay
//! responsive while the upstream API misbehaves.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	endpoint::{self, Endpoint},
	hash,
	http::{
		ApiHttpClient, DEFAULT_TIMEOUT, PostRequest, RetryFailure, RetryPolicy,
		TransportErrorMapper, post_with_retry,
	},
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
	payload::Payload,
	store::TokenStore,
	token::TokenManager,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport stack.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Business response surface returned by [`Dispatcher::send`].
///
/// Retry exhaustion is a tagged variant rather than an error or a look-alike payload, so
/// callers can always distinguish a degraded transport from a genuine upstream response.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// JSON payload returned by the upstream, success or business-level error alike.
	Payload(serde_json::Value),
	/// Transport retries were exhausted; no upstream payload exists.
	RetriesExhausted,
}
impl ApiResponse {
	/// Returns `true` for the retry-exhaustion sentinel.
	pub fn is_retries_exhausted(&self) -> bool {
		matches!(self, Self::RetriesExhausted)
	}

	/// Returns the upstream payload, when one exists.
	pub fn as_payload(&self) -> Option<&serde_json::Value> {
		match self {
			Self::Payload(value) => Some(value),
			Self::RetriesExhausted => None,
		}
	}

	/// Converts into a plain JSON value; the sentinel renders as the legacy `{"msg":"Timeout"}`
	/// wire shape for callers that still expect it.
	pub fn into_json(self) -> serde_json::Value {
		match self {
			Self::Payload(value) => value,
			Self::RetriesExhausted => serde_json::json!({ "msg": "Timeout" }),
		}
	}

	/// Returns `true` when the upstream rejected the presented token.
	///
	/// Forbidden-class responses carry an `error` field containing "Forbidden", distinct from
	/// business-rule rejections which use other fields.
	pub fn is_forbidden(&self) -> bool {
		match self {
			Self::Payload(value) => value
				.get("error")
				.and_then(serde_json::Value::as_str)
				.is_some_and(|error| error.contains("Forbidden")),
			Self::RetriesExhausted => false,
		}
	}
}
impl Display for ApiResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Payload(value) => Display::fmt(value, f),
			Self::RetriesExhausted => f.write_str(r#"{"msg":"Timeout"}"#),
		}
	}
}

/// Top-level request dispatcher coordinating token management, signing, and transport.
#[derive(Clone)]
pub struct Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	tokens: TokenManager<C, M>,
	base_url: Url,
	retry: RetryPolicy,
	timeout: Duration,
}
impl<C, M> Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a dispatcher that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		credentials: Credentials,
		base_url: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let tokens = TokenManager::new(
			http_client.clone(),
			transport_mapper.clone(),
			store,
			credentials,
			base_url.clone(),
		);

		Self {
			http_client,
			transport_mapper,
			tokens,
			base_url,
			retry: RetryPolicy::default(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Overrides the transport retry budget for both the business and token paths.
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self.tokens = self.tokens.with_retry_policy(retry);

		self
	}

	/// Overrides the client-side timeout for both the business and token paths.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self.tokens = self.tokens.with_timeout(timeout);

		self
	}

	/// Returns the token manager, e.g. to invalidate or pre-generate tokens.
	pub fn tokens(&self) -> &TokenManager<C, M> {
		&self.tokens
	}

	/// Posts `payload` to `path` with bearer auth and a single reauthentication retry.
	///
	/// At most two logical attempts are made per call; the transport retries each of them up to
	/// its own budget, so the worst case is `2 * attempts` network calls.
	pub async fn send(&self, path: &str, payload: &Payload) -> Result<ApiResponse> {
		const KIND: RequestKind = RequestKind::Business;

		let span = RequestSpan::new(KIND, "send");

		obs::record_request_outcome(KIND, RequestOutcome::Attempt);

		let result = span
			.instrument(async move {
				let first = self.attempt(path, payload).await?;

				if !first.is_forbidden() {
					return Ok(first);
				}

				// The upstream no longer accepts the cached token. Invalidate it and re-issue
				// once with a regenerated token; the second outcome is terminal either way.
				self.tokens.invalidate().await?;

				self.attempt(path, payload).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_request_outcome(KIND, RequestOutcome::Success),
			Err(_) => obs::record_request_outcome(KIND, RequestOutcome::Failure),
		}

		result
	}

	/// Attaches the endpoint's secure hash to `payload` and posts it to the endpoint path.
	///
	/// Endpoints without a hash convention are sent unsigned.
	pub async fn send_signed(&self, target: Endpoint, payload: &Payload) -> Result<ApiResponse> {
		match target.hash_field() {
			Some(field) => {
				let mut signed = payload.clone();

				hash::attach_secure_hash(
					&mut signed,
					field,
					self.tokens.credentials().shared_secret().expose(),
				);

				self.send(target.path(), &signed).await
			},
			None => self.send(target.path(), payload).await,
		}
	}

	async fn attempt(&self, path: &str, payload: &Payload) -> Result<ApiResponse> {
		let token = self.tokens.get_token().await?;
		let url = endpoint::join_path(&self.base_url, path)?;
		let mut headers = endpoint::base_headers();

		headers.push(("Authorization", format!("Bearer {}", token.expose())));

		let body_json = payload.to_json();

		obs::log_request(path, &body_json);

		let request =
			PostRequest { url, headers, body: body_json.to_string(), timeout: self.timeout };
		let response = match post_with_retry(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			RequestKind::Business,
			&request,
			self.retry,
		)
		.await
		{
			Ok(raw) => ApiResponse::Payload(raw.json().map_err(|e| Error::Api {
				message: format!("response body is not valid JSON: {e}"),
			})?),
			Err(RetryFailure::Exhausted { .. }) => ApiResponse::RetriesExhausted,
			Err(RetryFailure::Fatal { message }) => return Err(Error::Api { message }),
		};

		obs::log_response(path, &response);

		Ok(response)
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestDispatcher {
	/// Creates a dispatcher against the production base URL with a default reqwest transport.
	///
	/// Use [`Dispatcher::with_http_client`] to target another base URL or supply a custom
	/// transport.
	pub fn new(store: Arc<dyn TokenStore>, credentials: Credentials) -> Self {
		Self::with_http_client(
			store,
			credentials,
			endpoint::default_base_url(),
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Dispatcher<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("base_url", &self.base_url.as_str())
			.field("retry", &self.retry)
			.field("timeout", &self.timeout)
			.finish()
	}
}
