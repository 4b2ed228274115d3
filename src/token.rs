//! Bearer token lifecycle: lazy acquisition, caching, and invalidation.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credentials},
	endpoint::{self, TOKEN_PATH},
	http::{
		ApiHttpClient, DEFAULT_TIMEOUT, PostRequest, RetryFailure, RetryPolicy,
		TransportErrorMapper, post_with_retry,
	},
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
	payload::Payload,
	store::{TOKEN_STORE_KEY, TokenStore},
};

/// Owns token acquisition and invalidation against the shared token cache.
///
/// The manager is the cache's sole writer. Tokens are created lazily on first use, overwritten
/// unconditionally on regeneration, and deleted only when a business call reports the token as
/// forbidden. Concurrent regenerations are benign: each produces a valid token and the last
/// write wins.
#[derive(Clone)]
pub struct TokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	store: Arc<dyn TokenStore>,
	credentials: Credentials,
	base_url: Url,
	retry: RetryPolicy,
	timeout: Duration,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager over the provided transport, cache, and credentials.
	pub fn new(
		http_client: Arc<C>,
		transport_mapper: Arc<M>,
		store: Arc<dyn TokenStore>,
		credentials: Credentials,
		base_url: Url,
	) -> Self {
		Self {
			http_client,
			transport_mapper,
			store,
			credentials,
			base_url,
			retry: RetryPolicy::default(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Overrides the transport retry budget.
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the client-side timeout on the token call.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Returns the credential set the manager signs requests with.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Returns the cached token when present and non-blank, generating one otherwise.
	///
	/// A cached value that is empty or whitespace-only counts as absent.
	pub async fn get_token(&self) -> Result<BearerToken> {
		if let Some(cached) = self.store.get(TOKEN_STORE_KEY).await?
			&& !cached.trim().is_empty()
		{
			return Ok(BearerToken::new(cached));
		}

		self.generate_token().await
	}

	/// Acquires a fresh token from the upstream and unconditionally overwrites the cache.
	///
	/// Transient transport failures are retried within the policy budget; exhaustion is fatal
	/// here ([`Error::Timeout`]), unlike the business path which degrades to a sentinel value.
	pub async fn generate_token(&self) -> Result<BearerToken> {
		const KIND: RequestKind = RequestKind::Token;

		let span = RequestSpan::new(KIND, "generate_token");

		obs::record_request_outcome(KIND, RequestOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = endpoint::join_path(&self.base_url, TOKEN_PATH)?;
				let body = Payload::new()
					.with("userId", self.credentials.user_id())
					.with("password", self.credentials.password().expose());
				let request = PostRequest {
					url,
					headers: endpoint::base_headers(),
					body: body.to_json().to_string(),
					timeout: self.timeout,
				};
				let response = post_with_retry(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					KIND,
					&request,
					self.retry,
				)
				.await
				.map_err(|failure| match failure {
					RetryFailure::Exhausted { attempts, .. } => Error::Timeout { attempts },
					RetryFailure::Fatal { message } => Error::Api { message },
				})?;
				let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
				let parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
					.map_err(|source| Error::TokenResponseParse {
						source,
						status: Some(response.status),
					})?;

				self.store.set(TOKEN_STORE_KEY, &parsed.token).await?;

				Ok(BearerToken::new(parsed.token))
			})
			.await;

		match &result {
			Ok(_) => obs::record_request_outcome(KIND, RequestOutcome::Success),
			Err(_) => obs::record_request_outcome(KIND, RequestOutcome::Failure),
		}

		result
	}

	/// Deletes the cached token; succeeds even when no token is cached.
	pub async fn invalidate(&self) -> Result<()> {
		self.store.delete(TOKEN_STORE_KEY).await?;

		Ok(())
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("base_url", &self.base_url.as_str())
			.field("user_id", &self.credentials.user_id())
			.field("retry", &self.retry)
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	token: String,
}

#[cfg(test)]
mod tests {
	// std
	use std::io;
	// self
	use super::*;
	use crate::{
		http::{ErrorClass, RawResponse, TransportFuture},
		store::MemoryStore,
	};

	/// Transport stub that replays a fixed script of failures and responses.
	struct ScriptedClient {
		script: Mutex<Vec<Result<RawResponse, io::Error>>>,
		calls: Mutex<u32>,
	}
	impl ScriptedClient {
		fn new(script: Vec<Result<RawResponse, io::Error>>) -> Self {
			Self { script: Mutex::new(script), calls: Mutex::new(0) }
		}

		fn calls(&self) -> u32 {
			*self.calls.lock()
		}
	}
	impl ApiHttpClient for ScriptedClient {
		type TransportError = io::Error;

		fn post(&self, _request: PostRequest) -> TransportFuture<'_, Self::TransportError> {
			*self.calls.lock() += 1;

			let next = {
				let mut script = self.script.lock();

				if script.is_empty() {
					Ok(RawResponse { status: 500, body: b"{}".to_vec() })
				} else {
					script.remove(0)
				}
			};

			Box::pin(async move { next })
		}
	}

	struct IoKindMapper;
	impl TransportErrorMapper<io::Error> for IoKindMapper {
		fn classify(&self, error: &io::Error) -> ErrorClass {
			match error.kind() {
				io::ErrorKind::ConnectionReset | io::ErrorKind::TimedOut => ErrorClass::Transient,
				_ => ErrorClass::Fatal,
			}
		}
	}

	fn manager_over(
		script: Vec<Result<RawResponse, io::Error>>,
	) -> (TokenManager<ScriptedClient, IoKindMapper>, Arc<ScriptedClient>, Arc<MemoryStore>) {
		let client = Arc::new(ScriptedClient::new(script));
		let store = Arc::new(MemoryStore::default());
		let manager = TokenManager::new(
			client.clone(),
			Arc::new(IoKindMapper),
			store.clone(),
			Credentials::new("api-user", "api-pass", "K1"),
			Url::parse("https://developer.ecobank.com").expect("Base URL fixture should parse."),
		);

		(manager, client, store)
	}

	fn reset() -> io::Error {
		io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer")
	}

	fn token_response(token: &str) -> Result<RawResponse, io::Error> {
		Ok(RawResponse { status: 200, body: format!(r#"{{"token":"{token}"}}"#).into_bytes() })
	}

	#[tokio::test]
	async fn two_transient_failures_then_success_yields_a_token() {
		let (manager, client, store) =
			manager_over(vec![Err(reset()), Err(reset()), token_response("issued-token")]);
		let token = manager
			.get_token()
			.await
			.expect("Two transient failures should stay within the retry budget.");

		assert_eq!(token.expose(), "issued-token");
		assert_eq!(client.calls(), 3);
		assert_eq!(
			store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
			Some("issued-token".into()),
		);
	}

	#[tokio::test]
	async fn a_third_transient_failure_exhausts_the_token_path() {
		let (manager, client, store) =
			manager_over(vec![Err(reset()), Err(reset()), Err(reset())]);
		let err = manager
			.get_token()
			.await
			.expect_err("Exhausted retries on the token path must surface as an error.");

		assert!(matches!(err, Error::Timeout { attempts: 3 }));
		assert_eq!(client.calls(), 3);
		assert_eq!(
			store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
			None,
		);
	}

	#[tokio::test]
	async fn blank_cached_token_counts_as_absent() {
		let (manager, client, store) = manager_over(vec![token_response("fresh-token")]);

		store
			.set(TOKEN_STORE_KEY, "   ")
			.await
			.expect("Preloading a blank token should succeed.");

		let token = manager
			.get_token()
			.await
			.expect("A whitespace-only cached token should fall back to generation.");

		assert_eq!(token.expose(), "fresh-token");
		assert_eq!(client.calls(), 1);
		assert_eq!(
			store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
			Some("fresh-token".into()),
		);
	}
}
