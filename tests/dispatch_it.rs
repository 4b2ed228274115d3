// crates.io
use httpmock::prelude::*;
// self
use ecobank_express::{
	_preludet::*,
	payload::Payload,
	store::{TOKEN_STORE_KEY, TokenStore},
};

const TOKEN_PATH: &str = "/corporateapi/user/token";
const BUSINESS_PATH: &str = "/corporateapi/merchant/getmcc";

fn server_base_url(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock server base URL should parse successfully.")
}

fn request_payload() -> Payload {
	Payload::new().with("requestId", "123344").with("affiliateCode", "EGH")
}

#[tokio::test]
async fn success_passes_the_response_through_unchanged() {
	let server = MockServer::start_async().await;
	let (dispatcher, store) = build_reqwest_test_dispatcher(server_base_url(&server), "K1");

	store
		.set(TOKEN_STORE_KEY, "valid-token")
		.await
		.expect("Preloading the token cache should succeed.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body(r#"{"token":"unexpected"}"#);
		})
		.await;
	let business_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(BUSINESS_PATH)
				.header("authorization", "Bearer valid-token")
				.header("origin", "developer.ecobank.com");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"response_message":"success","response_code":"000"}"#);
		})
		.await;
	let response = dispatcher
		.send(BUSINESS_PATH, &request_payload())
		.await
		.expect("Business dispatch should succeed.");
	let payload = response.as_payload().expect("A successful call should carry a payload.");

	assert_eq!(payload["response_message"], "success");
	assert_eq!(payload["response_code"], "000");

	business_mock.assert_async().await;
	token_mock.assert_calls_async(0).await;

	// No Forbidden indicator, so the cached token must remain untouched.
	assert_eq!(
		store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
		Some("valid-token".into()),
	);
}

#[tokio::test]
async fn forbidden_triggers_exactly_one_reauth_cycle() {
	let server = MockServer::start_async().await;
	let (dispatcher, store) = build_reqwest_test_dispatcher(server_base_url(&server), "K1");

	store
		.set(TOKEN_STORE_KEY, "stale-token")
		.await
		.expect("Preloading the token cache should succeed.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body(r#"{"token":"fresh-token"}"#);
		})
		.await;
	let stale_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(BUSINESS_PATH).header("authorization", "Bearer stale-token");
			then.status(200).body(r#"{"error":"Forbidden access"}"#);
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(BUSINESS_PATH).header("authorization", "Bearer fresh-token");
			then.status(200).body(r#"{"response_message":"success"}"#);
		})
		.await;
	let response = dispatcher
		.send(BUSINESS_PATH, &request_payload())
		.await
		.expect("Dispatch should recover from a rejected token.");
	let payload = response.as_payload().expect("The retried call should carry a payload.");

	assert_eq!(payload["response_message"], "success");

	stale_mock.assert_calls_async(1).await;
	token_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(1).await;

	assert_eq!(
		store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
		Some("fresh-token".into()),
	);
}

#[tokio::test]
async fn second_forbidden_is_returned_verbatim_without_recursion() {
	let server = MockServer::start_async().await;
	let (dispatcher, store) = build_reqwest_test_dispatcher(server_base_url(&server), "K1");

	store
		.set(TOKEN_STORE_KEY, "stale-token")
		.await
		.expect("Preloading the token cache should succeed.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body(r#"{"token":"fresh-token"}"#);
		})
		.await;
	let stale_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(BUSINESS_PATH).header("authorization", "Bearer stale-token");
			then.status(200).body(r#"{"error":"Forbidden access"}"#);
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(BUSINESS_PATH).header("authorization", "Bearer fresh-token");
			then.status(200).body(r#"{"error":"Forbidden access, still"}"#);
		})
		.await;
	let response = dispatcher
		.send(BUSINESS_PATH, &request_payload())
		.await
		.expect("A persistently rejected call should still resolve to a response.");
	let payload = response.as_payload().expect("The retried call should carry a payload.");

	assert_eq!(payload["error"], "Forbidden access, still");

	// One reauthentication cycle only; no further recursion on the second rejection.
	stale_mock.assert_calls_async(1).await;
	token_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn retry_exhaustion_on_the_business_path_returns_the_sentinel() {
	let server = MockServer::start_async().await;
	let (dispatcher, store) = build_reqwest_test_dispatcher(server_base_url(&server), "K1");
	let dispatcher = dispatcher.with_timeout(Duration::from_millis(200));

	store
		.set(TOKEN_STORE_KEY, "valid-token")
		.await
		.expect("Preloading the token cache should succeed.");

	let business_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(BUSINESS_PATH);
			then.status(200)
				.body(r#"{"response_message":"too late"}"#)
				.delay(Duration::from_secs(2));
		})
		.await;
	let response = dispatcher
		.send(BUSINESS_PATH, &request_payload())
		.await
		.expect("Business retry exhaustion must not raise.");

	assert!(response.is_retries_exhausted());
	assert_eq!(response.to_string(), r#"{"msg":"Timeout"}"#);

	business_mock.assert_calls_async(3).await;

	// The sentinel is not a Forbidden response, so the token survives.
	assert_eq!(
		store.get(TOKEN_STORE_KEY).await.expect("Token store fetch should succeed."),
		Some("valid-token".into()),
	);
}
