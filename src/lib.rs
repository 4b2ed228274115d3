//! Resilient client for the Ecobank corporate banking API—cached bearer tokens, SHA-512 payload
//! signing, and bounded retries around every dispatch.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod hash;
pub mod http;
pub mod obs;
pub mod payload;
pub mod store;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		dispatch::{Dispatcher, ReqwestDispatcher},
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		store::{MemoryStore, TokenStore},
	};

	/// Dispatcher type alias used by reqwest-backed integration tests.
	pub type ReqwestTestDispatcher = ReqwestDispatcher;

	/// Credential fixture shaped like an upstream sandbox account.
	pub fn test_credentials(shared_secret: &str) -> Credentials {
		Credentials::new("sandbox-user", "sandbox-pass", shared_secret)
	}

	/// Constructs a [`Dispatcher`] backed by an in-memory token store and the reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_dispatcher(
		base_url: Url,
		shared_secret: &str,
	) -> (ReqwestTestDispatcher, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let dispatcher = Dispatcher::with_http_client(
			store,
			test_credentials(shared_secret),
			base_url,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(dispatcher, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
#[cfg(test)] use ecobank_express as _;
