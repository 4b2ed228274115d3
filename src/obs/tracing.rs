// self
use crate::{_prelude::*, dispatch::ApiResponse, obs::RequestKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used around token and business calls.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided request kind + stage.
	pub fn new(kind: RequestKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("ecobank_express.request", kind = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the outbound request trace line (method, path, body).
pub fn log_request(path: &str, body: &serde_json::Value) {
	#[cfg(feature = "tracing")]
	tracing::debug!(target: "ecobank_express", method = "post", %path, %body, "request");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (path, body);
	}
}

/// Emits the inbound response trace line, covering both payloads and the timeout sentinel.
pub fn log_response(path: &str, response: &ApiResponse) {
	#[cfg(feature = "tracing")]
	tracing::debug!(target: "ecobank_express", %path, body = %response, "response");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (path, response);
	}
}
