//! HTTP transport to the quoting service.

use async_trait::async_trait;
use reqwest::Client;
use routes_types::TransportError;
use std::time::Duration;
use tracing::debug;

/// One JSON POST exchange. Implementations do not retry.
#[async_trait]
pub trait QuoteTransport: Send + Sync {
	async fn post(
		&self,
		url: &str,
		body: serde_json::Value,
	) -> Result<serde_json::Value, TransportError>;
}

pub struct HttpTransport {
	client: Client,
}

impl HttpTransport {
	pub fn new(timeout: Duration) -> Result<Self, TransportError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self { client })
	}
}

fn request_error(err: reqwest::Error) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout
	} else {
		TransportError::Request(err.to_string())
	}
}

#[async_trait]
impl QuoteTransport for HttpTransport {
	async fn post(
		&self,
		url: &str,
		body: serde_json::Value,
	) -> Result<serde_json::Value, TransportError> {
		debug!(url = %url, "POST");

		let response = self
			.client
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(request_error)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(TransportError::Status {
				status: status.as_u16(),
				body,
			});
		}

		response
			.json::<serde_json::Value>()
			.await
			.map_err(|e| TransportError::Decode(e.to_string()))
	}
}
