//! Quoting service client.

use crate::transport::{HttpTransport, QuoteTransport};
use crate::wire::{
	parse_quotes, Envelope, GaslessIntentData, GaslessIntentRequest, GaslessIntentResponse,
	IntentData, PermitData, QuoteRequest,
};
use alloy::primitives::{Address, B256};
use backoff::backoff::{Backoff, Constant};
use routes_config::QuotingConfig;
use routes_intent::codec::is_transfer_call;
use routes_types::{
	GaslessAuthorization, Intent, IntentExecutionType, Result, RoutesError, SolverQuote,
	TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything needed to hand a signed intent to the quoting service.
#[derive(Debug, Clone)]
pub struct GaslessInitiation {
	pub quote_id: String,
	pub solver_id: String,
	pub funder: Address,
	pub vault_address: Address,
	/// The intent, already adjusted by the selected quote.
	pub intent: Intent,
	pub allow_partial: Option<bool>,
	pub authorization: Option<GaslessAuthorization>,
}

pub struct QuotingClient {
	transport: Arc<dyn QuoteTransport>,
	config: QuotingConfig,
	dapp_id: String,
}

impl QuotingClient {
	pub fn new(
		transport: Arc<dyn QuoteTransport>,
		config: QuotingConfig,
		dapp_id: impl Into<String>,
	) -> Self {
		Self {
			transport,
			config,
			dapp_id: dapp_id.into(),
		}
	}

	/// Client over HTTP with the configured timeout.
	pub fn http(config: QuotingConfig, dapp_id: impl Into<String>) -> Result<Self> {
		let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
		Ok(Self::new(Arc::new(transport), config, dapp_id))
	}

	/// Asks solvers what reward they want for the intent's route.
	pub async fn request_quotes(
		&self,
		intent: &Intent,
		execution_types: &[IntentExecutionType],
	) -> Result<Vec<SolverQuote>> {
		let url = self.url(&self.config.quotes_path);
		let body = self.quote_request(intent, execution_types)?;

		let response = self.post_with_retry(&url, body).await?;
		let quotes = parse_quotes(response)?;

		info!(
			source = %intent.source(),
			destination = %intent.destination(),
			count = quotes.len(),
			"Received quotes"
		);
		Ok(quotes)
	}

	/// Fixes the route amounts and asks solvers for the smallest reward.
	///
	/// Every route call must be an ERC-20 transfer; anything else is rejected
	/// locally without a request.
	pub async fn request_reverse_quotes(
		&self,
		intent: &Intent,
		execution_types: &[IntentExecutionType],
	) -> Result<Vec<SolverQuote>> {
		if let Some(index) = intent.route.calls.iter().position(|c| !is_transfer_call(c)) {
			return Err(RoutesError::validation(format!(
				"Reverse quote route calls must be transfer calls (call {} is not)",
				index
			)));
		}

		let url = self.url(&self.config.reverse_quotes_path);
		let body = self.quote_request(intent, execution_types)?;

		let response = self.post_with_retry(&url, body).await?;
		let quotes = parse_quotes(response)?;

		info!(count = quotes.len(), "Received reverse quotes");
		Ok(quotes)
	}

	/// Submits a gasless intent and returns the initiation transaction hash.
	///
	/// Sent exactly once: the service may already have moved funds when a
	/// response is lost.
	pub async fn initiate_gasless_intent(&self, params: &GaslessInitiation) -> Result<B256> {
		let mut intent_data = IntentData::from_intent(&params.intent);
		intent_data.gasless_intent_data = Some(GaslessIntentData {
			funder: params.funder,
			vault_address: params.vault_address,
			allow_partial: params.allow_partial,
			permit_data: params
				.authorization
				.as_ref()
				.filter(|auth| !auth.is_empty())
				.map(PermitData::from),
		});

		let request = GaslessIntentRequest {
			quote_id: params.quote_id.clone(),
			dapp_id: self.dapp_id.clone(),
			solver_id: params.solver_id.clone(),
			intent_data,
		};
		let body = serde_json::to_value(&request)
			.map_err(|e| RoutesError::validation(format!("Unserializable request: {}", e)))?;

		let url = self.url(&self.config.gasless_path);
		let response = self.transport.post(&url, body).await?;

		let parsed: Envelope<GaslessIntentResponse> = serde_json::from_value(response)
			.map_err(|e| TransportError::Decode(format!("Malformed gasless response: {}", e)))?;
		let tx_hash = parsed.into_inner().transaction_hash;

		let hash = tx_hash.parse::<B256>().map_err(|_| {
			TransportError::Decode(format!("Invalid transaction hash: {}", tx_hash))
		})?;

		info!(quote_id = %params.quote_id, tx_hash = %tx_hash, "Initiated gasless intent");
		Ok(hash)
	}

	fn quote_request(
		&self,
		intent: &Intent,
		execution_types: &[IntentExecutionType],
	) -> Result<serde_json::Value> {
		if let Some(unsupported) = execution_types.iter().find(|t| !t.is_supported()) {
			return Err(RoutesError::UnsupportedExecutionType(unsupported.to_string()));
		}

		let request = QuoteRequest {
			dapp_id: self.dapp_id.clone(),
			intent_execution_types: execution_types.to_vec(),
			intent_data: IntentData::from_intent(intent),
		};
		serde_json::to_value(&request)
			.map_err(|e| RoutesError::validation(format!("Unserializable request: {}", e)))
	}

	/// POSTs with a fixed delay between attempts, returning the last
	/// transport error unchanged once attempts run out.
	async fn post_with_retry(
		&self,
		url: &str,
		body: serde_json::Value,
	) -> std::result::Result<serde_json::Value, TransportError> {
		let max_attempts = self.config.max_attempts.max(1);
		let mut backoff = Constant::new(Duration::from_millis(self.config.retry_delay_ms));
		let mut attempts = 0;

		loop {
			attempts += 1;
			match self.transport.post(url, body.clone()).await {
				Ok(response) => {
					debug!(url = %url, attempts, "Quote request succeeded");
					return Ok(response);
				}
				Err(e) => {
					if attempts >= max_attempts {
						warn!(
							"Quote request failed after {} attempts, giving up: {}",
							attempts, e
						);
						return Err(e);
					}

					match backoff.next_backoff() {
						Some(delay) => {
							warn!(
								"Quote request failed, attempt {}/{}, retrying in {:?}: {}",
								attempts, max_attempts, delay, e
							);
							tokio::time::sleep(delay).await;
						}
						None => return Err(e),
					}
				}
			}
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Bytes, U256};
	use async_trait::async_trait;
	use routes_intent::codec::encode_transfer;
	use routes_types::{Call, ChainId, Permit1Entry, Reward, Route, TokenAmount};
	use serde_json::json;
	use std::collections::VecDeque;
	use std::sync::Mutex;

	/// Replays scripted responses and records every request.
	#[derive(Default)]
	struct ScriptedTransport {
		responses: Mutex<VecDeque<std::result::Result<serde_json::Value, TransportError>>>,
		requests: Mutex<Vec<(String, serde_json::Value)>>,
		attempted_at: Mutex<Vec<tokio::time::Instant>>,
	}

	impl ScriptedTransport {
		fn new(
			responses: Vec<std::result::Result<serde_json::Value, TransportError>>,
		) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into()),
				requests: Mutex::new(vec![]),
				attempted_at: Mutex::new(vec![]),
			})
		}

		fn calls(&self) -> usize {
			self.requests.lock().unwrap().len()
		}
	}

	#[async_trait]
	impl QuoteTransport for ScriptedTransport {
		async fn post(
			&self,
			url: &str,
			body: serde_json::Value,
		) -> std::result::Result<serde_json::Value, TransportError> {
			self.requests.lock().unwrap().push((url.to_string(), body));
			self.attempted_at
				.lock()
				.unwrap()
				.push(tokio::time::Instant::now());
			self.responses
				.lock()
				.unwrap()
				.pop_front()
				.unwrap_or(Err(TransportError::Request("script exhausted".to_string())))
		}
	}

	fn config() -> QuotingConfig {
		QuotingConfig {
			base_url: "http://quotes.test/".to_string(),
			retry_delay_ms: 0,
			..QuotingConfig::default()
		}
	}

	fn client(transport: Arc<ScriptedTransport>) -> QuotingClient {
		QuotingClient::new(transport, config(), "test-dapp")
	}

	fn intent(calls: Vec<Call>) -> Intent {
		Intent::new(
			Route {
				salt: B256::ZERO,
				source: ChainId::OPTIMISM,
				destination: ChainId::BASE,
				inbox: Address::repeat_byte(0x01),
				tokens: vec![TokenAmount::new(Address::repeat_byte(0xaa), U256::from(100))],
				calls,
			},
			Reward {
				creator: Address::repeat_byte(0x02),
				prover: Address::repeat_byte(0x03),
				deadline: 1_700_000_000,
				native_value: U256::ZERO,
				tokens: vec![TokenAmount::new(Address::repeat_byte(0xbb), U256::from(101))],
			},
		)
	}

	fn transfer_call() -> Call {
		Call {
			target: Address::repeat_byte(0xaa),
			data: encode_transfer(Address::repeat_byte(0x02), U256::from(100)),
			value: U256::ZERO,
		}
	}

	fn quote_response() -> serde_json::Value {
		json!([{
			"quoteID": "q-1",
			"solverID": "solver-a",
			"quoteData": { "quoteEntries": [{
				"intentExecutionType": "SELF_PUBLISH",
				"rewardTokens": [{
					"token": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
					"amount": "101"
				}],
				"expiryTime": "1700000600",
				"estimatedFulfillTimeSec": 9
			}]}
		}])
	}

	#[tokio::test]
	async fn test_request_quotes() {
		let transport = ScriptedTransport::new(vec![Ok(quote_response())]);
		let quotes = client(transport.clone())
			.request_quotes(&intent(vec![transfer_call()]), &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();

		assert_eq!(quotes.len(), 1);
		assert_eq!(quotes[0].quote_id, "q-1");

		let requests = transport.requests.lock().unwrap();
		assert_eq!(requests[0].0, "http://quotes.test/api/v2/quotes");
		assert_eq!(requests[0].1["dAppID"], "test-dapp");
	}

	#[tokio::test(start_paused = true)]
	async fn test_default_policy_waits_one_second_between_attempts() {
		let transport = ScriptedTransport::new(vec![]);
		let client = QuotingClient::new(
			transport.clone(),
			QuotingConfig::default(),
			"test-dapp",
		);

		let start = tokio::time::Instant::now();
		let err = client
			.request_quotes(&intent(vec![]), &[IntentExecutionType::SelfPublish])
			.await
			.unwrap_err();

		assert!(matches!(err, RoutesError::Transport(_)));
		let attempted_at = transport.attempted_at.lock().unwrap().clone();
		assert_eq!(attempted_at.len(), 5);
		assert_eq!(attempted_at[0], start);
		for pair in attempted_at.windows(2) {
			assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
		}
		assert_eq!(start.elapsed(), Duration::from_secs(4));
	}

	#[tokio::test]
	async fn test_retries_then_succeeds() {
		let transport = ScriptedTransport::new(vec![
			Err(TransportError::Timeout),
			Err(TransportError::Status {
				status: 503,
				body: "busy".to_string(),
			}),
			Ok(quote_response()),
		]);

		let quotes = client(transport.clone())
			.request_quotes(&intent(vec![]), &[IntentExecutionType::SelfPublish])
			.await
			.unwrap();

		assert_eq!(quotes.len(), 1);
		assert_eq!(transport.calls(), 3);
	}

	#[tokio::test]
	async fn test_retries_five_times_and_returns_last_error() {
		let last = TransportError::Status {
			status: 502,
			body: "bad gateway".to_string(),
		};
		let transport = ScriptedTransport::new(vec![
			Err(TransportError::Timeout),
			Err(TransportError::Timeout),
			Err(TransportError::Request("reset".to_string())),
			Err(TransportError::Timeout),
			Err(last.clone()),
			Ok(quote_response()),
		]);

		let err = client(transport.clone())
			.request_quotes(&intent(vec![]), &[IntentExecutionType::SelfPublish])
			.await
			.unwrap_err();

		assert_eq!(transport.calls(), 5);
		match err {
			RoutesError::Transport(e) => assert_eq!(e, last),
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_reverse_quotes_require_transfer_calls() {
		let transport = ScriptedTransport::new(vec![Ok(quote_response())]);
		let approve_like = Call {
			target: Address::repeat_byte(0xaa),
			data: Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3]),
			value: U256::ZERO,
		};

		let err = client(transport.clone())
			.request_reverse_quotes(
				&intent(vec![transfer_call(), approve_like]),
				&[IntentExecutionType::Gasless],
			)
			.await
			.unwrap_err();

		match err {
			RoutesError::Validation(reason) => assert!(reason.contains("must be transfer calls")),
			other => panic!("unexpected error: {:?}", other),
		}
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn test_reverse_quotes_endpoint() {
		let transport = ScriptedTransport::new(vec![Ok(json!({ "data": [] }))]);
		let quotes = client(transport.clone())
			.request_reverse_quotes(&intent(vec![transfer_call()]), &[IntentExecutionType::Gasless])
			.await
			.unwrap();

		assert!(quotes.is_empty());
		assert_eq!(
			transport.requests.lock().unwrap()[0].0,
			"http://quotes.test/api/v2/quotes/reverse"
		);
	}

	#[tokio::test]
	async fn test_unknown_execution_type_rejected_locally() {
		let transport = ScriptedTransport::new(vec![]);
		let err = client(transport.clone())
			.request_quotes(&intent(vec![]), &[IntentExecutionType::from("CROSS_CHAIN_MAGIC")])
			.await
			.unwrap_err();

		assert!(matches!(err, RoutesError::UnsupportedExecutionType(_)));
		assert_eq!(transport.calls(), 0);
	}

	fn initiation() -> GaslessInitiation {
		GaslessInitiation {
			quote_id: "q-1".to_string(),
			solver_id: "solver-a".to_string(),
			funder: Address::repeat_byte(0x02),
			vault_address: Address::repeat_byte(0x0c),
			intent: intent(vec![transfer_call()]),
			allow_partial: None,
			authorization: Some(GaslessAuthorization {
				permit: vec![Permit1Entry {
					token: Address::repeat_byte(0xbb),
					signature: Bytes::from(vec![7; 65]),
					deadline: U256::from(1_700_000_000),
				}],
				permit2: None,
			}),
		}
	}

	#[tokio::test]
	async fn test_initiate_gasless_intent() {
		let hash = B256::repeat_byte(0x5a);
		let transport = ScriptedTransport::new(vec![Ok(json!({
			"data": { "transactionHash": hash.to_string() }
		}))]);

		let result = client(transport.clone())
			.initiate_gasless_intent(&initiation())
			.await
			.unwrap();
		assert_eq!(result, hash);

		let requests = transport.requests.lock().unwrap();
		let (url, body) = &requests[0];
		assert_eq!(url, "http://quotes.test/api/v1/intents/initiateGaslessIntent");
		assert_eq!(body["quoteID"], "q-1");
		assert_eq!(body["solverID"], "solver-a");
		let gasless = &body["intentData"]["gaslessIntentData"];
		assert_eq!(
			gasless["vaultAddress"].as_str().unwrap().to_lowercase(),
			format!("0x{}", "0c".repeat(20))
		);
		assert!(gasless.get("allowPartial").is_none());
		assert!(gasless["permitData"]["permit"].is_array());
		assert!(gasless["permitData"].get("permit2").is_none());
	}

	#[tokio::test]
	async fn test_gasless_initiation_is_not_retried() {
		let transport = ScriptedTransport::new(vec![
			Err(TransportError::Timeout),
			Ok(json!({ "transactionHash": B256::ZERO.to_string() })),
		]);

		let err = client(transport.clone())
			.initiate_gasless_intent(&initiation())
			.await
			.unwrap_err();

		assert!(matches!(err, RoutesError::Transport(TransportError::Timeout)));
		assert_eq!(transport.calls(), 1);
	}
}
