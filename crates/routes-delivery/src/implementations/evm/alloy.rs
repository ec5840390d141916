//! EVM chain client over an alloy HTTP provider.

use crate::{ChainClient, DeliveryError};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionInput, TransactionRequest};
use async_trait::async_trait;
use routes_types::{truncate_hash, ChainId, ChainLog, LogFilter, Transaction, TransactionReceipt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Allowance per confirmation before giving up, capped at one hour.
const SECONDS_PER_CONFIRMATION: u64 = 20;
const MAX_CONFIRMATION_WAIT_SECS: u64 = 3600;

pub struct AlloyChainClient {
	provider: DynProvider,
	chain_id: ChainId,
	poll_interval: Duration,
}

impl AlloyChainClient {
	/// Connects to `rpc_url`. Without a wallet the client can read but every
	/// `submit` fails at signing.
	pub fn new(
		rpc_url: &str,
		chain_id: ChainId,
		wallet: Option<EthereumWallet>,
		poll_interval: Duration,
	) -> Result<Self, DeliveryError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL: {}", e)))?;

		let provider = match wallet {
			Some(wallet) => ProviderBuilder::new().wallet(wallet).connect_http(url).erased(),
			None => ProviderBuilder::new().connect_http(url).erased(),
		};

		Ok(Self {
			provider,
			chain_id,
			poll_interval,
		})
	}
}

#[async_trait]
impl ChainClient for AlloyChainClient {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn submit(&self, tx: Transaction) -> Result<B256, DeliveryError> {
		let to = tx.to;
		let request: TransactionRequest = tx.into();

		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending.tx_hash();
		info!(
			chain_id = %self.chain_id,
			to = %to,
			tx_hash = %truncate_hash(&tx_hash),
			"Submitted transaction"
		);

		Ok(tx_hash)
	}

	async fn wait_for_confirmation(
		&self,
		hash: B256,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		let timeout_seconds = (confirmations * SECONDS_PER_CONFIRMATION)
			.max(SECONDS_PER_CONFIRMATION)
			.min(MAX_CONFIRMATION_WAIT_SECS);
		let max_wait_time = Duration::from_secs(timeout_seconds);
		let start_time = Instant::now();

		info!(
			chain_id = %self.chain_id,
			tx_hash = %truncate_hash(&hash),
			"Waiting for {} confirmations (timeout: {}s)",
			confirmations,
			timeout_seconds
		);

		loop {
			if start_time.elapsed() > max_wait_time {
				return Err(DeliveryError::Timeout(format!(
					"{} confirmations for {} after {} seconds",
					confirmations,
					truncate_hash(&hash),
					max_wait_time.as_secs()
				)));
			}

			let receipt = match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					tokio::time::sleep(self.poll_interval).await;
					continue;
				}
				Err(e) => {
					return Err(DeliveryError::Network(format!(
						"Failed to get receipt: {}",
						e
					)));
				}
			};

			let current_block = self.block_number().await?;
			let tx_block = receipt.block_number.unwrap_or(0);
			// The inclusion block counts as the first confirmation.
			let current_confirmations = current_block.saturating_sub(tx_block) + 1;

			if current_confirmations >= confirmations {
				return Ok(TransactionReceipt {
					hash: receipt.transaction_hash,
					block_number: tx_block,
					success: receipt.status(),
					logs: receipt.inner.logs().iter().map(convert_log).collect(),
				});
			}

			debug!(
				tx_hash = %truncate_hash(&hash),
				"Waiting for {} more confirmations",
				confirmations - current_confirmations
			);
			tokio::time::sleep(self.poll_interval).await;
		}
	}

	async fn block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get block number: {}", e)))
	}

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<ChainLog>, DeliveryError> {
		let logs = self
			.provider
			.get_logs(&to_rpc_filter(filter))
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get logs: {}", e)))?;

		Ok(logs.iter().map(convert_log).collect())
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, DeliveryError> {
		let request = TransactionRequest {
			to: Some(to.into()),
			input: TransactionInput::new(data),
			..Default::default()
		};

		self.provider
			.call(request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Call to {} failed: {}", to, e)))
	}
}

fn convert_log(log: &Log) -> ChainLog {
	ChainLog {
		address: log.address(),
		topics: log.topics().to_vec(),
		data: log.data().data.clone(),
		block_number: log.block_number,
		transaction_hash: log.transaction_hash,
	}
}

fn to_rpc_filter(filter: &LogFilter) -> Filter {
	let mut rpc_filter = Filter::new()
		.address(filter.address)
		.event_signature(filter.event_signature)
		.from_block(filter.from_block);

	if let Some(topic) = filter.topic1 {
		rpc_filter = rpc_filter.topic1(topic);
	}
	if let Some(to_block) = filter.to_block {
		rpc_filter = rpc_filter.to_block(to_block);
	}

	rpc_filter
}
