//! Chain access for the publish flow.
//!
//! [`ChainClient`] is the one seam between the orchestrator and a chain:
//! submit a transaction, wait for it, read contract state and query logs.
//! [`DeliveryService`] routes each call to the client for its chain.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use routes_types::{ChainId, ChainLog, LogFilter, RoutesError, Transaction, TransactionReceipt};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod implementations;

pub use implementations::evm::alloy::AlloyChainClient;

#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	#[error("Timed out: {0}")]
	Timeout(String),
	#[error("No client configured for chain {0}")]
	UnknownChain(ChainId),
}

impl From<DeliveryError> for RoutesError {
	fn from(err: DeliveryError) -> Self {
		RoutesError::Chain(err.to_string())
	}
}

#[async_trait]
pub trait ChainClient: Send + Sync {
	fn chain_id(&self) -> ChainId;

	/// Signs and broadcasts a transaction, returning its hash.
	async fn submit(&self, tx: Transaction) -> Result<B256, DeliveryError>;

	/// Blocks until the transaction is mined with the requested depth.
	///
	/// A mined but reverted transaction is returned with `success == false`.
	async fn wait_for_confirmation(
		&self,
		hash: B256,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError>;

	async fn block_number(&self) -> Result<u64, DeliveryError>;

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<ChainLog>, DeliveryError>;

	/// Executes a read-only call and returns the raw return data.
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, DeliveryError>;
}

/// Chain clients keyed by chain id.
#[derive(Default, Clone)]
pub struct DeliveryService {
	clients: HashMap<ChainId, Arc<dyn ChainClient>>,
}

impl DeliveryService {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client(mut self, client: Arc<dyn ChainClient>) -> Self {
		self.register(client);
		self
	}

	pub fn register(&mut self, client: Arc<dyn ChainClient>) {
		let chain_id = client.chain_id();
		debug!(chain_id = %chain_id, "Registered chain client");
		self.clients.insert(chain_id, client);
	}

	pub fn client(&self, chain: ChainId) -> Result<Arc<dyn ChainClient>, DeliveryError> {
		self.clients
			.get(&chain)
			.cloned()
			.ok_or(DeliveryError::UnknownChain(chain))
	}

	pub async fn submit(&self, tx: Transaction) -> Result<B256, DeliveryError> {
		self.client(tx.chain_id)?.submit(tx).await
	}

	pub async fn call(&self, chain: ChainId, to: Address, data: Bytes) -> Result<Bytes, DeliveryError> {
		self.client(chain)?.call(to, data).await
	}
}
