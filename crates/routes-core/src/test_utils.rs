//! In-memory collaborators shared by the orchestrator and watch tests.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use routes_delivery::{ChainClient, DeliveryError};
use routes_quote::QuoteTransport;
use routes_types::{
	ChainId, ChainLog, LogFilter, ProverKind, Transaction, TransactionReceipt, TransportError,
};
use routes_types::AddressRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MockChain {
	chain_id: ChainId,
	block: AtomicU64,
	block_reads: AtomicUsize,
	logs: Mutex<Vec<ChainLog>>,
	log_queries: Mutex<Vec<LogFilter>>,
	submitted: Mutex<Vec<Transaction>>,
	confirmed: Mutex<Vec<B256>>,
	receipt_logs: Mutex<HashMap<B256, Vec<ChainLog>>>,
	reverted: Mutex<HashSet<B256>>,
	/// Canned `eth_call` results keyed by selector.
	calls: Mutex<HashMap<[u8; 4], Bytes>>,
	/// Submission index (zero-based) that fails at broadcast.
	fail_submit_at: Mutex<Option<usize>>,
}

impl MockChain {
	pub fn new(chain_id: ChainId) -> Self {
		Self {
			chain_id,
			block: AtomicU64::new(0),
			block_reads: AtomicUsize::new(0),
			logs: Mutex::new(vec![]),
			log_queries: Mutex::new(vec![]),
			submitted: Mutex::new(vec![]),
			confirmed: Mutex::new(vec![]),
			receipt_logs: Mutex::new(HashMap::new()),
			reverted: Mutex::new(HashSet::new()),
			calls: Mutex::new(HashMap::new()),
			fail_submit_at: Mutex::new(None),
		}
	}

	pub fn at_block(self, block: u64) -> Self {
		self.set_block(block);
		self
	}

	pub fn set_block(&self, block: u64) {
		self.block.store(block, Ordering::SeqCst);
	}

	pub fn push_log(&self, log: ChainLog) {
		self.logs.lock().unwrap().push(log);
	}

	pub fn log_queries(&self) -> Vec<LogFilter> {
		self.log_queries.lock().unwrap().clone()
	}

	pub fn block_reads(&self) -> usize {
		self.block_reads.load(Ordering::SeqCst)
	}

	pub fn submitted(&self) -> Vec<Transaction> {
		self.submitted.lock().unwrap().clone()
	}

	pub fn confirmed(&self) -> Vec<B256> {
		self.confirmed.lock().unwrap().clone()
	}

	/// Hash the mock assigns to the `index`-th submission.
	pub fn tx_hash(index: usize) -> B256 {
		B256::repeat_byte(index as u8 + 1)
	}

	pub fn with_receipt_logs(&self, hash: B256, logs: Vec<ChainLog>) {
		self.receipt_logs.lock().unwrap().insert(hash, logs);
	}

	pub fn revert(&self, hash: B256) {
		self.reverted.lock().unwrap().insert(hash);
	}

	pub fn respond(&self, selector: [u8; 4], output: impl Into<Bytes>) {
		self.calls.lock().unwrap().insert(selector, output.into());
	}

	pub fn fail_submit_at(&self, index: usize) {
		*self.fail_submit_at.lock().unwrap() = Some(index);
	}
}

#[async_trait]
impl ChainClient for MockChain {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn submit(&self, tx: Transaction) -> Result<B256, DeliveryError> {
		let mut submitted = self.submitted.lock().unwrap();
		let index = submitted.len();
		if *self.fail_submit_at.lock().unwrap() == Some(index) {
			return Err(DeliveryError::Network("nonce too low".to_string()));
		}
		submitted.push(tx);
		Ok(Self::tx_hash(index))
	}

	async fn wait_for_confirmation(
		&self,
		hash: B256,
		_confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		self.confirmed.lock().unwrap().push(hash);
		Ok(TransactionReceipt {
			hash,
			block_number: self.block.load(Ordering::SeqCst),
			success: !self.reverted.lock().unwrap().contains(&hash),
			logs: self
				.receipt_logs
				.lock()
				.unwrap()
				.get(&hash)
				.cloned()
				.unwrap_or_default(),
		})
	}

	async fn block_number(&self) -> Result<u64, DeliveryError> {
		self.block_reads.fetch_add(1, Ordering::SeqCst);
		Ok(self.block.load(Ordering::SeqCst))
	}

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<ChainLog>, DeliveryError> {
		self.log_queries.lock().unwrap().push(filter.clone());
		let to_block = filter.to_block.unwrap_or(u64::MAX);
		Ok(self
			.logs
			.lock()
			.unwrap()
			.iter()
			.filter(|log| {
				let block = log.block_number.unwrap_or_default();
				filter.matches(log) && block >= filter.from_block && block <= to_block
			})
			.cloned()
			.collect())
	}

	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, DeliveryError> {
		let selector: [u8; 4] = data[..4].try_into().unwrap();
		self.calls
			.lock()
			.unwrap()
			.get(&selector)
			.cloned()
			.ok_or_else(|| DeliveryError::Network(format!("execution reverted at {}", to)))
	}
}

#[derive(Default)]
pub struct MockRegistry {
	pub intent_source: HashMap<ChainId, Address>,
	pub stablecoins: Vec<Address>,
	pub permit2: Option<Address>,
}

impl AddressRegistry for MockRegistry {
	fn intent_source(&self, chain: ChainId) -> Option<Address> {
		self.intent_source.get(&chain).copied()
	}

	fn inbox(&self, _chain: ChainId) -> Option<Address> {
		None
	}

	fn prover(&self, _chain: ChainId, _kind: ProverKind) -> Option<Address> {
		None
	}

	fn permit2(&self, _chain: ChainId) -> Option<Address> {
		self.permit2
	}

	fn supports_native_permit(&self, _chain: ChainId, token: &Address) -> bool {
		self.stablecoins.contains(token)
	}
}

/// Quoting transport answering every POST with one canned body.
pub struct RecordingTransport {
	pub response: serde_json::Value,
	pub requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTransport {
	pub fn new(response: serde_json::Value) -> Self {
		Self {
			response,
			requests: Mutex::new(vec![]),
		}
	}

	pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl QuoteTransport for RecordingTransport {
	async fn post(
		&self,
		url: &str,
		body: serde_json::Value,
	) -> Result<serde_json::Value, TransportError> {
		self.requests.lock().unwrap().push((url.to_string(), body));
		Ok(self.response.clone())
	}
}
