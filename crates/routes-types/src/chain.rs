//! Chain-level types: identifiers, transactions, receipts and logs.
//!
//! These mirror the handful of RPC shapes the publish flow needs, so that
//! nothing above the delivery layer depends on a particular provider.

use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const ETHEREUM: Self = Self(1);
	pub const OPTIMISM: Self = Self(10);
	pub const POLYGON: Self = Self(137);
	pub const BASE: Self = Self(8453);
	pub const ARBITRUM: Self = Self(42161);
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(ChainId(s.parse()?))
	}
}

impl From<u64> for ChainId {
	fn from(id: u64) -> Self {
		ChainId(id)
	}
}

/// Blockchain transaction representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Contract being called.
	pub to: Address,
	/// Calldata.
	pub data: Bytes,
	/// Native value attached to the call.
	pub value: U256,
	/// Chain the transaction is meant for.
	pub chain_id: ChainId,
	/// Gas limit, filled by the provider when absent.
	pub gas_limit: Option<u64>,
}

impl Transaction {
	pub fn call(chain_id: ChainId, to: Address, data: impl Into<Bytes>) -> Self {
		Self {
			to,
			data: data.into(),
			value: U256::ZERO,
			chain_id,
			gas_limit: None,
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}
}

impl From<Transaction> for TransactionRequest {
	fn from(tx: Transaction) -> Self {
		TransactionRequest {
			chain_id: Some(tx.chain_id.0),
			to: Some(TxKind::Call(tx.to)),
			value: Some(tx.value),
			gas: tx.gas_limit,
			input: TransactionInput::new(tx.data),
			..Default::default()
		}
	}
}

/// A log entry as emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLog {
	pub address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	pub block_number: Option<u64>,
	pub transaction_hash: Option<B256>,
}

impl ChainLog {
	/// First indexed argument, if the event has one.
	pub fn topic1(&self) -> Option<B256> {
		self.topics.get(1).copied()
	}

	pub fn is_event(&self, signature: B256) -> bool {
		self.topics.first() == Some(&signature)
	}
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: B256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Logs emitted during execution.
	pub logs: Vec<ChainLog>,
}

/// Log query restricted to one contract and one event signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
	pub address: Address,
	pub event_signature: B256,
	pub topic1: Option<B256>,
	pub from_block: u64,
	pub to_block: Option<u64>,
}

impl LogFilter {
	pub fn new(address: Address, event_signature: B256) -> Self {
		Self {
			address,
			event_signature,
			topic1: None,
			from_block: 0,
			to_block: None,
		}
	}

	pub fn with_topic1(mut self, topic: B256) -> Self {
		self.topic1 = Some(topic);
		self
	}

	pub fn from_block(mut self, block: u64) -> Self {
		self.from_block = block;
		self
	}

	pub fn to_block(mut self, block: u64) -> Self {
		self.to_block = Some(block);
		self
	}

	/// Whether a log satisfies this filter, ignoring the block range.
	pub fn matches(&self, log: &ChainLog) -> bool {
		log.address == self.address
			&& log.is_event(self.event_signature)
			&& self.topic1.map_or(true, |t| log.topic1() == Some(t))
	}
}

/// Utility function to truncate a hash for display.
pub fn truncate_hash(hash: &B256) -> String {
	let hash_str = hex::encode(hash.0);
	format!("{}..", &hash_str[..8])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chain_id_parse_and_display() {
		let id: ChainId = "8453".parse().unwrap();
		assert_eq!(id, ChainId::BASE);
		assert_eq!(id.to_string(), "8453");
		assert!("base".parse::<ChainId>().is_err());
	}

	#[test]
	fn test_transaction_into_request() {
		let to = Address::repeat_byte(0x11);
		let tx = Transaction::call(ChainId::OPTIMISM, to, vec![0xde, 0xad]).with_value(U256::from(7));
		let request: TransactionRequest = tx.into();

		assert_eq!(request.chain_id, Some(10));
		assert_eq!(request.to, Some(TxKind::Call(to)));
		assert_eq!(request.value, Some(U256::from(7)));
		assert_eq!(request.input.input().map(|b| b.to_vec()), Some(vec![0xde, 0xad]));
	}

	#[test]
	fn test_log_filter_matches_topic1() {
		let address = Address::repeat_byte(0x22);
		let signature = B256::repeat_byte(0x01);
		let hash = B256::repeat_byte(0x02);
		let log = ChainLog {
			address,
			topics: vec![signature, hash],
			data: Bytes::new(),
			block_number: Some(5),
			transaction_hash: None,
		};

		assert!(LogFilter::new(address, signature).with_topic1(hash).matches(&log));
		assert!(!LogFilter::new(address, signature)
			.with_topic1(B256::repeat_byte(0x03))
			.matches(&log));
		assert!(!LogFilter::new(Address::ZERO, signature).matches(&log));
	}

	#[test]
	fn test_truncate_hash() {
		let hash = B256::repeat_byte(0xab);
		assert_eq!(truncate_hash(&hash), "abababab..");
	}
}
