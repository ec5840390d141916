//! Destination-chain fulfillment watch.
//!
//! A background task polls the inbox for the `Fulfillment` event of one
//! intent. It never gives up on its own: callers stop it with
//! [`FulfillmentWatch::unsubscribe`] or by dropping the watch.

use alloy::primitives::{Address, B256};
use alloy::sol_types::{SolEvent, SolValue};
use routes_delivery::ChainClient;
use routes_intent::abi::IInbox;
use routes_types::{truncate_hash, ChainLog, LogFilter, Result, RoutesError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Blocks re-scanned on every poll, for logs an RPC node indexes late.
/// The first match ends the watch, so a re-scan never delivers twice.
const RESCAN_BLOCKS: u64 = 3;

/// A matched fulfillment on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
	pub intent_hash: B256,
	pub transaction_hash: Option<B256>,
	pub block_number: Option<u64>,
	pub claimant: Option<Address>,
}

impl Fulfillment {
	fn from_log(intent_hash: B256, log: &ChainLog) -> Self {
		Self {
			intent_hash,
			transaction_hash: log.transaction_hash,
			block_number: log.block_number,
			claimant: Address::abi_decode(&log.data).ok(),
		}
	}
}

pub struct FulfillmentWatch {
	intent_hash: B256,
	result: oneshot::Receiver<Fulfillment>,
	handle: JoinHandle<()>,
}

impl FulfillmentWatch {
	/// Starts polling `inbox` for the fulfillment of `intent_hash`, beginning
	/// `lookback` blocks behind the current head.
	pub async fn start(
		client: Arc<dyn ChainClient>,
		inbox: Address,
		intent_hash: B256,
		lookback: u64,
		poll_interval: Duration,
	) -> Result<Self> {
		let head = client.block_number().await?;
		let from_block = head.saturating_sub(lookback);
		let filter = LogFilter::new(inbox, IInbox::Fulfillment::SIGNATURE_HASH)
			.with_topic1(intent_hash)
			.from_block(from_block);

		info!(
			chain_id = %client.chain_id(),
			intent_hash = %truncate_hash(&intent_hash),
			from_block,
			"Watching for fulfillment"
		);

		let (tx, result) = oneshot::channel();
		let handle = tokio::spawn(poll_fulfillment(
			client,
			filter,
			intent_hash,
			poll_interval,
			tx,
		));

		Ok(Self {
			intent_hash,
			result,
			handle,
		})
	}

	pub fn intent_hash(&self) -> B256 {
		self.intent_hash
	}

	/// Resolves once the fulfillment event shows up.
	pub async fn wait(mut self) -> Result<Fulfillment> {
		(&mut self.result)
			.await
			.map_err(|_| RoutesError::Chain("Fulfillment watch stopped".to_string()))
	}

	/// Stops the poller. Nothing is delivered afterwards.
	pub fn unsubscribe(self) {
		debug!(
			intent_hash = %truncate_hash(&self.intent_hash),
			"Fulfillment watch cancelled"
		);
	}
}

impl Drop for FulfillmentWatch {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

async fn poll_fulfillment(
	client: Arc<dyn ChainClient>,
	filter: LogFilter,
	intent_hash: B256,
	poll_interval: Duration,
	tx: oneshot::Sender<Fulfillment>,
) {
	let start_block = filter.from_block;
	let mut from_block = start_block;

	loop {
		match client.block_number().await {
			Ok(head) if head >= from_block => {
				let range = filter.clone().from_block(from_block).to_block(head);
				match client.get_logs(&range).await {
					Ok(logs) => {
						if let Some(log) = logs.iter().find(|log| filter.matches(log)) {
							let fulfillment = Fulfillment::from_log(intent_hash, log);
							info!(
								intent_hash = %truncate_hash(&intent_hash),
								block = ?fulfillment.block_number,
								"Intent fulfilled"
							);
							let _ = tx.send(fulfillment);
							return;
						}
						from_block = (head + 1).saturating_sub(RESCAN_BLOCKS).max(start_block);
					}
					Err(e) => warn!("Fulfillment log query failed, retrying: {}", e),
				}
			}
			Ok(_) => {}
			Err(e) => warn!("Failed to read block number, retrying: {}", e),
		}

		if tx.is_closed() {
			return;
		}
		tokio::time::sleep(poll_interval).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::MockChain;
	use alloy::primitives::{Bytes, U256};
	use routes_types::ChainId;

	const INBOX: Address = Address::repeat_byte(0x1b);

	fn fulfillment_log(intent_hash: B256, block: u64) -> ChainLog {
		ChainLog {
			address: INBOX,
			topics: vec![
				IInbox::Fulfillment::SIGNATURE_HASH,
				intent_hash,
				B256::from(U256::from(10)),
				B256::left_padding_from(Address::repeat_byte(0x77).as_slice()),
			],
			data: Bytes::from(Address::repeat_byte(0x55).abi_encode()),
			block_number: Some(block),
			transaction_hash: Some(B256::repeat_byte(0xfe)),
		}
	}

	#[tokio::test]
	async fn test_resolves_on_matching_event() {
		let hash = B256::repeat_byte(0x42);
		let chain = Arc::new(MockChain::new(ChainId::BASE).at_block(500));
		chain.push_log(fulfillment_log(B256::repeat_byte(0x01), 498));
		chain.push_log(fulfillment_log(hash, 499));

		let watch = FulfillmentWatch::start(
			chain.clone(),
			INBOX,
			hash,
			10,
			Duration::from_millis(5),
		)
		.await
		.unwrap();

		let fulfillment = watch.wait().await.unwrap();
		assert_eq!(fulfillment.intent_hash, hash);
		assert_eq!(fulfillment.block_number, Some(499));
		assert_eq!(fulfillment.transaction_hash, Some(B256::repeat_byte(0xfe)));
		assert_eq!(fulfillment.claimant, Some(Address::repeat_byte(0x55)));

		let queries = chain.log_queries();
		assert_eq!(queries[0].from_block, 490);
		assert_eq!(queries[0].topic1, Some(hash));
	}

	#[tokio::test]
	async fn test_lookback_saturates_at_genesis() {
		let hash = B256::repeat_byte(0x42);
		let chain = Arc::new(MockChain::new(ChainId::BASE).at_block(3));
		chain.push_log(fulfillment_log(hash, 2));

		let watch = FulfillmentWatch::start(chain.clone(), INBOX, hash, 10, Duration::from_millis(5))
			.await
			.unwrap();
		watch.wait().await.unwrap();

		assert_eq!(chain.log_queries()[0].from_block, 0);
	}

	#[tokio::test]
	async fn test_event_arriving_later() {
		let hash = B256::repeat_byte(0x42);
		let chain = Arc::new(MockChain::new(ChainId::BASE).at_block(100));

		let watch = FulfillmentWatch::start(chain.clone(), INBOX, hash, 10, Duration::from_millis(5))
			.await
			.unwrap();

		tokio::time::sleep(Duration::from_millis(20)).await;
		chain.set_block(101);
		chain.push_log(fulfillment_log(hash, 101));

		let fulfillment = tokio::time::timeout(Duration::from_secs(5), watch.wait())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(fulfillment.block_number, Some(101));
	}

	#[tokio::test]
	async fn test_late_indexed_log_is_found() {
		let hash = B256::repeat_byte(0x42);
		let chain = Arc::new(MockChain::new(ChainId::BASE).at_block(100));

		let watch = FulfillmentWatch::start(chain.clone(), INBOX, hash, 0, Duration::from_millis(5))
			.await
			.unwrap();

		// Block 100 was already scanned when its log shows up.
		tokio::time::sleep(Duration::from_millis(20)).await;
		chain.set_block(101);
		tokio::time::sleep(Duration::from_millis(20)).await;
		chain.push_log(fulfillment_log(hash, 100));

		let fulfillment = tokio::time::timeout(Duration::from_secs(5), watch.wait())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(fulfillment.block_number, Some(100));

		let queries = chain.log_queries();
		assert!(queries.iter().all(|q| q.from_block == 100));
		assert!(queries.iter().any(|q| q.to_block == Some(101)));
	}

	#[tokio::test]
	async fn test_unsubscribe_stops_polling() {
		let chain = Arc::new(MockChain::new(ChainId::BASE).at_block(100));
		let watch = FulfillmentWatch::start(
			chain.clone(),
			INBOX,
			B256::repeat_byte(0x42),
			10,
			Duration::from_millis(5),
		)
		.await
		.unwrap();

		tokio::time::sleep(Duration::from_millis(20)).await;
		watch.unsubscribe();
		tokio::time::sleep(Duration::from_millis(20)).await;
		let polls = chain.block_reads();
		tokio::time::sleep(Duration::from_millis(50)).await;

		assert!(polls > 1);
		assert_eq!(chain.block_reads(), polls);
	}
}
