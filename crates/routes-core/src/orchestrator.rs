//! Publish state machine.
//!
//! One [`PublishOrchestrator::publish`] call drives a single attempt from
//! `Idle` to `AwaitingSourceConfirmation`, one transition function per state.
//! [`PublishOrchestrator::track_fulfillment`] then waits on the destination
//! chain. Any failure moves the attempt to `Errored` and hands the partial
//! [`ExecutionState`] back inside the [`PublishError`].

use crate::lifecycle::advance;
use crate::watch::FulfillmentWatch;
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use futures::future::try_join_all;
use routes_account::AccountInterface;
use routes_config::PublishConfig;
use routes_delivery::{ChainClient, DeliveryService};
use routes_intent::abi::IIntentSource;
use routes_intent::codec::{intent_hash, sol_intent};
use routes_permit::abi::IERC20;
use routes_permit::{AuthorizerSettings, GaslessAuthorizer};
use routes_quote::{GaslessInitiation, QuotingClient};
use routes_types::{
	truncate_hash, AddressRegistry, ChainId, ExecutionState, GaslessAuthorization, Intent,
	IntentExecutionType, PublishState, Result, RoutesError, SolverQuote, Transaction,
	TransactionReceipt,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// A failed attempt together with everything it did before failing.
///
/// Confirmed approvals are not rolled back; `execution` lists them.
#[derive(Debug, Error)]
#[error("Publish failed: {error}")]
pub struct PublishError {
	#[source]
	pub error: RoutesError,
	pub execution: ExecutionState,
}

pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Quote and solver the quoting service should attribute a gasless intent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteReference {
	pub quote_id: String,
	pub solver_id: String,
}

impl From<&SolverQuote> for QuoteReference {
	fn from(quote: &SolverQuote) -> Self {
		Self {
			quote_id: quote.quote_id.clone(),
			solver_id: quote.solver_id.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
	/// The intent, already adjusted by the selected quote.
	pub intent: Intent,
	pub execution_type: IntentExecutionType,
	pub quote: Option<QuoteReference>,
	/// Permit spender for gasless publishing.
	pub vault_address: Option<Address>,
}

impl PublishRequest {
	pub fn self_publish(intent: Intent) -> Self {
		Self {
			intent,
			execution_type: IntentExecutionType::SelfPublish,
			quote: None,
			vault_address: None,
		}
	}

	pub fn gasless(intent: Intent, quote: &SolverQuote, vault_address: Option<Address>) -> Self {
		Self {
			intent,
			execution_type: IntentExecutionType::Gasless,
			quote: Some(quote.into()),
			vault_address,
		}
	}
}

enum PublishPath<'a> {
	SelfPublish,
	Gasless {
		quote: &'a QuoteReference,
		vault: Address,
	},
}

pub struct PublishOrchestrator {
	delivery: Arc<DeliveryService>,
	quoting: Arc<QuotingClient>,
	account: Arc<dyn AccountInterface>,
	registry: Arc<dyn AddressRegistry>,
	config: PublishConfig,
}

impl PublishOrchestrator {
	pub fn new(
		delivery: Arc<DeliveryService>,
		quoting: Arc<QuotingClient>,
		account: Arc<dyn AccountInterface>,
		registry: Arc<dyn AddressRegistry>,
		config: PublishConfig,
	) -> Self {
		Self {
			delivery,
			quoting,
			account,
			registry,
			config,
		}
	}

	/// Publishes the intent on its source chain and recovers its hash.
	///
	/// Returns in `AwaitingSourceConfirmation` with `publish_tx_hash` and
	/// `intent_hash` set.
	pub async fn publish(&self, request: &PublishRequest) -> PublishResult<ExecutionState> {
		let mut execution = ExecutionState::new();
		match self.run(request, &mut execution).await {
			Ok(()) => Ok(execution),
			Err(error) => Err(abort(error, execution)),
		}
	}

	/// Waits for the destination chain to fulfill a published intent.
	///
	/// Dropping the returned future cancels the watch.
	pub async fn track_fulfillment(
		&self,
		intent: &Intent,
		mut execution: ExecutionState,
	) -> PublishResult<ExecutionState> {
		match self.await_fulfillment(intent, &mut execution).await {
			Ok(()) => Ok(execution),
			Err(error) => Err(abort(error, execution)),
		}
	}

	pub async fn publish_and_track(
		&self,
		request: &PublishRequest,
	) -> PublishResult<ExecutionState> {
		let execution = self.publish(request).await?;
		self.track_fulfillment(&request.intent, execution).await
	}

	/// Starts a cancellable watch for the intent's destination fulfillment.
	pub async fn watch_fulfillment(
		&self,
		intent: &Intent,
		intent_hash: B256,
	) -> Result<FulfillmentWatch> {
		let client = self.delivery.client(intent.destination())?;
		FulfillmentWatch::start(
			client,
			intent.route.inbox,
			intent_hash,
			self.config.fulfillment_lookback_blocks,
			Duration::from_millis(self.config.poll_interval_ms),
		)
		.await
	}

	/// Reads the intent's deterministic vault address from the intent source.
	pub async fn resolve_vault_address(&self, intent: &Intent) -> Result<Address> {
		let chain = intent.source();
		let intent_source = self.intent_source(chain)?;
		let data = IIntentSource::intentVaultAddressCall {
			intent: sol_intent(intent),
		}
		.abi_encode();

		let output = self.delivery.call(chain, intent_source, data.into()).await?;
		let vault = Address::abi_decode(&output)
			.map_err(|e| RoutesError::Chain(format!("Undecodable vault address: {}", e)))?;

		if vault.is_zero() {
			return Err(RoutesError::VaultUnavailable);
		}
		debug!(chain_id = %chain, vault = %vault, "Resolved vault address");
		Ok(vault)
	}

	async fn run(&self, request: &PublishRequest, execution: &mut ExecutionState) -> Result<()> {
		let path = publish_path(request)?;
		let intent = &request.intent;
		let intent_source = self.intent_source(intent.source())?;
		let source = self.delivery.client(intent.source())?;

		let authorization = self
			.approve(&path, &source, intent, intent_source, execution)
			.await?;
		let tx_hash = self
			.submit(&path, &source, intent, intent_source, authorization, execution)
			.await?;
		self.confirm_source(&path, &source, intent, intent_source, tx_hash, execution)
			.await
	}

	/// `Idle -> Approving`: token approvals, or signed permits when gasless.
	async fn approve(
		&self,
		path: &PublishPath<'_>,
		source: &Arc<dyn ChainClient>,
		intent: &Intent,
		intent_source: Address,
		execution: &mut ExecutionState,
	) -> Result<Option<GaslessAuthorization>> {
		advance(execution, PublishState::Approving)?;

		match path {
			PublishPath::SelfPublish => {
				self.approve_reward_tokens(source, intent, intent_source, execution)
					.await?;
				Ok(None)
			}
			PublishPath::Gasless { vault, .. } => {
				let authorizer = GaslessAuthorizer::new(
					source.clone(),
					self.account.clone(),
					self.registry.clone(),
					AuthorizerSettings {
						unbounded_permit2_approval: self.config.unbounded_permit2_approval,
						confirmations: self.config.confirmations,
					},
				);
				let authorization = authorizer
					.authorize(
						&intent.reward.tokens,
						self.account.address(),
						*vault,
						U256::from(intent.reward.deadline),
						&mut execution.approval_tx_hashes,
					)
					.await?;
				Ok(Some(authorization))
			}
		}
	}

	/// Approvals go out one at a time so the wallet's nonces stay ordered,
	/// then all confirmations are awaited together.
	async fn approve_reward_tokens(
		&self,
		source: &Arc<dyn ChainClient>,
		intent: &Intent,
		intent_source: Address,
		execution: &mut ExecutionState,
	) -> Result<()> {
		let mut pending = Vec::with_capacity(intent.reward.tokens.len());
		for token in &intent.reward.tokens {
			let data = IERC20::approveCall {
				spender: intent_source,
				amount: token.amount,
			}
			.abi_encode();
			let hash = source
				.submit(Transaction::call(source.chain_id(), token.token, data))
				.await?;

			debug!(token = %token.token, tx_hash = %truncate_hash(&hash), "Approval submitted");
			execution.approval_tx_hashes.push(hash);
			pending.push(hash);
		}

		let confirmations = self.config.confirmations;
		let receipts = try_join_all(
			pending
				.iter()
				.map(|hash| source.wait_for_confirmation(*hash, confirmations)),
		)
		.await?;

		if let Some(receipt) = receipts.iter().find(|r| !r.success) {
			return Err(RoutesError::Chain(format!(
				"Approval transaction {} reverted",
				receipt.hash
			)));
		}

		info!(count = receipts.len(), "Reward token approvals confirmed");
		Ok(())
	}

	/// `Approving -> Submitting`: publish-and-fund, or gasless initiation.
	async fn submit(
		&self,
		path: &PublishPath<'_>,
		source: &Arc<dyn ChainClient>,
		intent: &Intent,
		intent_source: Address,
		authorization: Option<GaslessAuthorization>,
		execution: &mut ExecutionState,
	) -> Result<B256> {
		advance(execution, PublishState::Submitting)?;

		let tx_hash = match path {
			PublishPath::SelfPublish => {
				let data = IIntentSource::publishAndFundCall {
					intent: sol_intent(intent),
					allowPartial: self.config.allow_partial,
				}
				.abi_encode();

				let mut tx = Transaction::call(source.chain_id(), intent_source, data);
				if !intent.reward.native_value.is_zero() {
					tx = tx.with_value(intent.reward.native_value);
				}
				source.submit(tx).await?
			}
			PublishPath::Gasless { quote, vault } => {
				let initiation = GaslessInitiation {
					quote_id: quote.quote_id.clone(),
					solver_id: quote.solver_id.clone(),
					funder: self.account.address(),
					vault_address: *vault,
					intent: intent.clone(),
					allow_partial: Some(self.config.allow_partial),
					authorization,
				};
				self.quoting.initiate_gasless_intent(&initiation).await?
			}
		};

		info!(tx_hash = %truncate_hash(&tx_hash), "Intent submitted");
		execution.publish_tx_hash = Some(tx_hash);
		Ok(tx_hash)
	}

	/// `Submitting -> AwaitingSourceConfirmation`: waits for the receipt and
	/// reads the intent hash from the emitted event.
	async fn confirm_source(
		&self,
		path: &PublishPath<'_>,
		source: &Arc<dyn ChainClient>,
		intent: &Intent,
		intent_source: Address,
		tx_hash: B256,
		execution: &mut ExecutionState,
	) -> Result<()> {
		advance(execution, PublishState::AwaitingSourceConfirmation)?;

		let receipt = source
			.wait_for_confirmation(tx_hash, self.config.confirmations)
			.await?;
		if !receipt.success {
			return Err(RoutesError::Chain(format!(
				"Publish transaction {} reverted",
				tx_hash
			)));
		}

		let hash = match path {
			PublishPath::SelfPublish => intent_created_hash(&receipt, intent_source)?,
			PublishPath::Gasless { .. } => intent_funded_hash(&receipt, intent_source)?,
		};

		let expected = intent_hash(intent);
		if hash != expected {
			warn!(
				event = %hash,
				computed = %expected,
				"Emitted intent hash differs from the locally computed one"
			);
		}

		info!(
			intent_hash = %truncate_hash(&hash),
			block = receipt.block_number,
			"Intent published"
		);
		execution.intent_hash = Some(hash);
		Ok(())
	}

	/// `AwaitingSourceConfirmation -> AwaitingDestinationFulfillment -> Fulfilled`.
	async fn await_fulfillment(
		&self,
		intent: &Intent,
		execution: &mut ExecutionState,
	) -> Result<()> {
		let intent_hash = execution.intent_hash.ok_or_else(|| {
			RoutesError::validation("Intent hash is unknown until the intent is published")
		})?;
		advance(execution, PublishState::AwaitingDestinationFulfillment)?;

		let fulfillment = self.watch_fulfillment(intent, intent_hash).await?.wait().await?;
		let tx_hash = fulfillment.transaction_hash.ok_or_else(|| {
			RoutesError::Chain("Fulfillment log carries no transaction hash".to_string())
		})?;

		execution.fulfillment_tx_hash = Some(tx_hash);
		advance(execution, PublishState::Fulfilled)
	}

	fn intent_source(&self, chain: ChainId) -> Result<Address> {
		self.registry
			.intent_source(chain)
			.ok_or_else(|| RoutesError::NoContract {
				chain,
				contract: "intent source".to_string(),
			})
	}
}

/// Everything checked here fails before any network call.
fn publish_path(request: &PublishRequest) -> Result<PublishPath<'_>> {
	let intent = &request.intent;
	if !intent.is_solvent() {
		return Err(RoutesError::validation(format!(
			"Reward tokens total {} does not cover route tokens total {}",
			intent.reward_token_total(),
			intent.route_token_total()
		)));
	}

	match &request.execution_type {
		IntentExecutionType::SelfPublish => Ok(PublishPath::SelfPublish),
		IntentExecutionType::Gasless => {
			let vault = request
				.vault_address
				.filter(|vault| !vault.is_zero())
				.ok_or(RoutesError::VaultUnavailable)?;
			let quote = request.quote.as_ref().ok_or_else(|| {
				RoutesError::validation("Gasless publishing requires a selected quote")
			})?;
			Ok(PublishPath::Gasless { quote, vault })
		}
		IntentExecutionType::Unknown(other) => {
			Err(RoutesError::UnsupportedExecutionType(other.clone()))
		}
	}
}

fn abort(error: RoutesError, mut execution: ExecutionState) -> PublishError {
	error!(state = %execution.state, "Publish attempt failed: {}", error);
	execution.fail(error.to_string());
	PublishError { error, execution }
}

/// Intent hash from an `IntentCreated` log emitted by `intent_source`, where
/// it is the first topic.
pub fn intent_created_hash(receipt: &TransactionReceipt, intent_source: Address) -> Result<B256> {
	receipt
		.logs
		.iter()
		.filter(|log| {
			log.address == intent_source
				&& log.is_event(IIntentSource::IntentCreated::SIGNATURE_HASH)
		})
		.find_map(|log| log.topic1())
		.ok_or_else(|| event_not_found("IntentCreated", receipt))
}

/// Intent hash from an `IntentFunded` log emitted by `intent_source`, indexed
/// or in the first data word.
pub fn intent_funded_hash(receipt: &TransactionReceipt, intent_source: Address) -> Result<B256> {
	receipt
		.logs
		.iter()
		.filter(|log| {
			log.address == intent_source
				&& log.is_event(IIntentSource::IntentFunded::SIGNATURE_HASH)
		})
		.find_map(|log| {
			log.topic1()
				.or_else(|| (log.data.len() >= 32).then(|| B256::from_slice(&log.data[..32])))
		})
		.ok_or_else(|| event_not_found("IntentFunded", receipt))
}

fn event_not_found(event: &str, receipt: &TransactionReceipt) -> RoutesError {
	RoutesError::EventNotFound {
		event: event.to_string(),
		tx_hash: receipt.hash.to_string(),
	}
}
