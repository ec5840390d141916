//! Configuration types for the routes client.

use crate::serde_helpers::{deserialize_chain_id_map, serialize_chain_id_map};
use alloy::primitives::address;
use routes_types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical Permit2 deployment, identical on every EVM chain it exists on.
pub const CANONICAL_PERMIT2: Address = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");

/// Complete client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutesConfig {
	pub client: ClientSettings,
	#[serde(default)]
	pub quoting: QuotingConfig,
	#[serde(default)]
	pub account: Option<AccountConfig>,
	#[serde(default)]
	pub publish: PublishConfig,
	/// Per-chain contract addresses and RPC endpoints
	#[serde(
		deserialize_with = "deserialize_chain_id_map",
		serialize_with = "serialize_chain_id_map"
	)]
	pub chains: HashMap<ChainId, ChainConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientSettings {
	/// Identifier the quoting service attributes requests to.
	pub dapp_id: String,
}

/// Quoting service endpoint and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuotingConfig {
	pub base_url: String,
	#[serde(default = "default_quotes_path")]
	pub quotes_path: String,
	#[serde(default = "default_reverse_quotes_path")]
	pub reverse_quotes_path: String,
	#[serde(default = "default_gasless_path")]
	pub gasless_path: String,
	/// Total attempts for quote requests, including the first.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	/// Fixed delay between quote attempts.
	#[serde(default = "default_retry_delay_ms")]
	pub retry_delay_ms: u64,
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
}

impl Default for QuotingConfig {
	fn default() -> Self {
		Self {
			base_url: "https://quotes.eco.com".to_string(),
			quotes_path: default_quotes_path(),
			reverse_quotes_path: default_reverse_quotes_path(),
			gasless_path: default_gasless_path(),
			max_attempts: default_max_attempts(),
			retry_delay_ms: default_retry_delay_ms(),
			timeout_secs: default_timeout_secs(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	pub private_key: String,
}

/// Publish and fulfillment tracking settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublishConfig {
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Interval between receipt and log polls.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// How far behind the current block the fulfillment watch starts.
	#[serde(default = "default_lookback_blocks")]
	pub fulfillment_lookback_blocks: u64,
	/// Approve the maximum amount to Permit2 instead of the amount required.
	#[serde(default)]
	pub unbounded_permit2_approval: bool,
	#[serde(default)]
	pub allow_partial: bool,
}

impl Default for PublishConfig {
	fn default() -> Self {
		Self {
			confirmations: default_confirmations(),
			poll_interval_ms: default_poll_interval_ms(),
			fulfillment_lookback_blocks: default_lookback_blocks(),
			unbounded_permit2_approval: false,
			allow_partial: false,
		}
	}
}

/// Chain-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Chain name for logging
	#[serde(default)]
	pub name: Option<String>,
	pub rpc_url: String,
	pub intent_source: Address,
	pub inbox: Address,
	#[serde(default)]
	pub hyper_prover: Option<Address>,
	#[serde(default)]
	pub meta_prover: Option<Address>,
	#[serde(default)]
	pub permit2: Option<Address>,
	/// Tokens known to implement EIP-2612 permits.
	#[serde(default)]
	pub stablecoins: Vec<Address>,
}

fn default_quotes_path() -> String {
	"/api/v2/quotes".to_string()
}

fn default_reverse_quotes_path() -> String {
	"/api/v2/quotes/reverse".to_string()
}

fn default_gasless_path() -> String {
	"/api/v1/intents/initiateGaslessIntent".to_string()
}

fn default_max_attempts() -> u32 {
	5
}

fn default_retry_delay_ms() -> u64 {
	1_000
}

fn default_timeout_secs() -> u64 {
	30
}

fn default_confirmations() -> u64 {
	1
}

fn default_poll_interval_ms() -> u64 {
	2_000
}

fn default_lookback_blocks() -> u64 {
	10
}
