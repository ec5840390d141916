//! Error types for the routes client.

use crate::{ChainId, ProverKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoutesError>;

/// Failure of a single HTTP exchange with the quoting service.
///
/// Kept `Clone + PartialEq` so the retry loop can hand back the final
/// failure exactly as it was observed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	#[error("Request failed: {0}")]
	Request(String),

	#[error("Request timed out")]
	Timeout,

	#[error("HTTP {status}: {body}")]
	Status { status: u16, body: String },

	#[error("Failed to decode response: {0}")]
	Decode(String),
}

#[derive(Error, Debug)]
pub enum RoutesError {
	#[error("Validation error: {0}")]
	Validation(String),

	#[error("No {prover_kind} prover configured on chain {chain}")]
	NoProver { chain: ChainId, prover_kind: ProverKind },

	#[error("No {contract} contract configured on chain {chain}")]
	NoContract { chain: ChainId, contract: String },

	#[error("Invalid quote: {0}")]
	InvalidQuote(String),

	#[error("No quotes to select from")]
	EmptyQuoteSet,

	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),

	#[error("Unsupported execution type: {0}")]
	UnsupportedExecutionType(String),

	#[error("Vault address has not been resolved")]
	VaultUnavailable,

	#[error("Event {event} not found in transaction {tx_hash}")]
	EventNotFound { event: String, tx_hash: String },

	#[error("Signing error: {0}")]
	Signing(String),

	#[error("Chain error: {0}")]
	Chain(String),

	#[error("Configuration error: {0}")]
	Config(String),
}

impl RoutesError {
	pub fn validation(reason: impl Into<String>) -> Self {
		Self::Validation(reason.into())
	}
}
