//! Solver quote types.

use crate::{sum_amounts, Call, TokenAmount};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the creator wants the intent published on the source chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentExecutionType {
	/// The creator sends the publish-and-fund transaction.
	SelfPublish,
	/// The creator signs permits and the quoting service publishes.
	Gasless,
	/// Anything the quoting service returned that this client cannot execute.
	Unknown(String),
}

impl IntentExecutionType {
	pub fn as_str(&self) -> &str {
		match self {
			Self::SelfPublish => "SELF_PUBLISH",
			Self::Gasless => "GASLESS",
			Self::Unknown(other) => other,
		}
	}

	pub fn is_supported(&self) -> bool {
		!matches!(self, Self::Unknown(_))
	}
}

impl From<String> for IntentExecutionType {
	fn from(value: String) -> Self {
		match value.as_str() {
			"SELF_PUBLISH" => Self::SelfPublish,
			"GASLESS" => Self::Gasless,
			_ => Self::Unknown(value),
		}
	}
}

impl From<&str> for IntentExecutionType {
	fn from(value: &str) -> Self {
		Self::from(value.to_string())
	}
}

impl From<IntentExecutionType> for String {
	fn from(value: IntentExecutionType) -> Self {
		value.as_str().to_string()
	}
}

impl fmt::Display for IntentExecutionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One solver counter-proposal for a single execution type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteEntry {
	pub intent_execution_type: IntentExecutionType,
	pub route_tokens: Vec<TokenAmount>,
	pub route_calls: Vec<Call>,
	pub reward_tokens: Vec<TokenAmount>,
	/// Native reward the solver asks for, zero for token-only intents.
	pub reward_native: U256,
	/// Unix seconds after which the proposal is void.
	pub expiry_time: u64,
	pub estimated_fulfill_time_sec: u64,
}

impl QuoteEntry {
	pub fn reward_token_total(&self) -> U256 {
		sum_amounts(&self.reward_tokens)
	}

	pub fn is_expired(&self, now: u64) -> bool {
		now >= self.expiry_time
	}
}

/// One solver's response to a quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverQuote {
	pub quote_id: String,
	pub solver_id: String,
	pub entries: Vec<QuoteEntry>,
}

impl SolverQuote {
	/// The entry for the given execution type, if the solver offered one.
	pub fn entry_for(&self, execution_type: &IntentExecutionType) -> Option<&QuoteEntry> {
		self.entries
			.iter()
			.find(|e| &e.intent_execution_type == execution_type)
	}

	/// The entry used for price comparison.
	pub fn primary_entry(&self) -> Option<&QuoteEntry> {
		self.entries.first()
	}
}
