//! Intent value types.
//!
//! An intent pairs a [`Route`] (what must happen on the destination chain)
//! with a [`Reward`] (what the creator pays on the source chain). Intents are
//! values: adjusting one produces a new intent that shares the route.

use crate::ChainId;
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A token address together with an amount of that token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
	pub token: Address,
	pub amount: U256,
}

impl TokenAmount {
	pub fn new(token: Address, amount: U256) -> Self {
		Self { token, amount }
	}
}

/// One destination-chain action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
	pub target: Address,
	pub data: Bytes,
	pub value: U256,
}

/// Destination side of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
	/// Collision-avoidance nonce.
	pub salt: B256,
	pub source: ChainId,
	pub destination: ChainId,
	/// Settlement contract on the destination chain.
	pub inbox: Address,
	/// Tokens the solver must deliver on the destination chain.
	pub tokens: Vec<TokenAmount>,
	pub calls: Vec<Call>,
}

/// Source side of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reward {
	pub creator: Address,
	pub prover: Address,
	/// Absolute expiry, Unix seconds.
	pub deadline: u64,
	pub native_value: U256,
	pub tokens: Vec<TokenAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent {
	pub route: Arc<Route>,
	pub reward: Reward,
}

impl Intent {
	pub fn new(route: Route, reward: Reward) -> Self {
		Self {
			route: Arc::new(route),
			reward,
		}
	}

	pub fn source(&self) -> ChainId {
		self.route.source
	}

	pub fn destination(&self) -> ChainId {
		self.route.destination
	}

	/// Returns a copy with the reward token list replaced. The route is shared.
	pub fn with_reward_tokens(&self, tokens: Vec<TokenAmount>) -> Self {
		Self {
			route: Arc::clone(&self.route),
			reward: Reward {
				tokens,
				..self.reward.clone()
			},
		}
	}

	/// Sum of all reward token amounts, saturating.
	pub fn reward_token_total(&self) -> U256 {
		sum_amounts(&self.reward.tokens)
	}

	/// Sum of all route token amounts, saturating.
	pub fn route_token_total(&self) -> U256 {
		sum_amounts(&self.route.tokens)
	}

	/// Whether the reward covers what the route asks the solver to deliver.
	pub fn is_solvent(&self) -> bool {
		self.reward_token_total() >= self.route_token_total()
	}
}

pub fn sum_amounts(tokens: &[TokenAmount]) -> U256 {
	tokens
		.iter()
		.fold(U256::ZERO, |acc, t| acc.saturating_add(t.amount))
}
