//! Gasless authorization artifacts.
//!
//! Built immediately before a gasless initiation and never persisted. A
//! single authorization is scoped to one funder, one spender (the intent
//! vault) and one deadline.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// EIP-2612 permit signature for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit1Entry {
	pub token: Address,
	pub signature: Bytes,
	pub deadline: U256,
}

/// Allowance granted for one token inside a Permit2 message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitDetails {
	pub token: Address,
	pub amount: U256,
	pub expiration: U256,
	pub nonce: U256,
}

/// The signed Permit2 message, single or batch depending on token count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permit2Message {
	Single {
		details: PermitDetails,
		spender: Address,
		sig_deadline: U256,
	},
	Batch {
		details: Vec<PermitDetails>,
		spender: Address,
		sig_deadline: U256,
	},
}

impl Permit2Message {
	pub fn details(&self) -> Vec<&PermitDetails> {
		match self {
			Self::Single { details, .. } => vec![details],
			Self::Batch { details, .. } => details.iter().collect(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit2Bundle {
	/// The shared allowance contract the message is addressed to.
	pub permit_contract: Address,
	pub message: Permit2Message,
	pub signature: Bytes,
}

/// Everything the quoting service needs to move the funder's tokens.
///
/// Both artifacts are carried when an intent rewards native-permit tokens
/// and delegated-allowance tokens at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaslessAuthorization {
	pub permit: Vec<Permit1Entry>,
	pub permit2: Option<Permit2Bundle>,
}

impl GaslessAuthorization {
	pub fn is_empty(&self) -> bool {
		self.permit.is_empty() && self.permit2.is_none()
	}
}
