//! Publish execution state.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a single publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishState {
	Idle,
	Approving,
	Submitting,
	AwaitingSourceConfirmation,
	AwaitingDestinationFulfillment,
	Fulfilled,
	/// Terminal failure, with the state the attempt was in when it failed.
	Errored {
		failed_in: Box<PublishState>,
		reason: String,
	},
}

impl PublishState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Fulfilled | Self::Errored { .. })
	}
}

impl fmt::Display for PublishState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Idle => write!(f, "idle"),
			Self::Approving => write!(f, "approving"),
			Self::Submitting => write!(f, "submitting"),
			Self::AwaitingSourceConfirmation => write!(f, "awaiting source confirmation"),
			Self::AwaitingDestinationFulfillment => write!(f, "awaiting destination fulfillment"),
			Self::Fulfilled => write!(f, "fulfilled"),
			Self::Errored { failed_in, reason } => {
				write!(f, "errored while {}: {}", failed_in, reason)
			}
		}
	}
}

/// Transaction bookkeeping for one publish attempt.
///
/// Preserved as-is when the attempt fails: approvals that already confirmed
/// are not rolled back, so the caller needs to see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionState {
	pub state: PublishState,
	/// Approval or permit-related transactions, in submission order.
	pub approval_tx_hashes: Vec<B256>,
	/// Publish-and-fund or gasless initiation transaction.
	pub publish_tx_hash: Option<B256>,
	/// Canonical intent hash recovered from the source-chain event.
	pub intent_hash: Option<B256>,
	/// Destination fulfillment transaction.
	pub fulfillment_tx_hash: Option<B256>,
}

impl Default for ExecutionState {
	fn default() -> Self {
		Self::new()
	}
}

impl ExecutionState {
	pub fn new() -> Self {
		Self {
			state: PublishState::Idle,
			approval_tx_hashes: Vec::new(),
			publish_tx_hash: None,
			intent_hash: None,
			fulfillment_tx_hash: None,
		}
	}

	pub fn transition(&mut self, next: PublishState) {
		self.state = next;
	}

	pub fn fail(&mut self, reason: impl Into<String>) {
		let failed_in = std::mem::replace(&mut self.state, PublishState::Idle);
		self.state = PublishState::Errored {
			failed_in: Box::new(failed_in),
			reason: reason.into(),
		};
	}

	pub fn is_fulfilled(&self) -> bool {
		self.state == PublishState::Fulfilled
			&& self.publish_tx_hash.is_some()
			&& self.fulfillment_tx_hash.is_some()
	}
}
