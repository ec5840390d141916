//! Funder accounts.
//!
//! The publish flow only needs two things from an account: its address, and
//! a signature over an EIP-712 digest. Transactions themselves are signed by
//! the delivery layer's wallet filler.

use alloy::primitives::{Address, Signature, B256};
use async_trait::async_trait;
use routes_types::RoutesError;
use thiserror::Error;

pub mod implementations;

pub use implementations::local::LocalWallet;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

impl From<AccountError> for RoutesError {
	fn from(err: AccountError) -> Self {
		RoutesError::Signing(err.to_string())
	}
}

#[async_trait]
pub trait AccountInterface: Send + Sync {
	fn address(&self) -> Address;

	/// Signs a 32-byte digest without any prefixing.
	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError>;
}
