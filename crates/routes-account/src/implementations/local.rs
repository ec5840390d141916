//! Local private-key wallet.

use crate::{AccountError, AccountInterface};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Signature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use tracing::debug;

/// Wallet holding a private key in memory.
///
/// Also hands out an [`EthereumWallet`] so the delivery layer signs
/// transactions with the same key that signs permits.
#[derive(Clone)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl std::fmt::Debug for LocalWallet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocalWallet")
			.field("address", &self.signer.address())
			.finish()
	}
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded private key, with or without `0x`.
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = private_key_hex.trim();
		let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

		if key_without_prefix.len() != 64 {
			return Err(AccountError::InvalidKey(
				"Private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}

		if hex::decode(key_without_prefix).is_err() {
			return Err(AccountError::InvalidKey(
				"Private key must be valid hexadecimal".to_string(),
			));
		}

		let signer = key_without_prefix
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}

	pub fn ethereum_wallet(&self) -> EthereumWallet {
		EthereumWallet::from(self.signer.clone())
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		debug!(signer = %self.signer.address(), "Signing digest");
		self.signer
			.sign_hash(hash)
			.await
			.map_err(|e| AccountError::SigningFailed(format!("Failed to sign digest: {}", e)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;

	// Well-known first development account.
	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_address_from_key() {
		let wallet = LocalWallet::new(DEV_KEY).unwrap();
		assert_eq!(
			wallet.address(),
			address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
		);

		let without_prefix = LocalWallet::new(DEV_KEY.trim_start_matches("0x")).unwrap();
		assert_eq!(without_prefix.address(), wallet.address());
	}

	#[test]
	fn test_rejects_bad_keys() {
		assert!(matches!(
			LocalWallet::new("0x1234"),
			Err(AccountError::InvalidKey(_))
		));
		assert!(matches!(
			LocalWallet::new(&format!("0x{}", "zz".repeat(32))),
			Err(AccountError::InvalidKey(_))
		));
	}

	#[tokio::test]
	async fn test_signature_recovers_to_signer() {
		let wallet = LocalWallet::new(DEV_KEY).unwrap();
		let digest = B256::repeat_byte(0x42);

		let signature = wallet.sign_hash(&digest).await.unwrap();
		assert_eq!(signature.as_bytes().len(), 65);
		assert_eq!(
			signature.recover_address_from_prehash(&digest).unwrap(),
			wallet.address()
		);
	}
}
