//! Signed authorizations that let the quoting service move reward tokens.
//!
//! Tokens listed as native-permit capable get one EIP-2612 signature each.
//! Every other token is routed through Permit2: the funder approves Permit2
//! on-chain where the current allowance falls short, then signs a single or
//! batch permit covering all of them. When both kinds are present both
//! artifacts are returned.

use crate::abi;
use alloy::primitives::aliases::{U160, U48};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{Eip712Domain, SolCall, SolStruct, SolType, SolValue};
use routes_account::AccountInterface;
use routes_delivery::ChainClient;
use routes_types::{
	truncate_hash, AddressRegistry, ChainId, GaslessAuthorization, Permit1Entry, Permit2Bundle,
	Permit2Message, PermitDetails, Result, RoutesError, TokenAmount, Transaction,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Permit version assumed when a token does not expose `version()`.
const DEFAULT_PERMIT_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizerSettings {
	/// Approve `U256::MAX` to Permit2 instead of the amount required.
	pub unbounded_permit2_approval: bool,
	pub confirmations: u64,
}

impl Default for AuthorizerSettings {
	fn default() -> Self {
		Self {
			unbounded_permit2_approval: false,
			confirmations: 1,
		}
	}
}

pub struct GaslessAuthorizer {
	chain: Arc<dyn ChainClient>,
	account: Arc<dyn AccountInterface>,
	registry: Arc<dyn AddressRegistry>,
	settings: AuthorizerSettings,
}

impl GaslessAuthorizer {
	/// `chain` must be the client for the intent's source chain.
	pub fn new(
		chain: Arc<dyn ChainClient>,
		account: Arc<dyn AccountInterface>,
		registry: Arc<dyn AddressRegistry>,
		settings: AuthorizerSettings,
	) -> Self {
		Self {
			chain,
			account,
			registry,
			settings,
		}
	}

	/// Builds and signs permits for `tokens`, spendable by `spender` until
	/// `deadline`.
	///
	/// Any failure aborts the whole run and nothing signed is returned.
	/// Permit2 approvals are pushed onto `approvals` as soon as they confirm,
	/// so the caller still sees them when a later step fails.
	pub async fn authorize(
		&self,
		tokens: &[TokenAmount],
		funder: Address,
		spender: Address,
		deadline: U256,
		approvals: &mut Vec<B256>,
	) -> Result<GaslessAuthorization> {
		if funder != self.account.address() {
			return Err(RoutesError::Signing(format!(
				"Funder {} is not the signing account {}",
				funder,
				self.account.address()
			)));
		}

		let chain_id = self.chain.chain_id();
		let (native, delegated): (Vec<&TokenAmount>, Vec<&TokenAmount>) = tokens
			.iter()
			.partition(|t| self.registry.supports_native_permit(chain_id, &t.token));

		debug!(
			chain_id = %chain_id,
			native = native.len(),
			delegated = delegated.len(),
			"Authorizing reward tokens"
		);

		let mut authorization = GaslessAuthorization::default();

		for token in native {
			let entry = self
				.sign_native_permit(token, funder, spender, deadline)
				.await?;
			authorization.permit.push(entry);
		}

		if !delegated.is_empty() {
			let permit2 = self
				.registry
				.permit2(chain_id)
				.ok_or_else(|| RoutesError::NoContract {
					chain: chain_id,
					contract: "permit2".to_string(),
				})?;

			// Permit2 packs amounts into uint160 and expirations into uint48.
			to_u48("expiration", deadline)?;
			for token in &delegated {
				to_u160(token.amount)?;
			}

			for token in &delegated {
				if let Some(hash) = self.ensure_permit2_allowance(token, funder, permit2).await? {
					approvals.push(hash);
				}
			}

			let bundle = self
				.sign_permit2(&delegated, funder, spender, permit2, deadline)
				.await?;
			authorization.permit2 = Some(bundle);
		}

		info!(
			chain_id = %chain_id,
			permits = authorization.permit.len(),
			permit2 = authorization.permit2.is_some(),
			"Gasless authorization signed"
		);

		Ok(authorization)
	}

	async fn sign_native_permit(
		&self,
		token: &TokenAmount,
		owner: Address,
		spender: Address,
		deadline: U256,
	) -> Result<Permit1Entry> {
		let nonce: U256 = self
			.read(token.token, abi::IERC20Permit::noncesCall { owner }.abi_encode())
			.await?;
		let name: String = self
			.read(token.token, abi::IERC20Permit::nameCall {}.abi_encode())
			.await?;
		let version = match self
			.read::<String>(token.token, abi::IERC20Permit::versionCall {}.abi_encode())
			.await
		{
			Ok(version) => version,
			Err(e) => {
				debug!(token = %token.token, "No permit version ({}), using default", e);
				DEFAULT_PERMIT_VERSION.to_string()
			}
		};

		let permit = abi::Permit {
			owner,
			spender,
			value: token.amount,
			nonce,
			deadline,
		};
		let domain = permit_domain(name, version, self.chain.chain_id(), token.token);
		let signature = self.sign(permit.eip712_signing_hash(&domain)).await?;

		Ok(Permit1Entry {
			token: token.token,
			signature,
			deadline,
		})
	}

	/// Approves Permit2 for `token` if the current allowance is short.
	async fn ensure_permit2_allowance(
		&self,
		token: &TokenAmount,
		owner: Address,
		permit2: Address,
	) -> Result<Option<B256>> {
		let allowance: U256 = self
			.read(
				token.token,
				abi::IERC20::allowanceCall {
					owner,
					spender: permit2,
				}
				.abi_encode(),
			)
			.await?;

		if allowance >= token.amount {
			return Ok(None);
		}

		let amount = if self.settings.unbounded_permit2_approval {
			U256::MAX
		} else {
			token.amount
		};

		let data = abi::IERC20::approveCall {
			spender: permit2,
			amount,
		}
		.abi_encode();
		let hash = self
			.chain
			.submit(Transaction::call(self.chain.chain_id(), token.token, data))
			.await?;

		let receipt = self
			.chain
			.wait_for_confirmation(hash, self.settings.confirmations)
			.await?;
		if !receipt.success {
			warn!(token = %token.token, tx_hash = %truncate_hash(&hash), "Permit2 approval reverted");
			return Err(RoutesError::Chain(format!(
				"Permit2 approval for {} reverted in {}",
				token.token, hash
			)));
		}

		info!(
			token = %token.token,
			tx_hash = %truncate_hash(&hash),
			"Approved Permit2"
		);
		Ok(Some(hash))
	}

	async fn sign_permit2(
		&self,
		tokens: &[&TokenAmount],
		owner: Address,
		spender: Address,
		permit2: Address,
		deadline: U256,
	) -> Result<Permit2Bundle> {
		let mut details = Vec::with_capacity(tokens.len());
		for token in tokens {
			let (_, _, nonce): (U256, U256, U256) = self
				.read(
					permit2,
					abi::IPermit2::allowanceCall {
						user: owner,
						token: token.token,
						spender,
					}
					.abi_encode(),
				)
				.await?;

			details.push(PermitDetails {
				token: token.token,
				amount: token.amount,
				expiration: deadline,
				nonce,
			});
		}

		let domain = permit2_domain(self.chain.chain_id(), permit2);

		let (message, digest) = if details.len() == 1 {
			let single = details.remove(0);
			let typed = abi::PermitSingle {
				details: sol_details(&single)?,
				spender,
				sigDeadline: deadline,
			};
			let digest = typed.eip712_signing_hash(&domain);
			let message = Permit2Message::Single {
				details: single,
				spender,
				sig_deadline: deadline,
			};
			(message, digest)
		} else {
			let typed = abi::PermitBatch {
				details: details
					.iter()
					.map(sol_details)
					.collect::<Result<Vec<_>>>()?,
				spender,
				sigDeadline: deadline,
			};
			let digest = typed.eip712_signing_hash(&domain);
			let message = Permit2Message::Batch {
				details,
				spender,
				sig_deadline: deadline,
			};
			(message, digest)
		};

		let signature = self.sign(digest).await?;

		Ok(Permit2Bundle {
			permit_contract: permit2,
			message,
			signature,
		})
	}

	async fn read<T>(&self, to: Address, calldata: Vec<u8>) -> Result<T>
	where
		T: SolValue + From<<T::SolType as SolType>::RustType>,
	{
		let output = self.chain.call(to, Bytes::from(calldata)).await?;
		T::abi_decode(&output)
			.map_err(|e| RoutesError::Chain(format!("Undecodable response from {}: {}", to, e)))
	}

	async fn sign(&self, digest: B256) -> Result<Bytes> {
		let signature = self.account.sign_hash(&digest).await?;
		Ok(Bytes::copy_from_slice(&signature.as_bytes()))
	}
}

pub fn permit_domain(name: String, version: String, chain: ChainId, token: Address) -> Eip712Domain {
	Eip712Domain::new(
		Some(Cow::Owned(name)),
		Some(Cow::Owned(version)),
		Some(U256::from(chain.0)),
		Some(token),
		None,
	)
}

pub fn permit2_domain(chain: ChainId, permit2: Address) -> Eip712Domain {
	Eip712Domain::new(
		Some(Cow::Borrowed("Permit2")),
		None,
		Some(U256::from(chain.0)),
		Some(permit2),
		None,
	)
}

fn sol_details(details: &PermitDetails) -> Result<abi::PermitDetails> {
	Ok(abi::PermitDetails {
		token: details.token,
		amount: to_u160(details.amount)?,
		expiration: to_u48("expiration", details.expiration)?,
		nonce: to_u48("nonce", details.nonce)?,
	})
}

fn to_u160(amount: U256) -> Result<U160> {
	U160::checked_from_limbs_slice(amount.as_limbs()).ok_or_else(|| {
		RoutesError::validation(format!("Permit2 amount {} exceeds uint160", amount))
	})
}

fn to_u48(field: &str, value: U256) -> Result<U48> {
	U48::checked_from_limbs_slice(value.as_limbs()).ok_or_else(|| {
		RoutesError::validation(format!("Permit2 {} {} exceeds uint48", field, value))
	})
}
