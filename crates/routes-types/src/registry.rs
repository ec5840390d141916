//! Protocol contract address lookups.

use crate::ChainId;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attestation mechanisms a registry can resolve by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProverKind {
	HyperProver,
	MetaProver,
}

impl fmt::Display for ProverKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::HyperProver => write!(f, "HyperProver"),
			Self::MetaProver => write!(f, "MetaProver"),
		}
	}
}

/// Prover requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prover {
	HyperProver,
	MetaProver,
	/// A prover contract address, used without registry resolution.
	Explicit(Address),
}

impl From<ProverKind> for Prover {
	fn from(kind: ProverKind) -> Self {
		match kind {
			ProverKind::HyperProver => Prover::HyperProver,
			ProverKind::MetaProver => Prover::MetaProver,
		}
	}
}

impl std::str::FromStr for Prover {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HyperProver" | "hyper" => Ok(Prover::HyperProver),
			"MetaProver" | "meta" => Ok(Prover::MetaProver),
			other => other
				.parse::<Address>()
				.map(Prover::Explicit)
				.map_err(|_| format!("Unknown prover: {}", other)),
		}
	}
}

/// Read-only per-chain contract registry.
///
/// Lookups return `None` when a chain or contract is not configured; callers
/// decide which error that maps to.
pub trait AddressRegistry: Send + Sync {
	/// Intent source (publish-and-fund) contract on a source chain.
	fn intent_source(&self, chain: ChainId) -> Option<Address>;

	/// Inbox (settlement) contract on a destination chain.
	fn inbox(&self, chain: ChainId) -> Option<Address>;

	fn prover(&self, chain: ChainId, kind: ProverKind) -> Option<Address>;

	/// Shared allowance (Permit2) contract.
	fn permit2(&self, chain: ChainId) -> Option<Address>;

	/// Whether a token supports single-owner EIP-2612 permits.
	fn supports_native_permit(&self, chain: ChainId, token: &Address) -> bool;
}
