//! Address registry backed by the `[chains]` configuration.

use crate::types::{ChainConfig, RoutesConfig, CANONICAL_PERMIT2};
use routes_types::{Address, AddressRegistry, ChainId, ProverKind};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConfigRegistry {
	chains: HashMap<ChainId, ChainConfig>,
}

impl ConfigRegistry {
	pub fn new(chains: HashMap<ChainId, ChainConfig>) -> Self {
		Self { chains }
	}

	pub fn from_config(config: &RoutesConfig) -> Self {
		Self::new(config.chains.clone())
	}

	pub fn chain(&self, chain: ChainId) -> Option<&ChainConfig> {
		self.chains.get(&chain)
	}
}

impl AddressRegistry for ConfigRegistry {
	fn intent_source(&self, chain: ChainId) -> Option<Address> {
		self.chain(chain).map(|c| c.intent_source)
	}

	fn inbox(&self, chain: ChainId) -> Option<Address> {
		self.chain(chain).map(|c| c.inbox)
	}

	fn prover(&self, chain: ChainId, kind: ProverKind) -> Option<Address> {
		let config = self.chain(chain)?;
		match kind {
			ProverKind::HyperProver => config.hyper_prover,
			ProverKind::MetaProver => config.meta_prover,
		}
	}

	/// Falls back to the canonical deployment for configured chains.
	fn permit2(&self, chain: ChainId) -> Option<Address> {
		self.chain(chain)
			.map(|c| c.permit2.unwrap_or(CANONICAL_PERMIT2))
	}

	fn supports_native_permit(&self, chain: ChainId, token: &Address) -> bool {
		self.chain(chain)
			.map_or(false, |c| c.stablecoins.contains(token))
	}
}
