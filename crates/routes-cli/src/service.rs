//! Wiring of configured services for the command handlers.

use anyhow::{Context, Result};
use routes_account::{AccountInterface, LocalWallet};
use routes_config::{ConfigRegistry, RoutesConfig};
use routes_core::PublishOrchestrator;
use routes_delivery::{AlloyChainClient, DeliveryService};
use routes_intent::IntentBuilder;
use routes_quote::QuotingClient;
use routes_types::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct RoutesClient {
	pub config: RoutesConfig,
	pub builder: IntentBuilder,
	pub quoting: Arc<QuotingClient>,
	registry: Arc<ConfigRegistry>,
	account: Option<Arc<LocalWallet>>,
	delivery: Arc<DeliveryService>,
}

impl RoutesClient {
	pub fn from_config(config: RoutesConfig) -> Result<Self> {
		let registry = Arc::new(ConfigRegistry::from_config(&config));
		let builder = IntentBuilder::new(registry.clone());

		let quoting = QuotingClient::http(config.quoting.clone(), config.client.dapp_id.clone())
			.context("Failed to create quoting client")?;

		let account = match &config.account {
			Some(account) => Some(Arc::new(
				LocalWallet::new(&account.private_key).context("Invalid account private key")?,
			)),
			None => None,
		};

		let poll_interval = Duration::from_millis(config.publish.poll_interval_ms);
		let mut delivery = DeliveryService::new();
		for (chain_id, chain) in &config.chains {
			let client = AlloyChainClient::new(
				&chain.rpc_url,
				*chain_id,
				account.as_ref().map(|a| a.ethereum_wallet()),
				poll_interval,
			)
			.with_context(|| format!("Failed to connect to chain {}", chain_id))?;
			delivery.register(Arc::new(client));
		}

		info!(
			chains = config.chains.len(),
			account = account.is_some(),
			"Routes client ready"
		);

		Ok(Self {
			config,
			builder,
			quoting: Arc::new(quoting),
			registry,
			account,
			delivery: Arc::new(delivery),
		})
	}

	pub fn account(&self) -> Result<Arc<LocalWallet>> {
		self.account
			.clone()
			.context("No account configured; set [account] private_key or ROUTES_PRIVATE_KEY")
	}

	pub fn account_address(&self) -> Option<Address> {
		self.account.as_ref().map(|a| a.address())
	}

	pub fn orchestrator(&self) -> Result<PublishOrchestrator> {
		let account = self.account()?;
		debug!(funder = %account.address(), "Creating publish orchestrator");

		Ok(PublishOrchestrator::new(
			self.delivery.clone(),
			self.quoting.clone(),
			account,
			self.registry.clone(),
			self.config.publish.clone(),
		))
	}
}
