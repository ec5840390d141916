//! Configuration loading for the routes client.
//!
//! Configuration is a single TOML file. `${VAR}` placeholders are substituted
//! from the environment before parsing, chain tables are checked against a
//! field schema, and a handful of `ROUTES_*` variables override file values.

pub mod registry;
pub mod serde_helpers;
pub mod types;
pub mod validation;

pub use registry::ConfigRegistry;
pub use types::*;

use routes_types::RoutesError;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default configuration path used by the binary.
pub const DEFAULT_CONFIG_PATH: &str = "config/routes.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

impl From<validation::ValidationError> for ConfigError {
	fn from(err: validation::ValidationError) -> Self {
		ConfigError::ValidationError(err.to_string())
	}
}

impl From<ConfigError> for RoutesError {
	fn from(err: ConfigError) -> Self {
		RoutesError::Config(err.to_string())
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ROUTES_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<RoutesConfig, ConfigError> {
		let file_path = self.file_path.as_deref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.to_string()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		debug!(path = %file_path, "Loaded configuration file");

		self.from_toml_str(&content)
	}

	/// Runs the full pipeline on in-memory TOML: substitution, schema
	/// validation, parsing, env overrides and semantic checks.
	pub fn from_toml_str(&self, content: &str) -> Result<RoutesConfig, ConfigError> {
		let substituted = self.substitute_env_vars(content)?;

		let raw: toml::Value =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;
		self.validate_schema(&raw)?;

		let mut config: RoutesConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config);
		self.validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn validate_schema(&self, raw: &toml::Value) -> Result<(), ConfigError> {
		if let Some(quoting) = raw.get("quoting") {
			validation::quoting_schema().validate(quoting)?;
		}

		let chains = raw
			.get("chains")
			.and_then(|c| c.as_table())
			.ok_or_else(|| ConfigError::ValidationError("Missing [chains] table".to_string()))?;

		let schema = validation::chain_schema();
		for (chain_id, table) in chains {
			schema.validate(table).map_err(|e| {
				ConfigError::ValidationError(format!("chains.{}: {}", chain_id, e))
			})?;
		}

		Ok(())
	}

	fn apply_env_overrides(&self, config: &mut RoutesConfig) {
		if let Ok(url) = env::var(format!("{}QUOTING_URL", self.env_prefix)) {
			config.quoting.base_url = url;
		}

		if let Ok(dapp_id) = env::var(format!("{}DAPP_ID", self.env_prefix)) {
			config.client.dapp_id = dapp_id;
		}

		if let Ok(private_key) = env::var(format!("{}PRIVATE_KEY", self.env_prefix)) {
			config.account = Some(AccountConfig { private_key });
		}
	}

	fn validate_config(&self, config: &RoutesConfig) -> Result<(), ConfigError> {
		if config.client.dapp_id.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"client.dapp_id must not be empty".to_string(),
			));
		}

		if config.chains.is_empty() {
			return Err(ConfigError::ValidationError(
				"At least one chain must be configured".to_string(),
			));
		}

		if config.quoting.max_attempts == 0 {
			return Err(ConfigError::ValidationError(
				"quoting.max_attempts must be at least 1".to_string(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use routes_types::{Address, AddressRegistry, ChainId};
	use std::io::Write;

	const BASE_CONFIG: &str = r#"
[client]
dapp_id = "routes-test"

[quoting]
base_url = "https://quotes.example.com"
max_attempts = 3

[publish]
confirmations = 2

[chains.10]
name = "optimism"
rpc_url = "https://mainnet.optimism.io"
intent_source = "0x1111111111111111111111111111111111111111"
inbox = "0x2222222222222222222222222222222222222222"
hyper_prover = "0x3333333333333333333333333333333333333333"
stablecoins = ["0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"]

[chains.8453]
rpc_url = "https://mainnet.base.org"
intent_source = "0x1111111111111111111111111111111111111111"
inbox = "0x2222222222222222222222222222222222222222"
meta_prover = "0x4444444444444444444444444444444444444444"
"#;

	fn loader() -> ConfigLoader {
		// A prefix no test sets keeps overrides out of unrelated tests.
		ConfigLoader::new().with_env_prefix("ROUTES_CONFIG_TEST_UNSET_")
	}

	#[test]
	fn test_parses_full_config() {
		let config = loader().from_toml_str(BASE_CONFIG).unwrap();

		assert_eq!(config.client.dapp_id, "routes-test");
		assert_eq!(config.quoting.max_attempts, 3);
		assert_eq!(config.quoting.retry_delay_ms, 1_000);
		assert_eq!(config.publish.confirmations, 2);
		assert_eq!(config.publish.fulfillment_lookback_blocks, 10);
		assert!(!config.publish.unbounded_permit2_approval);
		assert!(config.account.is_none());
		assert_eq!(config.chains.len(), 2);

		let registry = ConfigRegistry::from_config(&config);
		assert_eq!(
			registry.inbox(ChainId::BASE),
			Some(Address::repeat_byte(0x22))
		);
		assert_eq!(registry.permit2(ChainId::BASE), Some(CANONICAL_PERMIT2));
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("ROUTES_CONFIG_TEST_DAPP", "substituted-dapp");
		let content = BASE_CONFIG.replace("\"routes-test\"", "\"${ROUTES_CONFIG_TEST_DAPP}\"");

		let config = loader().from_toml_str(&content).unwrap();
		assert_eq!(config.client.dapp_id, "substituted-dapp");
	}

	#[test]
	fn test_missing_env_var() {
		let content = BASE_CONFIG.replace(
			"\"routes-test\"",
			"\"${ROUTES_CONFIG_TEST_DEFINITELY_MISSING}\"",
		);

		match loader().from_toml_str(&content) {
			Err(ConfigError::EnvVarNotFound(name)) => {
				assert_eq!(name, "ROUTES_CONFIG_TEST_DEFINITELY_MISSING")
			}
			other => panic!("unexpected result: {:?}", other.map(|_| ())),
		}
	}

	#[test]
	fn test_env_overrides() {
		env::set_var("ROUTES_OVERRIDE_TEST_QUOTING_URL", "http://localhost:4000");
		env::set_var("ROUTES_OVERRIDE_TEST_PRIVATE_KEY", "0xabc");

		let config = ConfigLoader::new()
			.with_env_prefix("ROUTES_OVERRIDE_TEST_")
			.from_toml_str(BASE_CONFIG)
			.unwrap();

		assert_eq!(config.quoting.base_url, "http://localhost:4000");
		assert_eq!(config.account.unwrap().private_key, "0xabc");
		assert_eq!(config.client.dapp_id, "routes-test");
	}

	#[test]
	fn test_invalid_chain_table_names_chain() {
		let content = BASE_CONFIG.replace(
			"inbox = \"0x2222222222222222222222222222222222222222\"\nhyper_prover",
			"inbox = \"0x22\"\nhyper_prover",
		);

		match loader().from_toml_str(&content) {
			Err(ConfigError::ValidationError(message)) => {
				assert!(message.starts_with("chains.10:"), "{}", message)
			}
			other => panic!("unexpected result: {:?}", other.map(|_| ())),
		}
	}

	#[test]
	fn test_empty_dapp_id_rejected() {
		let content = BASE_CONFIG.replace("\"routes-test\"", "\"\"");
		assert!(matches!(
			loader().from_toml_str(&content),
			Err(ConfigError::ValidationError(_))
		));
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(BASE_CONFIG.as_bytes()).unwrap();

		let config = loader().with_file(file.path()).load().await.unwrap();
		assert_eq!(config.chains.len(), 2);
	}

	#[tokio::test]
	async fn test_load_missing_file() {
		let result = loader()
			.with_file("/nonexistent/routes.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
	}
}
