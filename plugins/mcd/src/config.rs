//! Client configuration and connection setup

use crate::dispatch::MulticallDispatcher;
use crate::query::QueryService;
use alloy::providers::{Provider, ProviderBuilder};
use dai_contracts::{ContractRegistry, RegistryConfig};
use dai_error::{DaiError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Configuration of the MCD token plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McdConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Chain id to use instead of asking the node
    #[serde(default)]
    pub network_id: Option<u64>,
    /// Cache call results until the next block
    #[serde(default)]
    pub enable_cache: bool,
    /// Extra contracts and address overrides
    #[serde(default)]
    pub smart_contract: RegistryConfig,
}

impl McdConfig {
    /// Creates a configuration for the given endpoint
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            network_id: None,
            enable_cache: false,
            smart_contract: RegistryConfig::default(),
        }
    }

    /// Pins the chain id
    pub fn with_network_id(mut self, network_id: u64) -> Self {
        self.network_id = Some(network_id);
        self
    }

    /// Enables or disables caching
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Sets the registry configuration
    pub fn with_smart_contract(mut self, config: RegistryConfig) -> Self {
        self.smart_contract = config;
        self
    }

    /// Parses a JSON configuration and validates it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.rpc_url)
            .map_err(|e| DaiError::ConfigError(format!("Invalid URL '{}': {e}", self.rpc_url)))?;
        Ok(())
    }

    /// Build the contract registry, connected to `chain_id`
    pub fn registry(&self, chain_id: u64) -> Result<ContractRegistry> {
        let mut registry = ContractRegistry::from_config(&self.smart_contract)?;
        registry.connect(chain_id)?;
        Ok(registry)
    }
}

impl Default for McdConfig {
    fn default() -> Self {
        Self::new("http://localhost:8545")
    }
}

/// Connect to the configured node and build a query service
///
/// The chain id comes from the configuration when pinned, otherwise from the
/// node itself.
pub async fn connect(config: &McdConfig) -> Result<QueryService<MulticallDispatcher>> {
    config.validate()?;

    let chain_id = match config.network_id {
        Some(id) => id,
        None => {
            let url = config.rpc_url.parse().map_err(|e| DaiError::RpcConnectionError {
                url: config.rpc_url.clone(),
                reason: format!("{e}"),
            })?;
            let provider = ProviderBuilder::new().connect_http(url);
            provider.get_chain_id().await.map_err(|e| {
                tracing::warn!(rpc_url = %config.rpc_url, error = %e, "eth_chainId failed");
                DaiError::NetworkUnresolved
            })?
        }
    };

    let registry = config.registry(chain_id)?;
    let dispatcher = MulticallDispatcher::from_registry(config.rpc_url.clone(), &registry)?;
    tracing::info!(
        chain_id,
        rpc_url = %config.rpc_url,
        cache = config.enable_cache,
        "mcd plugin connected"
    );

    Ok(QueryService::new(Arc::new(registry), dispatcher).with_cache(config.enable_cache))
}
