//! Named contract registry
//!
//! Maps a contract name (`MCD_DAI`, `MULTICALL`, `BAT`, ...) to its address
//! and ABI on the connected network. Definitions can be added from
//! configuration, either with one address for every network or with a
//! per-network address map.

use crate::network::Network;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{address, Address};
use dai_error::{DaiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Name of the multicall helper contract
pub const MULTICALL: &str = "MULTICALL";
/// Name of the MCD Dai token contract
pub const MCD_DAI: &str = "MCD_DAI";
/// Name of the wrapped-ether collateral contract
pub const ETH: &str = "ETH";

/// Human-readable ERC-20 read interface used for the default token entries
pub const ERC20_READ_ABI: [&str; 5] = [
    "function balanceOf(address owner) view returns (uint256)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function totalSupply() view returns (uint256)",
    "function decimals() view returns (uint8)",
    "function symbol() view returns (string)",
];

/// Human-readable Multicall3 interface used for the default helper entry
pub const MULTICALL_ABI: [&str; 2] = [
    "function getEthBalance(address addr) view returns (uint256 balance)",
    "function getBlockNumber() view returns (uint256 blockNumber)",
];

/// Where a contract lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractAddress {
    /// Same address on every network
    Single(Address),
    /// Address keyed by network name (`mainnet`, `kovan`, `testnet`)
    PerNetwork(BTreeMap<String, Address>),
}

impl ContractAddress {
    /// Address on the given network, if any
    pub fn on(&self, network: Network) -> Option<Address> {
        match self {
            Self::Single(address) => Some(*address),
            Self::PerNetwork(map) => map.get(network.name()).copied(),
        }
    }
}

fn default_version() -> u32 {
    1
}

/// A contract as declared in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDefinition {
    /// Deployed address(es)
    pub address: ContractAddress,
    /// Contract ABI
    #[serde(default)]
    pub abi: JsonAbi,
    /// Deployment version
    #[serde(default = "default_version")]
    pub version: u32,
}

impl ContractDefinition {
    /// Definition deployed at one address on every network
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self {
            address: ContractAddress::Single(address),
            abi,
            version: default_version(),
        }
    }

    /// Definition with per-network addresses
    pub fn per_network(addresses: BTreeMap<String, Address>, abi: JsonAbi) -> Self {
        Self {
            address: ContractAddress::PerNetwork(addresses),
            abi,
            version: default_version(),
        }
    }

    /// Sets the deployment version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

/// A contract resolved for the connected network
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContract {
    /// Registry name
    pub name: String,
    /// Address on the connected network
    pub address: Address,
    /// Contract ABI
    pub abi: JsonAbi,
    /// Deployment version
    pub version: u32,
}

impl ResolvedContract {
    /// Whether the ABI declares a function with this name
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.function(name).is_some()
    }
}

/// Registry configuration, the `smartContract` section of the client config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Extra contracts to register, keyed by name
    #[serde(default)]
    pub add_contracts: HashMap<String, ContractDefinition>,
}

/// Contract registry keyed by name, resolved against the connected network
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    network: Option<Network>,
    contracts: HashMap<String, Vec<ContractDefinition>>,
}

impl ContractRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            network: None,
            contracts: HashMap::new(),
        }
    }

    /// Create registry with the mainnet MCD contracts pre-loaded
    pub fn with_mainnet_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.load_mainnet_defaults()?;
        Ok(registry)
    }

    /// Build a registry from configuration on top of the mainnet defaults
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_mainnet_defaults()?;
        registry.add_contracts(config.add_contracts.clone());
        Ok(registry)
    }

    /// Load the mainnet MCD token and helper contracts
    pub fn load_mainnet_defaults(&mut self) -> Result<()> {
        let erc20 = parse_abi(&ERC20_READ_ABI)?;
        let multicall = parse_abi(&MULTICALL_ABI)?;
        let mainnet = |addr: Address| {
            BTreeMap::from([(Network::Mainnet.name().to_string(), addr)])
        };

        let tokens = [
            (MCD_DAI, address!("6B175474E89094C44Da98b954EedeAC495271d0F")),
            (ETH, address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
            ("BAT", address!("0D8775F648430679A709E98d2b0Cb6250d2887EF")),
            ("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
            ("WBTC", address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599")),
            ("MKR", address!("9f8F72aA9304c8B593d555F12eF6589cC3A579A2")),
        ];
        for (name, addr) in tokens {
            self.add_contract(name, ContractDefinition::per_network(mainnet(addr), erc20.clone()));
        }

        // Multicall3 is deployed at the same address on every public chain.
        self.add_contract(
            MULTICALL,
            ContractDefinition::new(
                address!("cA11bde05977b3631167028862bE2a173976CA11"),
                multicall,
            ),
        );
        Ok(())
    }

    /// Register a contract definition under a name
    ///
    /// A definition with the same version replaces the previous one; other
    /// versions are kept side by side.
    pub fn add_contract(&mut self, name: impl Into<String>, definition: ContractDefinition) {
        let versions = self.contracts.entry(name.into()).or_default();
        versions.retain(|d| d.version != definition.version);
        versions.push(definition);
        versions.sort_by_key(|d| d.version);
    }

    /// Register several contracts at once
    pub fn add_contracts(&mut self, definitions: HashMap<String, ContractDefinition>) {
        for (name, definition) in definitions {
            self.add_contract(name, definition);
        }
    }

    /// Set the network from the chain id reported by the provider
    pub fn connect(&mut self, chain_id: u64) -> Result<Network> {
        let network = Network::from_chain_id(chain_id).ok_or(DaiError::UnknownNetwork(chain_id))?;
        tracing::info!(%network, chain_id, "contract registry connected");
        self.network = Some(network);
        Ok(network)
    }

    /// Set the network directly
    pub fn set_network(&mut self, network: Network) {
        self.network = Some(network);
    }

    /// Currently connected network
    pub fn network(&self) -> Option<Network> {
        self.network
    }

    /// Whether a contract name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// All registered names, sorted
    pub fn contract_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contracts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the latest version of a contract on the connected network
    pub fn get_contract(&self, name: &str) -> Result<ResolvedContract> {
        self.resolve(name, None)
    }

    /// Resolve a specific version of a contract on the connected network
    pub fn get_contract_version(&self, name: &str, version: u32) -> Result<ResolvedContract> {
        self.resolve(name, Some(version))
    }

    /// Address of a contract on the connected network
    pub fn address_of(&self, name: &str) -> Result<Address> {
        self.get_contract(name).map(|c| c.address)
    }

    fn resolve(&self, name: &str, version: Option<u32>) -> Result<ResolvedContract> {
        let versions = self
            .contracts
            .get(name)
            .ok_or_else(|| DaiError::ContractNotFound(name.to_string()))?;
        let network = self.network.ok_or(DaiError::NetworkUnresolved)?;

        let definition = match version {
            Some(v) => versions.iter().find(|d| d.version == v),
            None => versions.last(),
        }
        .ok_or_else(|| DaiError::ContractVersionNotFound {
            name: name.to_string(),
            version: version.unwrap_or_default(),
        })?;

        let address = definition
            .address
            .on(network)
            .ok_or_else(|| DaiError::ContractHasNoAddress(name.to_string()))?;

        Ok(ResolvedContract {
            name: name.to_string(),
            address,
            abi: definition.abi.clone(),
            version: definition.version,
        })
    }
}

fn parse_abi(signatures: &[&str]) -> Result<JsonAbi> {
    JsonAbi::parse(signatures.iter().copied()).map_err(|e| DaiError::AbiError(e.to_string()))
}
