//! Networks the contract registry knows addresses for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Networks with known MCD deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet = 1,
    /// Kovan testnet
    Kovan = 42,
    /// Local test chain (ganache snapshot)
    Testnet = 999,
}

impl Network {
    /// Every known network
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Kovan, Network::Testnet];

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        *self as u64
    }

    /// Resolve a chain id reported by the provider
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }

    /// Key used for per-network address maps
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Kovan => "kovan",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = dai_error::DaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.name() == s)
            .ok_or_else(|| dai_error::DaiError::ConfigError(format!("unknown network '{s}'")))
    }
}
