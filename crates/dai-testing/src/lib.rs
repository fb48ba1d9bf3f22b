//! # Dai Testing Infrastructure
//!
//! Shared test utilities for the Dai client crates:
//! - CDP event fixtures
//! - Well-known testnet addresses
//! - Edge case amounts and addresses
//! - Property-based testing strategies
//! - Local testnet configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dai_testing::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_balance_ids(address in address_string(), symbol in mcd_symbol()) {
//!         // ...
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use alloy::primitives::{Address, U256};
use dai_contracts::{ContractDefinition, Network, RegistryConfig};
use dai_error::{DaiError, ErrorContext, Result};
use dai_plugin_mcd::currency::{CurrencyAmount, CurrencyToken, MCD_TOKENS, MDAI};
use dai_plugin_mcd::schemas::token::TOKEN_ALIASES;
use dai_plugin_mcd::McdConfig;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// ============================================================================
// Testnet
// ============================================================================

/// RPC endpoint of the local test chain
pub const TESTNET_RPC_URL: &str = "http://localhost:2000";

/// Chain id reported by the local test chain
pub const TESTNET_NETWORK_ID: u64 = 999;

/// Environment variable naming a JSON file of deployed contract addresses
///
/// Its `MULTICALL` entry must be a Multicall3 (`aggregate3`) deployment.
pub const TESTNET_CONTRACTS_ENV: &str = "DAI_TESTNET_CONTRACTS";

/// First funded account of the test chain
pub const TEST_ADDRESS: &str = "0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6";

/// DS-Proxy of [`TEST_ADDRESS`] on the test chain snapshot
pub const PROXY_ADDRESS: &str = "0x570074CCb147ea3dE2E23fB038D4d78324278886";

/// Registry entries for the test chain from a `{"NAME": "0x..."}` map
pub fn testnet_contracts_from_json(json: &str) -> Result<RegistryConfig> {
    let addresses: BTreeMap<String, Address> = serde_json::from_str(json)?;
    let add_contracts = addresses
        .into_iter()
        .map(|(name, address)| {
            let per_network = BTreeMap::from([(Network::Testnet.name().to_string(), address)]);
            (name, ContractDefinition::per_network(per_network, Default::default()))
        })
        .collect();
    Ok(RegistryConfig { add_contracts })
}

/// Registry entries for the test chain, read from the file named by
/// [`TESTNET_CONTRACTS_ENV`]
pub fn testnet_contracts() -> Result<RegistryConfig> {
    let path = std::env::var(TESTNET_CONTRACTS_ENV)
        .map_err(|_| DaiError::ConfigError(format!("{TESTNET_CONTRACTS_ENV} is not set")))?;
    let json = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
    testnet_contracts_from_json(&json)
}

/// Plugin configuration for the local test chain
pub fn testnet_config() -> Result<McdConfig> {
    Ok(McdConfig::new(TESTNET_RPC_URL)
        .with_network_id(TESTNET_NETWORK_ID)
        .with_smart_contract(testnet_contracts()?))
}

// ============================================================================
// CDP Event Fixtures
// ============================================================================

/// Transaction metadata attached to a raw event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTx {
    /// Transaction hash
    pub transaction_hash: String,
    /// Sender
    pub tx_from: String,
    /// Block time
    pub era: SystemTime,
}

/// A raw vault event as returned by the event indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCdpEvent {
    /// Collateral or debt change
    Frob {
        /// Debt change in wei, signed
        dart: String,
        /// Collateral change in wei, signed
        dink: String,
        /// Accumulated rate of the ilk, ray precision
        ilk_rate: String,
        /// Transaction
        tx: EventTx,
        /// Collateral type
        ilk_identifier: String,
    },
    /// Liquidation
    Bite {
        /// Transaction
        tx: EventTx,
        /// Collateral type
        ilk_identifier: String,
    },
}

/// A vault event after formatting into typed amounts
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedCdpEvent {
    /// Transaction hash
    pub transaction_hash: String,
    /// Collateral change
    pub change_in_collateral: CurrencyAmount,
    /// Debt change, for frob events
    pub change_in_dai: Option<CurrencyAmount>,
    /// `wipe` or `draw`, for frob events
    pub dai_action: Option<&'static str>,
    /// Whether the vault was bitten
    pub liquidated: bool,
    /// Event time
    pub time: SystemTime,
    /// Sender
    pub sender_address: String,
    /// Collateral type
    pub ilk: String,
}

const SENDER: &str = "0x1ad35418e7b7c5746ea42295a1100480a810256a";
const FROB_HASH: &str = "0x37d1c253f79784313045d3922928f646020d545f17fc3d74a0d68e665db0b394";
const BITE_HASH: &str = "0xbe023a205453b833e65bf29063de8b8b3bd44d2e68c9c079f681ec46a765a63f";

// 1970-01-01T00:01:20
fn fixture_era() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(80)
}

fn fixture_tx() -> EventTx {
    EventTx {
        transaction_hash: BITE_HASH.to_string(),
        tx_from: SENDER.to_string(),
        era: fixture_era(),
    }
}

/// A frob and a bite event for `ilk`
pub fn dummy_event_data(ilk: &str) -> Vec<RawCdpEvent> {
    vec![
        RawCdpEvent::Frob {
            dart: "-6000000000000000000".to_string(),
            dink: "0".to_string(),
            ilk_rate: "2000000000000000000000000000".to_string(),
            tx: fixture_tx(),
            ilk_identifier: ilk.to_string(),
        },
        RawCdpEvent::Bite {
            tx: fixture_tx(),
            ilk_identifier: ilk.to_string(),
        },
    ]
}

/// Expected formatting of [`dummy_event_data`] for collateral `gem`
pub fn formatted_dummy_event_data(gem: CurrencyToken, ilk: &str) -> Vec<FormattedCdpEvent> {
    vec![
        FormattedCdpEvent {
            transaction_hash: FROB_HASH.to_string(),
            change_in_collateral: gem.zero(),
            change_in_dai: Some(MDAI.amount(12)),
            dai_action: Some("wipe"),
            liquidated: false,
            time: fixture_era(),
            sender_address: SENDER.to_string(),
            ilk: ilk.to_string(),
        },
        FormattedCdpEvent {
            transaction_hash: BITE_HASH.to_string(),
            change_in_collateral: gem.zero(),
            change_in_dai: None,
            dai_action: None,
            liquidated: true,
            time: SystemTime::now(),
            sender_address: SENDER.to_string(),
            ilk: ilk.to_string(),
        },
    ]
}

// ============================================================================
// Edge Case Values
// ============================================================================

/// Edge case raw amounts
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// Zero
    pub const ZERO: U256 = U256::ZERO;

    /// One wei
    pub const ONE_WEI: U256 = U256::from_limbs([1, 0, 0, 0]);

    /// One whole 18-decimal token
    pub const ONE_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

    /// The unlimited approval amount
    pub const UINT256_MAX: U256 = U256::MAX;

    /// `UINT256_MAX` as hex
    pub const UINT256_MAX_HEX: &'static str =
        "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    /// `UINT256_MAX` divided by 10^18
    pub const UINT256_MAX_FROM_WEI: &'static str =
        "115792089237316195423570985008687907853269984665640564039457.584007913129639935";

    /// Amounts at the boundaries of precision
    pub fn all() -> Vec<U256> {
        vec![
            Self::ZERO,
            Self::ONE_WEI,
            Self::ONE_TOKEN - Self::ONE_WEI,
            Self::ONE_TOKEN,
            U256::from(u64::MAX),
            U256::from(u128::MAX),
            Self::UINT256_MAX - Self::ONE_WEI,
            Self::UINT256_MAX,
        ]
    }
}

/// Edge case address strings
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Strings that are not chain addresses
    pub fn invalid() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0x1234",
            "16fb96a5fa0427af0c8f7cf1eb4870231c8154b6",
            "0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b",
            "0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6a",
            "0xZZfb96a5fa0427af0c8f7cf1eb4870231c8154b6",
            "0X16fb96a5fa0427af0c8f7cf1eb4870231c8154b6",
        ]
    }
}

// ============================================================================
// Property Testing Strategies
// ============================================================================

/// Any symbol of the default tokens list, or one of its aliases
pub fn mcd_symbol() -> impl Strategy<Value = String> {
    let symbols: Vec<String> = MCD_TOKENS
        .iter()
        .map(|t| t.symbol().to_string())
        .chain(TOKEN_ALIASES.iter().map(|(alias, _)| alias.to_string()))
        .collect();
    prop::sample::select(symbols)
}

/// Upper-case symbols outside the default tokens list and its aliases
pub fn unknown_symbol() -> impl Strategy<Value = String> {
    "[A-Z_]{2,12}".prop_filter("known symbol", |s| {
        !MCD_TOKENS.iter().any(|t| t.symbol() == s.as_str())
            && !TOKEN_ALIASES.iter().any(|(alias, _)| *alias == s.as_str())
    })
}

/// Lowercase `0x`-prefixed address strings
pub fn address_string() -> impl Strategy<Value = String> {
    "0x[0-9a-f]{40}"
}

/// Any 256-bit raw amount
pub fn raw_amount() -> impl Strategy<Value = U256> {
    any::<[u8; 32]>().prop_map(U256::from_be_bytes)
}

// ============================================================================
// Tests
// ============================================================================
