//! # Dai MCD Token Plugin
//!
//! Token balance and allowance queries for the Multi-Collateral Dai token set.
//!
//! Each query goes through a schema that names the contract, method and
//! arguments of one read and how to transform its raw `uint256` result.
//! Balances become typed [`CurrencyAmount`]s of the queried token; allowances
//! become plain decimals. The [`QueryService`] batches reads through
//! Multicall3.
//!
//! ## Example
//!
//! ```
//! use dai_plugin_mcd::prelude::*;
//!
//! # fn main() -> dai_error::Result<()> {
//! let call = TokenBalance.generate(("0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6", "DAI"))?;
//! assert_eq!(call.contract, "MCD_DAI");
//! assert_eq!(call.method, "balanceOf(address)(uint256)");
//!
//! let zero = call
//!     .transform(OutputTag::TokenBalance, U256::ZERO)
//!     .and_then(SchemaValue::into_currency);
//! assert_eq!(zero, Some(MDAI.zero()));
//! # Ok(())
//! # }
//! ```
//!
//! Against a node:
//!
//! ```no_run
//! use dai_plugin_mcd::{connect, McdConfig};
//!
//! # async fn run() -> dai_error::Result<()> {
//! let service = connect(&McdConfig::new("http://localhost:8545")).await?;
//! let balance = service
//!     .token_balance("0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6", "BAT")
//!     .await?;
//! println!("{balance}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod currency;
pub mod dispatch;
pub mod query;
pub mod schemas;
pub mod signature;
pub mod utils;

pub use config::{connect, McdConfig};
pub use currency::{get_mcd_token, CurrencyAmount, CurrencyToken, MCD_TOKENS};
pub use dispatch::{CallDispatcher, EncodedCall, MulticallDispatcher, StaticDispatcher};
pub use query::QueryService;
pub use schemas::{
    CallDescriptor, OutputTag, Schema, SchemaValue, TokenAllowance, TokenBalance, TokenQuery,
    ValueTransform, TOKEN_ALLOWANCE, TOKEN_BALANCE,
};
pub use signature::MethodSignature;
pub use utils::{from_wei, is_valid_address_string};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::currency::*;
    pub use crate::schemas::token::{canonical_symbol, contract_name};
    pub use crate::{
        connect, from_wei, is_valid_address_string, CallDescriptor, CallDispatcher, McdConfig,
        OutputTag, QueryService, Schema, SchemaValue, TokenAllowance, TokenBalance, TokenQuery,
    };
    pub use alloy::primitives::{Address, U256};
    pub use bigdecimal::BigDecimal;
    pub use dai_error::{DaiError, Result};
}
