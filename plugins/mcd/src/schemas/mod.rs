//! Declarative schemas describing batched contract reads
//!
//! A schema turns query parameters into a [`CallDescriptor`]: which contract
//! to call, with which method and arguments, and how to transform the raw
//! result for each output tag it declares. Descriptors are plain values; the
//! query layer dispatches them and applies their transforms.

pub mod token;

use crate::currency::{CurrencyAmount, CurrencyToken};
use crate::signature::MethodSignature;
use crate::utils::from_wei;
use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use dai_error::Result;
use std::collections::BTreeMap;
use std::fmt;

pub use token::{TokenAllowance, TokenBalance};

/// Output tag of the token balance schema
pub const TOKEN_BALANCE: &str = "tokenBalance";
/// Output tag of the token allowance schema
pub const TOKEN_ALLOWANCE: &str = "tokenAllowance";

/// Result kinds a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputTag {
    /// Balance of a token, as a typed currency amount
    TokenBalance,
    /// Allowance granted to a spender, as a plain decimal
    TokenAllowance,
}

impl OutputTag {
    /// Tag name as used by query callers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenBalance => TOKEN_BALANCE,
            Self::TokenAllowance => TOKEN_ALLOWANCE,
        }
    }
}

impl fmt::Display for OutputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure transform applied to the raw integer a call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// Wrap the raw integer as an amount of the token, in its smallest unit
    Currency(CurrencyToken),
    /// Divide by 10^18 into a plain decimal
    FromWei,
}

impl ValueTransform {
    /// Apply the transform
    pub fn apply(&self, raw: U256) -> SchemaValue {
        match self {
            Self::Currency(token) => SchemaValue::Currency(token.wei(raw)),
            Self::FromWei => SchemaValue::Decimal(from_wei(raw)),
        }
    }
}

/// A transformed schema result
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaValue {
    /// Typed currency amount
    Currency(CurrencyAmount),
    /// Plain high-precision decimal
    Decimal(BigDecimal),
}

impl SchemaValue {
    /// The currency amount, if this is one
    pub fn into_currency(self) -> Option<CurrencyAmount> {
        match self {
            Self::Currency(amount) => Some(amount),
            Self::Decimal(_) => None,
        }
    }

    /// The decimal, if this is one
    pub fn into_decimal(self) -> Option<BigDecimal> {
        match self {
            Self::Decimal(value) => Some(value),
            Self::Currency(_) => None,
        }
    }
}

/// Everything needed to perform one contract read and interpret its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    /// Unique id derived from the query kind and parameters
    pub id: String,
    /// Registry name of the contract to call
    pub contract: String,
    /// Method signature in `name(inputs)(outputs)` form
    pub method: &'static str,
    /// Ordered call arguments
    pub args: Vec<String>,
    /// Transform per declared output tag
    pub transforms: BTreeMap<OutputTag, ValueTransform>,
}

impl CallDescriptor {
    /// Parse the method signature
    pub fn signature(&self) -> Result<MethodSignature> {
        self.method.parse()
    }

    /// Apply the transform declared for `tag`
    pub fn transform(&self, tag: OutputTag, raw: U256) -> Option<SchemaValue> {
        self.transforms.get(&tag).map(|t| t.apply(raw))
    }
}

/// A schema producing call descriptors from typed arguments
pub trait Schema {
    /// Query parameters
    type Args<'a>;

    /// Output tags every generated descriptor declares
    fn returns(&self) -> &'static [OutputTag];

    /// Build the call descriptor for the arguments
    fn generate(&self, args: Self::Args<'_>) -> Result<CallDescriptor>;
}

/// A query against one of the token schemas
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenQuery {
    /// Balance of `symbol` held by `address`
    Balance {
        /// Holder address
        address: String,
        /// Token symbol, aliases allowed
        symbol: String,
    },
    /// Amount of `symbol` that `spender` may move on behalf of `owner`
    Allowance {
        /// Token owner
        owner: String,
        /// Approved spender
        spender: String,
        /// Token symbol, aliases allowed
        symbol: String,
    },
}

impl TokenQuery {
    /// Balance query
    pub fn balance(address: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::Balance {
            address: address.into(),
            symbol: symbol.into(),
        }
    }

    /// Allowance query
    pub fn allowance(
        owner: impl Into<String>,
        spender: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self::Allowance {
            owner: owner.into(),
            spender: spender.into(),
            symbol: symbol.into(),
        }
    }

    /// The output tag the query resolves to
    pub fn output_tag(&self) -> OutputTag {
        match self {
            Self::Balance { .. } => OutputTag::TokenBalance,
            Self::Allowance { .. } => OutputTag::TokenAllowance,
        }
    }

    /// Build the call descriptor through the matching schema
    pub fn generate(&self) -> Result<CallDescriptor> {
        match self {
            Self::Balance { address, symbol } => {
                TokenBalance.generate((address.as_str(), symbol.as_str()))
            }
            Self::Allowance {
                owner,
                spender,
                symbol,
            } => TokenAllowance.generate((owner.as_str(), spender.as_str(), symbol.as_str())),
        }
    }
}
