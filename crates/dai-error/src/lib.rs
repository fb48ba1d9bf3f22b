//! # Dai Error
//!
//! Unified error types shared by the Dai client crates: token schemas,
//! the contract registry and the multicall query layer all report through
//! [`DaiError`].
//!
//! ## Error Categories
//!
//! - Schema errors raised while building call descriptors
//! - Contract registry errors (unknown names, versions, networks)
//! - ABI encoding and decoding errors
//! - RPC / provider errors
//! - Configuration errors
//!
//! ## Example
//!
//! ```
//! use dai_error::{DaiError, Result};
//!
//! fn require_known(symbol: &str) -> Result<()> {
//!     if symbol.is_empty() {
//!         return Err(DaiError::UnknownToken {
//!             symbol: symbol.to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for Dai client operations.
#[derive(Error, Debug)]
pub enum DaiError {
    // ============ Schema Errors ============
    /// The symbol has no registered currency token
    #[error("{symbol} token is not part of the default tokens list")]
    UnknownToken {
        /// Symbol exactly as supplied by the caller
        symbol: String,
    },

    /// The schema cannot answer this query; the message names the alternative
    #[error("{0}")]
    UnsupportedQuery(String),

    // ============ Contract Registry Errors ============
    /// No contract is registered under the name
    #[error("No contract found for \"{0}\"")]
    ContractNotFound(String),

    /// The registry has not been connected to a network yet
    #[error("Cannot resolve network ID. Are you connected?")]
    NetworkUnresolved,

    /// The connected chain id is not a known network
    #[error("Unknown network ID: {0}")]
    UnknownNetwork(u64),

    /// The contract exists but not in the requested version
    #[error("Cannot find contract {name}, version {version}")]
    ContractVersionNotFound {
        /// Contract name
        name: String,
        /// Requested version
        version: u32,
    },

    /// The contract has no address on the connected network
    #[error("Contract {0} has no address")]
    ContractHasNoAddress(String),

    // ============ Address / Amount Errors ============
    /// Invalid address format
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The invalid address
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Arithmetic on amounts of two different currencies
    #[error("Currency mismatch: cannot combine {left} with {right}")]
    CurrencyMismatch {
        /// Symbol of the left operand
        left: String,
        /// Symbol of the right operand
        right: String,
    },

    /// Amount overflow during calculation
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Value could not be parsed
    #[error("Format error: {0}")]
    FormatError(String),

    // ============ Call Errors ============
    /// Malformed method signature
    #[error("Invalid method signature '{signature}': {reason}")]
    InvalidSignature {
        /// The signature as written in the descriptor
        signature: String,
        /// Why it could not be parsed
        reason: String,
    },

    /// ABI encoding/decoding error
    #[error("ABI error: {0}")]
    AbiError(String),

    /// Contract call failed or reverted
    #[error("Contract call failed: {0}")]
    ContractError(String),

    // ============ Network Errors ============
    /// RPC request failed
    #[error("RPC request failed: {method} - {reason}")]
    RpcRequestError {
        /// RPC method name
        method: String,
        /// Error reason
        reason: String,
    },

    /// RPC endpoint could not be used
    #[error("RPC connection failed: {url} - {reason}")]
    RpcConnectionError {
        /// RPC URL
        url: String,
        /// Error reason
        reason: String,
    },

    // ============ Configuration ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON parse error
    #[error("JSON error: {0}")]
    JsonError(String),

    // ============ Generic ============
    /// Unknown/other error
    #[error("{0}")]
    Other(String),

    /// Wrapped error from external source
    #[error("External error: {message}")]
    External {
        /// Error message
        message: String,
    },
}

/// Convenient Result type using DaiError
pub type Result<T> = std::result::Result<T, DaiError>;

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Adds context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;

    /// Adds context using a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| DaiError::External {
            message: format!("{}: {}", ctx.into(), e),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| DaiError::External {
            message: format!("{}: {}", f(), e),
        })
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DaiError::Other(ctx.into()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| DaiError::Other(f()))
    }
}

impl From<serde_json::Error> for DaiError {
    fn from(err: serde_json::Error) -> Self {
        DaiError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for DaiError {
    fn from(err: std::io::Error) -> Self {
        DaiError::ConfigError(err.to_string())
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Unknown token symbol
    UnknownToken = 1001,
    /// Query not supported by the schema
    UnsupportedQuery = 1002,
    /// Contract name not registered
    ContractNotFound = 2001,
    /// Network not resolved or not recognized
    NetworkUnresolved = 2002,
    /// Contract version missing
    ContractVersionNotFound = 2003,
    /// Contract has no address on this network
    ContractHasNoAddress = 2004,
    /// Invalid address
    InvalidAddress = 3001,
    /// Mixed currencies or overflow
    AmountError = 3002,
    /// Malformed value
    FormatError = 3003,
    /// Signature or ABI problem
    AbiError = 4001,
    /// Contract call failed
    ContractError = 4002,
    /// RPC failure
    RpcError = 5001,
    /// Bad configuration
    ConfigError = 6001,
}

impl DaiError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            DaiError::UnknownToken { .. } => ErrorCode::UnknownToken,
            DaiError::UnsupportedQuery(_) => ErrorCode::UnsupportedQuery,
            DaiError::ContractNotFound(_) => ErrorCode::ContractNotFound,
            DaiError::NetworkUnresolved | DaiError::UnknownNetwork(_) => {
                ErrorCode::NetworkUnresolved
            }
            DaiError::ContractVersionNotFound { .. } => ErrorCode::ContractVersionNotFound,
            DaiError::ContractHasNoAddress(_) => ErrorCode::ContractHasNoAddress,
            DaiError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            DaiError::CurrencyMismatch { .. } | DaiError::AmountOverflow(_) => {
                ErrorCode::AmountError
            }
            DaiError::FormatError(_) => ErrorCode::FormatError,
            DaiError::InvalidSignature { .. } | DaiError::AbiError(_) => ErrorCode::AbiError,
            DaiError::ContractError(_) => ErrorCode::ContractError,
            DaiError::RpcRequestError { .. } | DaiError::RpcConnectionError { .. } => {
                ErrorCode::RpcError
            }
            DaiError::ConfigError(_) | DaiError::JsonError(_) => ErrorCode::ConfigError,
            _ => ErrorCode::Unknown,
        }
    }

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DaiError::RpcRequestError { .. } | DaiError::RpcConnectionError { .. }
        )
    }
}
