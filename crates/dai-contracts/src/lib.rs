//! # Dai Contracts
//!
//! Named contract registry for the Dai client. Contracts are looked up by
//! name (`MCD_DAI`, `MULTICALL`, `BAT`, ...) and resolved to an address and
//! ABI on the network the client is connected to.
//!
//! ## Example
//!
//! ```
//! use dai_contracts::{ContractRegistry, MCD_DAI};
//!
//! # fn main() -> dai_error::Result<()> {
//! let mut registry = ContractRegistry::with_mainnet_defaults()?;
//! registry.connect(1)?;
//! let dai = registry.get_contract(MCD_DAI)?;
//! assert!(dai.has_function("balanceOf"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod network;
mod registry;

pub use network::Network;
pub use registry::{
    ContractAddress, ContractDefinition, ContractRegistry, RegistryConfig, ResolvedContract,
    ERC20_READ_ABI, ETH, MCD_DAI, MULTICALL, MULTICALL_ABI,
};
