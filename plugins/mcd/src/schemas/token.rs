//! Token balance and allowance schemas
//!
//! Symbols are canonicalized first (`WETH` is `MWETH`, `DAI` is `MDAI`); every
//! lookup after that uses the canonical symbol. Balances come back as typed
//! currency amounts, allowances as plain 18-decimal values.

use super::{CallDescriptor, OutputTag, Schema, ValueTransform};
use crate::currency::{get_mcd_token, CurrencyToken};
use dai_contracts::{ETH, MCD_DAI, MULTICALL};
use dai_error::{DaiError, Result};
use std::collections::BTreeMap;

/// Aliases accepted from callers, mapped to their canonical symbol
pub const TOKEN_ALIASES: [(&str, &str); 2] = [("WETH", "MWETH"), ("DAI", "MDAI")];

/// Native ether
pub const NATIVE_SYMBOL: &str = "ETH";
/// Dai in the savings rate module
pub const DSR_DAI_SYMBOL: &str = "DSR-DAI";

/// ERC-20 balance read
pub const BALANCE_OF: &str = "balanceOf(address)(uint256)";
/// Native balance read through the multicall helper
pub const GET_ETH_BALANCE: &str = "getEthBalance(address)(uint256)";
/// ERC-20 allowance read
pub const ALLOWANCE: &str = "allowance(address,address)(uint256)";

/// Error message for balance queries against the savings pseudo-token
pub const DSR_DAI_BALANCE_MESSAGE: &str = concat!(
    "Balance of DAI in savings cannot be retrieved from a token contract call. ",
    "To get DAI balance in savings call 'balance('DSR-DAI')'"
);

/// Canonical form of a symbol
pub fn canonical_symbol(symbol: &str) -> &str {
    TOKEN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == symbol)
        .map_or(symbol, |(_, canonical)| canonical)
}

/// Registry name of the token contract for a canonical symbol
pub fn contract_name(canonical: &str) -> &str {
    match canonical {
        "MDAI" => MCD_DAI,
        "MWETH" => ETH,
        other => other,
    }
}

fn resolve_token(symbol: &str) -> Result<(&str, CurrencyToken)> {
    let canonical = canonical_symbol(symbol);
    let token = get_mcd_token(canonical).ok_or_else(|| DaiError::UnknownToken {
        symbol: symbol.to_string(),
    })?;
    Ok((canonical, token))
}

/// Balance of a token held by an address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenBalance;

impl Schema for TokenBalance {
    /// `(address, symbol)`
    type Args<'a> = (&'a str, &'a str);

    fn returns(&self) -> &'static [OutputTag] {
        &[OutputTag::TokenBalance]
    }

    fn generate(&self, (address, symbol): Self::Args<'_>) -> Result<CallDescriptor> {
        let (canonical, token) = resolve_token(symbol)?;
        if canonical == DSR_DAI_SYMBOL {
            return Err(DaiError::UnsupportedQuery(DSR_DAI_BALANCE_MESSAGE.to_string()));
        }

        let native = canonical == NATIVE_SYMBOL;
        let descriptor = CallDescriptor {
            id: format!("balance.{canonical}.{address}"),
            contract: if native { MULTICALL } else { contract_name(canonical) }.to_string(),
            method: if native { GET_ETH_BALANCE } else { BALANCE_OF },
            args: vec![address.to_string()],
            transforms: BTreeMap::from([(
                OutputTag::TokenBalance,
                ValueTransform::Currency(token),
            )]),
        };
        tracing::debug!(
            id = %descriptor.id,
            contract = %descriptor.contract,
            "token balance call"
        );
        Ok(descriptor)
    }
}

/// Allowance a token owner granted to a spender
///
/// Unlike [`TokenBalance`] this does not reject `DSR-DAI`, and it yields a
/// plain decimal rather than a currency amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenAllowance;

impl Schema for TokenAllowance {
    /// `(owner, spender, symbol)`
    type Args<'a> = (&'a str, &'a str, &'a str);

    fn returns(&self) -> &'static [OutputTag] {
        &[OutputTag::TokenAllowance]
    }

    fn generate(&self, (owner, spender, symbol): Self::Args<'_>) -> Result<CallDescriptor> {
        let (canonical, _) = resolve_token(symbol)?;

        let descriptor = CallDescriptor {
            id: format!("allowance.{canonical}.{owner}.{spender}"),
            contract: contract_name(canonical).to_string(),
            method: ALLOWANCE,
            args: vec![owner.to_string(), spender.to_string()],
            transforms: BTreeMap::from([(OutputTag::TokenAllowance, ValueTransform::FromWei)]),
        };
        tracing::debug!(
            id = %descriptor.id,
            contract = %descriptor.contract,
            "token allowance call"
        );
        Ok(descriptor)
    }
}
