//! Currency tokens of the MCD default tokens list and typed amounts.

use crate::utils::to_units;
use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use dai_error::DaiError;
use std::{fmt, ops};

/// A token from the default tokens list: its symbol and on-chain decimal scale
///
/// Acts as the factory turning raw on-chain integers into [`CurrencyAmount`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyToken {
    symbol: &'static str,
    decimals: u8,
}

impl CurrencyToken {
    /// Creates a token with the given symbol and decimal places
    pub const fn new(symbol: &'static str, decimals: u8) -> Self {
        Self { symbol, decimals }
    }

    /// Token symbol
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    /// Number of decimal places of the smallest unit
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Wraps an amount expressed in the smallest on-chain unit
    pub fn wei(&self, raw: U256) -> CurrencyAmount {
        CurrencyAmount { token: *self, raw }
    }

    /// Wraps a whole number of tokens
    pub fn amount(&self, whole: u64) -> CurrencyAmount {
        // saturates for scales that do not fit in 256 bits
        let scale = U256::from(10u64).saturating_pow(U256::from(self.decimals));
        let raw = U256::from(whole).saturating_mul(scale);
        self.wei(raw)
    }

    /// A zero amount of this token
    pub fn zero(&self) -> CurrencyAmount {
        self.wei(U256::ZERO)
    }
}

impl fmt::Display for CurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

/// Native ether
pub const ETH: CurrencyToken = CurrencyToken::new("ETH", 18);
/// Multi-collateral Dai
pub const MDAI: CurrencyToken = CurrencyToken::new("MDAI", 18);
/// Wrapped ether used as MCD collateral
pub const MWETH: CurrencyToken = CurrencyToken::new("MWETH", 18);
/// Dai held in the savings rate module; not a real token contract
pub const DSR_DAI: CurrencyToken = CurrencyToken::new("DSR-DAI", 18);
/// Maker governance token
pub const MKR: CurrencyToken = CurrencyToken::new("MKR", 18);
/// Basic Attention Token
pub const BAT: CurrencyToken = CurrencyToken::new("BAT", 18);
/// USD Coin
pub const USDC: CurrencyToken = CurrencyToken::new("USDC", 6);
/// Wrapped Bitcoin
pub const WBTC: CurrencyToken = CurrencyToken::new("WBTC", 8);
/// TrueUSD
pub const TUSD: CurrencyToken = CurrencyToken::new("TUSD", 18);
/// 0x
pub const ZRX: CurrencyToken = CurrencyToken::new("ZRX", 18);
/// Kyber Network
pub const KNC: CurrencyToken = CurrencyToken::new("KNC", 18);
/// Decentraland
pub const MANA: CurrencyToken = CurrencyToken::new("MANA", 18);
/// Tether USD
pub const USDT: CurrencyToken = CurrencyToken::new("USDT", 6);
/// Paxos Standard
pub const PAXUSD: CurrencyToken = CurrencyToken::new("PAXUSD", 18);
/// Compound
pub const COMP: CurrencyToken = CurrencyToken::new("COMP", 18);
/// Loopring
pub const LRC: CurrencyToken = CurrencyToken::new("LRC", 18);
/// Chainlink
pub const LINK: CurrencyToken = CurrencyToken::new("LINK", 18);
/// Balancer
pub const BAL: CurrencyToken = CurrencyToken::new("BAL", 18);
/// yearn.finance
pub const YFI: CurrencyToken = CurrencyToken::new("YFI", 18);
/// Gemini Dollar
pub const GUSD: CurrencyToken = CurrencyToken::new("GUSD", 2);
/// Uniswap
pub const UNI: CurrencyToken = CurrencyToken::new("UNI", 18);
/// renBTC
pub const RENBTC: CurrencyToken = CurrencyToken::new("RENBTC", 8);
/// Aave
pub const AAVE: CurrencyToken = CurrencyToken::new("AAVE", 18);

/// The default tokens list, keyed by canonical symbol
pub const MCD_TOKENS: [CurrencyToken; 23] = [
    ETH, MDAI, MWETH, DSR_DAI, MKR, BAT, USDC, WBTC, TUSD, ZRX, KNC, MANA, USDT, PAXUSD, COMP,
    LRC, LINK, BAL, YFI, GUSD, UNI, RENBTC, AAVE,
];

/// Look up a token of the default tokens list by canonical symbol
pub fn get_mcd_token(symbol: &str) -> Option<CurrencyToken> {
    MCD_TOKENS.iter().copied().find(|token| token.symbol == symbol)
}

/// An amount of a specific token, held as the raw on-chain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyAmount {
    token: CurrencyToken,
    raw: U256,
}

impl CurrencyAmount {
    /// The token this amount is denominated in
    pub fn token(&self) -> CurrencyToken {
        self.token
    }

    /// Token symbol
    pub fn symbol(&self) -> &'static str {
        self.token.symbol
    }

    /// The raw integer in the smallest unit
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Exact decimal value in whole tokens
    pub fn to_decimal(&self) -> BigDecimal {
        to_units(self.raw, self.token.decimals)
    }

    /// Checks if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    fn same_token(&self, rhs: &Self) -> Result<(), DaiError> {
        if self.token == rhs.token {
            Ok(())
        } else {
            Err(DaiError::CurrencyMismatch {
                left: self.symbol().to_string(),
                right: rhs.symbol().to_string(),
            })
        }
    }
}

impl ops::Add for CurrencyAmount {
    type Output = Result<Self, DaiError>;

    fn add(self, rhs: Self) -> Self::Output {
        self.same_token(&rhs)?;
        let raw = self.raw.checked_add(rhs.raw).ok_or_else(|| {
            DaiError::AmountOverflow(format!("adding {} to {}", rhs.raw, self.raw))
        })?;
        Ok(self.token.wei(raw))
    }
}

impl ops::Sub for CurrencyAmount {
    type Output = Result<Self, DaiError>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.same_token(&rhs)?;
        let raw = self.raw.checked_sub(rhs.raw).ok_or_else(|| {
            DaiError::AmountOverflow(format!("subtracting {} from {}", rhs.raw, self.raw))
        })?;
        Ok(self.token.wei(raw))
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal().normalized(), self.token.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_lookup_canonical_symbols() {
        assert_eq!(get_mcd_token("MDAI"), Some(MDAI));
        assert_eq!(get_mcd_token("MWETH"), Some(MWETH));
        assert_eq!(get_mcd_token("DSR-DAI"), Some(DSR_DAI));
        // aliases are resolved by the schemas, not the token list
        assert_eq!(get_mcd_token("DAI"), None);
        assert_eq!(get_mcd_token("WETH"), None);
        assert_eq!(get_mcd_token("NON_MCD_TOKEN"), None);
    }

    #[test]
    fn test_token_list_symbols_are_unique() {
        let mut symbols: Vec<_> = MCD_TOKENS.iter().map(|t| t.symbol()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), MCD_TOKENS.len());
    }

    #[test]
    fn test_wei_amount() {
        let amount = ETH.wei(U256::from(94_690_199_220_000_000_000u128));
        assert_eq!(amount.symbol(), "ETH");
        assert_eq!(amount.to_decimal(), BigDecimal::from_str("94.69019922").unwrap());
        assert!(!amount.is_zero());
    }

    #[test]
    fn test_whole_amount_respects_decimals() {
        assert_eq!(MDAI.amount(12).to_decimal(), BigDecimal::from(12));
        assert_eq!(USDC.amount(3).raw(), U256::from(3_000_000u64));
        assert_eq!(GUSD.amount(1).raw(), U256::from(100u64));
    }

    #[test]
    fn test_zero() {
        for token in MCD_TOKENS {
            let zero = token.zero();
            assert!(zero.is_zero());
            assert_eq!(zero.symbol(), token.symbol());
            assert_eq!(zero.to_decimal(), BigDecimal::from(0));
        }
    }

    #[test]
    fn test_add_and_sub() {
        let sum = (BAT.amount(2) + BAT.amount(3)).unwrap();
        assert_eq!(sum, BAT.amount(5));

        let diff = (BAT.amount(5) - BAT.amount(3)).unwrap();
        assert_eq!(diff, BAT.amount(2));

        assert!(matches!(
            BAT.amount(1) - BAT.amount(2),
            Err(DaiError::AmountOverflow(_))
        ));
        assert!(matches!(
            BAT.wei(U256::MAX) + BAT.wei(U256::from(1u64)),
            Err(DaiError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_mixed_currencies_are_rejected() {
        let err = (BAT.amount(1) + MDAI.amount(1)).unwrap_err();
        assert_eq!(err.to_string(), "Currency mismatch: cannot combine BAT with MDAI");
    }

    #[test]
    fn test_display() {
        assert_eq!(MDAI.amount(12).to_string(), "12 MDAI");
        assert_eq!(USDC.wei(U256::from(1_500_000u64)).to_string(), "1.5 USDC");
    }
}
