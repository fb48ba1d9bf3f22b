//! Numeric and address helpers shared by the schemas and currency types.

use alloy::primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use dai_error::{DaiError, Result};
use std::str::FromStr;

/// Decimal places of a "wei"-denominated amount
pub const WEI_DECIMALS: u8 = 18;

/// Exact conversion of a 256-bit unsigned integer into a `BigInt`
pub fn u256_to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Interpret `raw` as an amount in the smallest unit of a token with `decimals` places
pub fn to_units(raw: U256, decimals: u8) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(raw), i64::from(decimals))
}

/// Divide a raw integer by 10^18, exactly
pub fn from_wei(raw: U256) -> BigDecimal {
    to_units(raw, WEI_DECIMALS)
}

/// Parse a raw on-chain integer given as decimal or `0x`-prefixed hex
pub fn parse_raw_amount(value: &str) -> Result<U256> {
    U256::from_str(value).map_err(|e| DaiError::FormatError(format!("'{value}': {e}")))
}

/// Whether `value` looks like a chain address: `0x` followed by 40 hex digits
///
/// No checksum validation is done.
pub fn is_valid_address_string(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UINT256_MAX: &str = "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    #[test]
    fn test_from_wei_uint256_max_is_exact() {
        let raw = parse_raw_amount(UINT256_MAX).unwrap();
        assert_eq!(raw, U256::MAX);

        let expected = BigDecimal::from_str(
            "115792089237316195423570985008687907853269984665640564039457.584007913129639935",
        )
        .unwrap();
        assert_eq!(from_wei(raw), expected);
    }

    #[test]
    fn test_from_wei_small_values() {
        assert_eq!(from_wei(U256::ZERO), BigDecimal::from(0));
        assert_eq!(
            from_wei(U256::from(1u64)),
            BigDecimal::from_str("0.000000000000000001").unwrap()
        );
        assert_eq!(
            from_wei(U256::from(1_500_000_000_000_000_000u128)),
            BigDecimal::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn test_to_units_uses_token_decimals() {
        // 1 USDC has 6 decimals
        assert_eq!(to_units(U256::from(1_000_000u64), 6), BigDecimal::from(1));
        assert_eq!(to_units(U256::from(250u64), 2), BigDecimal::from_str("2.5").unwrap());
    }

    #[test]
    fn test_u256_to_bigint() {
        assert_eq!(u256_to_bigint(U256::ZERO), BigInt::from(0));
        assert_eq!(u256_to_bigint(U256::from(u128::MAX)), BigInt::from(u128::MAX));
    }

    #[test]
    fn test_parse_raw_amount() {
        assert_eq!(parse_raw_amount("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_raw_amount("0x10").unwrap(), U256::from(16u64));
        assert!(matches!(parse_raw_amount("not a number"), Err(DaiError::FormatError(_))));
    }

    #[test]
    fn test_is_valid_address_string() {
        assert!(is_valid_address_string("0x570074CCb147ea3dE2E23fB038D4d78324278886"));
        assert!(is_valid_address_string("0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6"));
        // missing prefix
        assert!(!is_valid_address_string("570074CCb147ea3dE2E23fB038D4d78324278886"));
        // too short
        assert!(!is_valid_address_string("0x570074CC"));
        // non-hex
        assert!(!is_valid_address_string("0xZZ0074CCb147ea3dE2E23fB038D4d78324278886"));
        assert!(!is_valid_address_string(""));
    }
}
