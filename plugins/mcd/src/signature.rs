//! Method signatures in the `name(inputs)(outputs)` form used by call descriptors
//!
//! `balanceOf(address)(uint256)` names the function, its parameter types and
//! its return types. The selector is derived from the first two parts.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{keccak256, Bytes, U256};
use dai_error::{DaiError, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed method signature
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    raw: String,
    name: String,
    inputs: Vec<DynSolType>,
    outputs: Vec<DynSolType>,
    selector: [u8; 4],
}

impl MethodSignature {
    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types
    pub fn inputs(&self) -> &[DynSolType] {
        &self.inputs
    }

    /// Return types
    pub fn outputs(&self) -> &[DynSolType] {
        &self.outputs
    }

    /// 4-byte function selector
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Canonical `name(type,type)` form the selector is hashed from
    pub fn canonical(&self) -> String {
        let inputs: Vec<_> = self.inputs.iter().map(|t| t.sol_type_name()).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// ABI-encode calldata from string arguments
    pub fn encode_call<S: AsRef<str>>(&self, args: &[S]) -> Result<Bytes> {
        if args.len() != self.inputs.len() {
            return Err(DaiError::AbiError(format!(
                "{} expects {} arguments, got {}",
                self.raw,
                self.inputs.len(),
                args.len()
            )));
        }

        let values = self
            .inputs
            .iter()
            .zip(args)
            .map(|(ty, arg)| coerce_arg(ty, arg.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut calldata = self.selector.to_vec();
        calldata.extend(DynSolValue::Tuple(values).abi_encode_params());
        Ok(calldata.into())
    }

    /// Decode the single `uint256` return value
    pub fn decode_uint(&self, data: &[u8]) -> Result<U256> {
        if self.outputs != [DynSolType::Uint(256)] {
            return Err(DaiError::AbiError(format!(
                "{} does not return a single uint256",
                self.raw
            )));
        }
        if data.len() < 32 {
            return Err(DaiError::AbiError(format!(
                "{} returned {} bytes, expected 32",
                self.raw,
                data.len()
            )));
        }
        Ok(U256::from_be_slice(&data[..32]))
    }
}

fn coerce_arg(ty: &DynSolType, arg: &str) -> Result<DynSolValue> {
    ty.coerce_str(arg).map_err(|e| match ty {
        DynSolType::Address => DaiError::InvalidAddress {
            address: arg.to_string(),
            reason: e.to_string(),
        },
        _ => DaiError::AbiError(format!("cannot encode '{arg}' as {}: {e}", ty.sol_type_name())),
    })
}

fn parse_types(list: &str) -> std::result::Result<Vec<DynSolType>, String> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    match DynSolType::parse(&format!("({list})")).map_err(|e| e.to_string())? {
        DynSolType::Tuple(types) => Ok(types),
        single => Ok(vec![single]),
    }
}

/// Index of the parenthesis closing the group opened at `s[0]`
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

impl FromStr for MethodSignature {
    type Err = DaiError;

    fn from_str(signature: &str) -> Result<Self> {
        let invalid = |reason: String| DaiError::InvalidSignature {
            signature: signature.to_string(),
            reason,
        };

        let open = signature
            .find('(')
            .ok_or_else(|| invalid("missing parameter list".into()))?;
        let name = &signature[..open];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(format!("bad function name '{name}'")));
        }

        let rest = &signature[open..];
        let close = closing_paren(rest).ok_or_else(|| invalid("unbalanced parentheses".into()))?;
        let inputs = parse_types(&rest[1..close]).map_err(&invalid)?;

        let tail = &rest[close + 1..];
        let outputs = if tail.is_empty() {
            Vec::new()
        } else {
            let end = closing_paren(tail)
                .filter(|end| tail.starts_with('(') && *end == tail.len() - 1)
                .ok_or_else(|| invalid("malformed return list".into()))?;
            parse_types(&tail[1..end]).map_err(&invalid)?
        };

        let mut parsed = Self {
            raw: signature.to_string(),
            name: name.to_string(),
            inputs,
            outputs,
            selector: [0; 4],
        };
        let hash = keccak256(parsed.canonical().as_bytes());
        parsed.selector.copy_from_slice(&hash[..4]);
        Ok(parsed)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const SPENDER: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn test_balance_of_selector_and_encoding() {
        let sig: MethodSignature = "balanceOf(address)(uint256)".parse().unwrap();
        assert_eq!(sig.name(), "balanceOf");
        assert_eq!(sig.canonical(), "balanceOf(address)");
        // balanceOf(address) function selector is 0x70a08231
        assert_eq!(sig.selector(), [0x70, 0xa0, 0x82, 0x31]);

        let encoded = sig.encode_call(&[ACCOUNT]).unwrap();
        // 4 selector + 32 address
        assert_eq!(encoded.len(), 36);
        assert_eq!(&encoded[..4], &[0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_allowance_selector_and_encoding() {
        let sig: MethodSignature = "allowance(address,address)(uint256)".parse().unwrap();
        assert_eq!(sig.selector(), [0xdd, 0x62, 0xed, 0x3e]);
        let encoded = sig.encode_call(&[ACCOUNT, SPENDER]).unwrap();
        assert_eq!(encoded.len(), 68);
    }

    #[test]
    fn test_get_eth_balance_selector() {
        let sig: MethodSignature = "getEthBalance(address)(uint256)".parse().unwrap();
        assert_eq!(sig.selector(), [0x4d, 0x23, 0x01, 0xcc]);
    }

    #[test]
    fn test_no_inputs() {
        let sig: MethodSignature = "totalSupply()(uint256)".parse().unwrap();
        assert!(sig.inputs().is_empty());
        assert_eq!(sig.selector(), [0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(sig.encode_call::<&str>(&[]).unwrap().len(), 4);
    }

    #[test]
    fn test_wrong_arity() {
        let sig: MethodSignature = "balanceOf(address)(uint256)".parse().unwrap();
        assert!(matches!(sig.encode_call(&[ACCOUNT, SPENDER]), Err(DaiError::AbiError(_))));
    }

    #[test]
    fn test_invalid_address_argument() {
        let sig: MethodSignature = "balanceOf(address)(uint256)".parse().unwrap();
        let err = sig.encode_call(&["0x1234"]).unwrap_err();
        assert!(matches!(err, DaiError::InvalidAddress { ref address, .. } if address == "0x1234"));
    }

    #[test]
    fn test_decode_uint() {
        let sig: MethodSignature = "balanceOf(address)(uint256)".parse().unwrap();
        let value = U256::from(1000u64);
        let data = value.to_be_bytes::<32>();
        assert_eq!(sig.decode_uint(&data).unwrap(), value);
        assert!(sig.decode_uint(&data[..16]).is_err());

        let no_return: MethodSignature = "approve(address,uint256)".parse().unwrap();
        assert!(no_return.outputs().is_empty());
        assert!(no_return.decode_uint(&data).is_err());
    }

    #[test]
    fn test_malformed_signatures() {
        for bad in [
            "balanceOf",
            "(address)(uint256)",
            "balanceOf(address",
            "bal ance(address)",
            "balanceOf(address)uint256",
        ] {
            assert!(
                matches!(bad.parse::<MethodSignature>(), Err(DaiError::InvalidSignature { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_display_keeps_original_text() {
        let sig: MethodSignature = "allowance(address,address)(uint256)".parse().unwrap();
        assert_eq!(sig.to_string(), "allowance(address,address)(uint256)");
    }
}
