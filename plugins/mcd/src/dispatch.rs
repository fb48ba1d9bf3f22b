//! Batched execution of encoded contract reads
//!
//! [`MulticallDispatcher`] sends every call of a batch in one `eth_call` to
//! the Multicall3 `aggregate3` entry point. [`StaticDispatcher`] answers from
//! an in-memory table and is meant for tests and offline use.

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use dai_contracts::{ContractRegistry, MULTICALL};
use dai_error::{DaiError, Result};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

sol! {
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Call3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external
            payable
            returns (Call3Result[] memory returnData);
    }
}

/// One contract read, ready to send
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedCall {
    /// Contract address
    pub target: Address,
    /// Selector followed by ABI-encoded arguments
    pub calldata: Bytes,
}

impl EncodedCall {
    /// Creates a call
    pub fn new(target: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            target,
            calldata: calldata.into(),
        }
    }
}

/// Executes a batch of reads, returning raw return data in call order
#[async_trait]
pub trait CallDispatcher: Send + Sync {
    /// Execute all calls; the result has one entry per call
    async fn dispatch(&self, calls: &[EncodedCall]) -> Result<Vec<Bytes>>;
}

/// Dispatcher aggregating each batch through the Multicall3 contract
///
/// The HTTP provider is built once and reused for every batch.
#[derive(Clone)]
pub struct MulticallDispatcher {
    rpc_url: String,
    provider: DynProvider,
    multicall: Address,
}

impl fmt::Debug for MulticallDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MulticallDispatcher")
            .field("rpc_url", &self.rpc_url)
            .field("multicall", &self.multicall)
            .finish()
    }
}

impl MulticallDispatcher {
    /// Creates a dispatcher for the given endpoint and Multicall3 address
    pub fn new(rpc_url: impl Into<String>, multicall: Address) -> Result<Self> {
        let rpc_url = rpc_url.into();
        let url = rpc_url.parse().map_err(|e| DaiError::RpcConnectionError {
            url: rpc_url.clone(),
            reason: format!("{e}"),
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self {
            rpc_url,
            provider,
            multicall,
        })
    }

    /// Creates a dispatcher using the `MULTICALL` entry of a connected registry
    pub fn from_registry(rpc_url: impl Into<String>, registry: &ContractRegistry) -> Result<Self> {
        Self::new(rpc_url, registry.address_of(MULTICALL)?)
    }

    /// RPC endpoint
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Multicall3 contract address
    pub fn multicall_address(&self) -> Address {
        self.multicall
    }

    fn encode_batch(calls: &[EncodedCall]) -> Bytes {
        let calls = calls
            .iter()
            .map(|call| IMulticall3::Call3 {
                target: call.target,
                allowFailure: false,
                callData: call.calldata.clone(),
            })
            .collect();
        IMulticall3::aggregate3Call { calls }.abi_encode().into()
    }

    fn decode_batch(data: &[u8], expected: usize) -> Result<Vec<Bytes>> {
        let results = IMulticall3::aggregate3Call::abi_decode_returns(data)
            .map_err(|e| DaiError::ContractError(format!("Decode error: {e}")))?;
        if results.len() != expected {
            return Err(DaiError::ContractError(format!(
                "multicall returned {} results for {expected} calls",
                results.len()
            )));
        }
        results
            .into_iter()
            .enumerate()
            .map(|(i, result)| {
                if result.success {
                    Ok(result.returnData)
                } else {
                    Err(DaiError::ContractError(format!("call {i} in batch failed")))
                }
            })
            .collect()
    }
}

#[async_trait]
impl CallDispatcher for MulticallDispatcher {
    async fn dispatch(&self, calls: &[EncodedCall]) -> Result<Vec<Bytes>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let tx = alloy::rpc::types::TransactionRequest::default()
            .to(self.multicall)
            .input(Self::encode_batch(calls).into());

        tracing::debug!(calls = calls.len(), multicall = %self.multicall, "dispatching batch");
        let result = self.provider.call(tx).await.map_err(|e| DaiError::RpcRequestError {
            method: "eth_call".to_string(),
            reason: format!("{e}"),
        })?;

        Self::decode_batch(&result, calls.len())
    }
}

/// Dispatcher answering from a fixed table of `uint256` results
///
/// Unknown calls fail the whole batch, like a reverting call inside an
/// `aggregate3` batch that does not allow failures.
#[derive(Debug, Default)]
pub struct StaticDispatcher {
    responses: DashMap<(Address, Bytes), U256>,
    batches: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticDispatcher {
    /// Creates an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `value` for the exact call
    pub fn set(&self, call: EncodedCall, value: U256) {
        self.responses.insert((call.target, call.calldata), value);
    }

    /// Answer `value` for `signature` called on `target` with `args`
    pub fn set_uint<S: AsRef<str>>(
        &self,
        target: Address,
        signature: &str,
        args: &[S],
        value: U256,
    ) -> Result<()> {
        let signature: crate::signature::MethodSignature = signature.parse()?;
        let calldata = signature.encode_call(args)?;
        self.set(EncodedCall::new(target, calldata), value);
        Ok(())
    }

    /// Number of batches dispatched so far
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Number of individual calls dispatched so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallDispatcher for StaticDispatcher {
    async fn dispatch(&self, calls: &[EncodedCall]) -> Result<Vec<Bytes>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.calls.fetch_add(calls.len(), Ordering::SeqCst);

        calls
            .iter()
            .map(|call| {
                self.responses
                    .get(&(call.target, call.calldata.clone()))
                    .map(|value| Bytes::from(value.to_be_bytes::<32>().to_vec()))
                    .ok_or_else(|| {
                        DaiError::ContractError(format!(
                            "execution reverted: no response at {}",
                            call.target
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::MethodSignature;
    use alloy::primitives::address;
    use alloy::sol_types::SolValue;

    const BAT: Address = address!("0D8775F648430679A709E98d2b0Cb6250d2887EF");
    const HOLDER: &str = "0x16fb96a5fa0427af0c8f7cf1eb4870231c8154b6";

    #[test]
    fn test_encode_batch_uses_aggregate3_selector() {
        let calls = [EncodedCall::new(BAT, vec![0x70u8, 0xa0, 0x82, 0x31])];
        let encoded = MulticallDispatcher::encode_batch(&calls);
        // aggregate3((address,bool,bytes)[]) selector is 0x82ad56cb
        assert_eq!(&encoded[..4], &[0x82, 0xad, 0x56, 0xcb]);
        assert_eq!(&encoded[..4], IMulticall3::aggregate3Call::SELECTOR.as_slice());
    }

    #[test]
    fn test_decode_batch() {
        let results = vec![
            IMulticall3::Call3Result {
                success: true,
                returnData: U256::from(7u64).abi_encode().into(),
            },
            IMulticall3::Call3Result {
                success: true,
                returnData: U256::ZERO.abi_encode().into(),
            },
        ];
        let data = (results,).abi_encode_params();
        let decoded = MulticallDispatcher::decode_batch(&data, 2).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(U256::from_be_slice(&decoded[0]), U256::from(7u64));

        assert!(matches!(
            MulticallDispatcher::decode_batch(&data, 3),
            Err(DaiError::ContractError(_))
        ));
    }

    #[test]
    fn test_decode_batch_rejects_failed_call() {
        let results = vec![IMulticall3::Call3Result {
            success: false,
            returnData: Bytes::new(),
        }];
        let data = (results,).abi_encode_params();
        assert!(MulticallDispatcher::decode_batch(&data, 1).is_err());
    }

    #[test]
    fn test_from_registry_requires_connection() {
        let registry = ContractRegistry::with_mainnet_defaults().unwrap();
        assert!(matches!(
            MulticallDispatcher::from_registry("http://localhost:8545", &registry),
            Err(DaiError::NetworkUnresolved)
        ));

        let mut registry = registry;
        registry.connect(1).unwrap();
        let dispatcher =
            MulticallDispatcher::from_registry("http://localhost:8545", &registry).unwrap();
        assert_eq!(
            dispatcher.multicall_address(),
            address!("cA11bde05977b3631167028862bE2a173976CA11")
        );
        assert_eq!(dispatcher.rpc_url(), "http://localhost:8545");
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        // nothing listens on this port; an attempted request would fail
        let dispatcher = MulticallDispatcher::new("http://127.0.0.1:1", Address::ZERO).unwrap();
        assert!(dispatcher.dispatch(&[]).await.unwrap().is_empty());
        // the provider is reused, so a second batch needs no new connection setup
        assert!(dispatcher.clone().dispatch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_url_rejected_at_construction() {
        let err = MulticallDispatcher::new("not a url", Address::ZERO).unwrap_err();
        assert!(matches!(err, DaiError::RpcConnectionError { ref url, .. } if url == "not a url"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_debug_omits_provider() {
        let dispatcher = MulticallDispatcher::new("http://localhost:8545", BAT).unwrap();
        let debug = format!("{dispatcher:?}");
        assert!(debug.starts_with("MulticallDispatcher"));
        assert!(debug.contains("http://localhost:8545"));
        assert!(!debug.contains("provider"));
    }

    #[tokio::test]
    async fn test_static_dispatcher() {
        let dispatcher = StaticDispatcher::new();
        dispatcher
            .set_uint(BAT, "balanceOf(address)(uint256)", &[HOLDER], U256::from(1000u64))
            .unwrap();

        let sig: MethodSignature = "balanceOf(address)(uint256)".parse().unwrap();
        let call = EncodedCall::new(BAT, sig.encode_call(&[HOLDER]).unwrap());
        let results = dispatcher.dispatch(&[call.clone(), call]).await.unwrap();
        assert_eq!(sig.decode_uint(&results[1]).unwrap(), U256::from(1000u64));
        assert_eq!(dispatcher.batches(), 1);
        assert_eq!(dispatcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_static_dispatcher_unknown_call_fails_batch() {
        let dispatcher = StaticDispatcher::new();
        let calls = [EncodedCall::new(BAT, vec![0u8; 4])];
        assert!(matches!(
            dispatcher.dispatch(&calls).await,
            Err(DaiError::ContractError(_))
        ));
    }
}
