//! Query service resolving token schemas against the chain
//!
//! Queries are turned into call descriptors, deduplicated by descriptor id,
//! encoded against the contract registry and sent to the dispatcher as a
//! single batch. Raw results can be cached per id until the next block.

use crate::currency::CurrencyAmount;
use crate::dispatch::{CallDispatcher, EncodedCall};
use crate::schemas::{CallDescriptor, SchemaValue, TokenQuery};
use crate::signature::MethodSignature;
use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use dai_contracts::ContractRegistry;
use dai_error::{DaiError, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolves [`TokenQuery`]s through a [`CallDispatcher`]
#[derive(Debug)]
pub struct QueryService<D> {
    registry: Arc<ContractRegistry>,
    dispatcher: D,
    cache: DashMap<String, U256>,
    block: AtomicU64,
    enable_cache: bool,
}

impl<D: CallDispatcher> QueryService<D> {
    /// Creates a service with caching disabled
    pub fn new(registry: Arc<ContractRegistry>, dispatcher: D) -> Self {
        Self {
            registry,
            dispatcher,
            cache: DashMap::new(),
            block: AtomicU64::new(0),
            enable_cache: false,
        }
    }

    /// Enables or disables the per-block result cache
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Contract registry used to resolve call targets
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Underlying dispatcher
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Latest value of a single query
    pub async fn latest(&self, query: &TokenQuery) -> Result<SchemaValue> {
        self.latest_many(std::slice::from_ref(query))
            .await?
            .pop()
            .ok_or_else(|| DaiError::Other("empty query result".to_string()))
    }

    /// Latest values of several queries, in query order
    ///
    /// Every query is validated before anything is sent. Queries sharing a
    /// descriptor id are executed once.
    pub async fn latest_many(&self, queries: &[TokenQuery]) -> Result<Vec<SchemaValue>> {
        let descriptors = queries
            .iter()
            .map(TokenQuery::generate)
            .collect::<Result<Vec<_>>>()?;

        let mut raw: HashMap<&str, U256> = HashMap::new();
        let mut pending: Vec<(&CallDescriptor, MethodSignature)> = Vec::new();
        let mut calls = Vec::new();
        for descriptor in &descriptors {
            if raw.contains_key(descriptor.id.as_str())
                || pending.iter().any(|(d, _)| d.id == descriptor.id)
            {
                continue;
            }
            if self.enable_cache {
                if let Some(value) = self.cache.get(&descriptor.id) {
                    tracing::trace!(id = %descriptor.id, "query cache hit");
                    raw.insert(&descriptor.id, *value);
                    continue;
                }
            }
            let (call, signature) = self.encode(descriptor)?;
            calls.push(call);
            pending.push((descriptor, signature));
        }

        if !calls.is_empty() {
            tracing::debug!(
                queries = queries.len(),
                calls = calls.len(),
                "dispatching token queries"
            );
            let block = self.block.load(Ordering::SeqCst);
            let results = self.dispatcher.dispatch(&calls).await?;
            // a block reported while the batch was in flight makes these results stale
            let cacheable = self.enable_cache && self.block.load(Ordering::SeqCst) == block;
            if results.len() != calls.len() {
                return Err(DaiError::ContractError(format!(
                    "dispatcher returned {} results for {} calls",
                    results.len(),
                    calls.len()
                )));
            }
            for ((descriptor, signature), data) in pending.iter().zip(&results) {
                let value = signature.decode_uint(data)?;
                if cacheable {
                    self.cache.insert(descriptor.id.clone(), value);
                }
                raw.insert(&descriptor.id, value);
            }
        }

        queries
            .iter()
            .zip(&descriptors)
            .map(|(query, descriptor)| {
                let value = raw
                    .get(descriptor.id.as_str())
                    .copied()
                    .ok_or_else(|| DaiError::Other(format!("no result for {}", descriptor.id)))?;
                descriptor.transform(query.output_tag(), value).ok_or_else(|| {
                    DaiError::UnsupportedQuery(format!(
                        "{} does not return {}",
                        descriptor.id,
                        query.output_tag()
                    ))
                })
            })
            .collect()
    }

    /// Balance of `symbol` held by `address`
    pub async fn token_balance(&self, address: &str, symbol: &str) -> Result<CurrencyAmount> {
        self.latest(&TokenQuery::balance(address, symbol))
            .await?
            .into_currency()
            .ok_or_else(|| DaiError::Other("token balance is not a currency amount".to_string()))
    }

    /// Allowance of `symbol` granted by `owner` to `spender`
    pub async fn token_allowance(
        &self,
        owner: &str,
        spender: &str,
        symbol: &str,
    ) -> Result<BigDecimal> {
        self.latest(&TokenQuery::allowance(owner, spender, symbol))
            .await?
            .into_decimal()
            .ok_or_else(|| DaiError::Other("token allowance is not a decimal".to_string()))
    }

    /// Drop cached results when the chain moves past the last seen block
    pub fn on_new_block(&self, block: u64) {
        let previous = self.block.fetch_max(block, Ordering::SeqCst);
        if block > previous {
            let dropped = self.cache.len();
            self.cache.clear();
            tracing::trace!(block, dropped, "new block, query cache cleared");
        }
    }

    /// Last block reported through [`Self::on_new_block`]
    pub fn current_block(&self) -> u64 {
        self.block.load(Ordering::SeqCst)
    }

    /// Number of cached results
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn encode(&self, descriptor: &CallDescriptor) -> Result<(EncodedCall, MethodSignature)> {
        let target = self.registry.address_of(&descriptor.contract)?;
        let signature = descriptor.signature()?;
        let calldata = signature.encode_call(&descriptor.args)?;
        Ok((EncodedCall::new(target, calldata), signature))
    }
}
