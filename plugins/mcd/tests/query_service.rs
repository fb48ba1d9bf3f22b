//! Query service tests over an in-memory dispatcher

use alloy::primitives::address;
use dai_contracts::{ContractRegistry, Network};
use dai_error::DaiError;
use dai_plugin_mcd::prelude::*;
use dai_plugin_mcd::StaticDispatcher;
use dai_testing::*;
use std::str::FromStr;
use std::sync::Arc;

const BAT_ADDRESS: Address = address!("0D8775F648430679A709E98d2b0Cb6250d2887EF");
const WETH_ADDRESS: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
const MULTICALL_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

fn mainnet_service() -> QueryService<StaticDispatcher> {
    let mut registry = ContractRegistry::with_mainnet_defaults().unwrap();
    registry.set_network(Network::Mainnet);

    let dispatcher = StaticDispatcher::new();
    let balance_of = "balanceOf(address)(uint256)";
    dispatcher
        .set_uint(BAT_ADDRESS, balance_of, &[TEST_ADDRESS], BAT.amount(1000).raw())
        .unwrap();
    dispatcher
        .set_uint(WETH_ADDRESS, balance_of, &[TEST_ADDRESS], MWETH.amount(2).raw())
        .unwrap();
    dispatcher
        .set_uint(
            MULTICALL_ADDRESS,
            "getEthBalance(address)(uint256)",
            &[TEST_ADDRESS],
            U256::from(94_690_199_220_000_000_000u128),
        )
        .unwrap();
    dispatcher
        .set_uint(
            BAT_ADDRESS,
            "allowance(address,address)(uint256)",
            &[TEST_ADDRESS, PROXY_ADDRESS],
            U256::ZERO,
        )
        .unwrap();

    QueryService::new(Arc::new(registry), dispatcher)
}

#[tokio::test]
async fn test_mixed_batch_keeps_query_order() {
    let service = mainnet_service();
    let queries = [
        TokenQuery::balance(TEST_ADDRESS, "ETH"),
        TokenQuery::balance(TEST_ADDRESS, "BAT"),
        TokenQuery::allowance(TEST_ADDRESS, PROXY_ADDRESS, "BAT"),
        TokenQuery::balance(TEST_ADDRESS, "WETH"),
        TokenQuery::balance(TEST_ADDRESS, "MWETH"),
    ];
    let values = service.latest_many(&queries).await.unwrap();

    let eth = values[0].clone().into_currency().unwrap();
    assert_eq!(eth.symbol(), "ETH");
    assert_eq!(eth.to_decimal(), BigDecimal::from_str("94.69019922").unwrap());

    assert_eq!(values[1], SchemaValue::Currency(BAT.amount(1000)));
    assert_eq!(values[2], SchemaValue::Decimal(BigDecimal::from(0)));

    let weth = values[3].clone().into_currency().unwrap();
    assert_eq!(weth.symbol(), "MWETH");
    assert_eq!(values[3], values[4]);

    // WETH and MWETH share one call
    assert_eq!(service.dispatcher().batches(), 1);
    assert_eq!(service.dispatcher().calls(), 4);
}

#[tokio::test]
async fn test_query_errors_surface_before_dispatch() {
    let service = mainnet_service();

    let err = service.token_balance(TEST_ADDRESS, "NON_MCD_TOKEN").await.unwrap_err();
    assert_eq!(err.to_string(), "NON_MCD_TOKEN token is not part of the default tokens list");

    let err = service.token_balance(TEST_ADDRESS, "DSR-DAI").await.unwrap_err();
    assert!(matches!(err, DaiError::UnsupportedQuery(_)));

    assert_eq!(service.dispatcher().batches(), 0);
}

#[tokio::test]
async fn test_missing_response_fails_batch() {
    let service = mainnet_service();
    // no response registered for this holder
    let other = "0x1ad35418e7b7c5746ea42295a1100480a810256a";
    let queries = [
        TokenQuery::balance(TEST_ADDRESS, "BAT"),
        TokenQuery::balance(other, "BAT"),
    ];
    let err = service.latest_many(&queries).await.unwrap_err();
    assert!(matches!(err, DaiError::ContractError(_)));
}

#[tokio::test]
async fn test_contracts_from_testnet_config() {
    let config = testnet_contracts_from_json(
        r#"{"BAT": "0x00000000000000000000000000000000000000b1"}"#,
    )
    .unwrap();
    let mut registry = ContractRegistry::from_config(&config).unwrap();
    registry.connect(TESTNET_NETWORK_ID).unwrap();

    let dispatcher = StaticDispatcher::new();
    dispatcher
        .set_uint(
            address!("00000000000000000000000000000000000000b1"),
            "balanceOf(address)(uint256)",
            &[TEST_ADDRESS],
            BAT.amount(1000).raw(),
        )
        .unwrap();
    let service = QueryService::new(Arc::new(registry), dispatcher);

    assert_eq!(service.token_balance(TEST_ADDRESS, "BAT").await.unwrap(), BAT.amount(1000));

    // mainnet-only defaults have no testnet address
    let err = service.token_balance(TEST_ADDRESS, "DAI").await.unwrap_err();
    assert_eq!(err.to_string(), "Contract MCD_DAI has no address");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_service_with_cache() {
    let service = Arc::new(mainnet_service().with_cache(true));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.token_balance(TEST_ADDRESS, "BAT").await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), BAT.amount(1000));
    }

    // concurrent first reads may race, later reads hit the cache
    let before = service.dispatcher().batches();
    service.token_balance(TEST_ADDRESS, "BAT").await.unwrap();
    assert_eq!(service.dispatcher().batches(), before);

    service.on_new_block(1);
    assert_eq!(service.cached(), 0);
}
