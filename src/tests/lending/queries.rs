use {
    super::Harness,
    crate::{
        domain::{asset::AssetId, eth, lending::Error, registry::ConfigurationError},
        tests,
    },
};

fn usd(cents: u64) -> eth::U256 {
    eth::U256::from(cents) * eth::U256::from(10).pow(eth::U256::from(16))
}

#[tokio::test]
async fn reads_balances_with_network_decimals() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);
    harness
        .chain
        .set_balance(tests::BSC_USDC, tests::OWNER, usd(1_250));

    let balance = harness
        .lending
        .read_balance(eth::NetworkId::BscTestnet, AssetId::Usdc, tests::OWNER)
        .await
        .unwrap();
    assert_eq!(balance.decimals, 18);
    assert_eq!(balance.to_string(), "12.5");

    let allowance = harness
        .lending
        .read_allowance(eth::NetworkId::BaseSepolia, AssetId::Usdc, tests::OWNER)
        .await
        .unwrap();
    assert_eq!(allowance.raw, eth::U256::ZERO);
}

#[tokio::test]
async fn reads_the_hub_state() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);
    harness.chain.set_price(tests::HUB_USDC, usd(100));
    harness.chain.set_position(usd(200_000), usd(100_000), usd(160));
    harness.chain.set_liquidatable(true);

    let lending = &harness.lending;
    let price = lending.read_asset_price(AssetId::Usdc).await.unwrap();
    assert_eq!(price.to_string(), "$1");

    let position = lending.read_position(tests::OWNER).await.unwrap();
    assert_eq!(position.collateral_usd, usd(200_000));
    assert_eq!(
        position.to_string(),
        "collateral $2000, debt $1000, health factor 1.6"
    );
    assert!(lending.can_be_liquidated(tests::OWNER).await.unwrap());
}

#[tokio::test]
async fn unpriced_assets_surface_the_revert() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);

    let err = harness
        .lending
        .read_asset_price(AssetId::Eth)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported asset"));
}

#[tokio::test]
async fn queries_respect_the_registry() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);

    let result = harness
        .lending
        .read_balance(eth::NetworkId::AvalancheFuji, AssetId::Usdc, tests::OWNER)
        .await;
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::NotDeployed { .. }))
    ));
    assert_eq!(harness.chain.connections(), 0);
}

#[tokio::test]
async fn network_changes_drop_cached_bindings() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);

    harness.lending.read_position(tests::OWNER).await.unwrap();
    harness.lending.read_position(tests::OWNER).await.unwrap();
    assert_eq!(harness.chain.connections(), 1);

    harness.lending.on_network_changed();
    harness.lending.read_position(tests::OWNER).await.unwrap();
    assert_eq!(harness.chain.connections(), 2);
}
