use {
    super::{Harness, steps},
    crate::{
        domain::{action::Kind, eth, status::Step},
        infra::contracts::IOmniVault,
        tests,
    },
    alloy::sol_types::SolCall,
};

#[tokio::test]
async fn borrow_is_signed_on_the_hub_without_approval() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);

    let handle = harness.perform(Kind::Borrow, eth::NetworkId::BscTestnet, "25");
    let log = handle.log().clone();
    let receipt = handle.outcome().await.unwrap();

    assert_eq!(
        steps(&log),
        vec![Step::GasEstimated, Step::Submitted, Step::Confirmed]
    );
    assert_eq!(harness.chain.switches(), vec![eth::NetworkId::ZetaAthens]);

    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].network, eth::NetworkId::ZetaAthens);
    assert_eq!(sent[0].tx.to, tests::HUB);
    assert_eq!(sent[0].hash, receipt.transaction_hash);

    let call = IOmniVault::requestBorrowCrossChainCall::abi_decode(&sent[0].tx.input).unwrap();
    assert_eq!(call.asset, tests::HUB_USDC.0);
    assert_eq!(call.amount, eth::U256::from(25_000_000));
    assert_eq!(call.destChainId, 97);

    let last = log.last().unwrap();
    assert_eq!(last.message, "borrow of 25 USDC confirmed");
    assert!(
        last.explorer_url
            .unwrap()
            .as_str()
            .starts_with("https://zeta-athens.explorer.test/tx/")
    );
}

#[tokio::test]
async fn withdraw_pays_out_on_networks_without_an_executor() {
    let harness = Harness::new(eth::NetworkId::ZetaAthens);

    let handle = harness.perform(Kind::Withdraw, eth::NetworkId::AvalancheFuji, "3");
    handle.outcome().await.unwrap();

    assert!(harness.chain.switches().is_empty());
    let sent = harness.chain.sent();
    let call = IOmniVault::requestWithdrawCrossChainCall::abi_decode(&sent[0].tx.input).unwrap();
    assert_eq!(call.destChainId, 43113);
    assert_eq!(call.amount, eth::U256::from(3_000_000));
}
