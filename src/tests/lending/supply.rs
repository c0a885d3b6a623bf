use {
    super::{Harness, steps},
    crate::{
        domain::{action::Kind, eth, status::Step},
        infra::contracts::{IERC20, IOmniExecutor},
        tests::{self, mock::chain},
    },
    alloy::sol_types::SolCall,
    futures::StreamExt,
};

#[tokio::test]
async fn approves_then_supplies() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);

    let handle = harness.perform(Kind::Supply, eth::NetworkId::BaseSepolia, "100");
    let updates = handle.updates();
    let log = handle.log().clone();
    let receipt = handle.outcome().await.unwrap();

    assert_eq!(
        steps(&log),
        vec![
            Step::ApprovalRequired,
            Step::ApprovalConfirmed,
            Step::GasEstimated,
            Step::Submitted,
            Step::Confirmed,
        ]
    );
    let streamed = updates.collect::<Vec<_>>().await;
    assert_eq!(streamed, log.history());

    let last = log.last().unwrap();
    assert!(log.is_finished());
    assert_eq!(last.success, Some(true));
    assert!(!last.is_processing);
    assert_eq!(last.transaction_hash, Some(receipt.transaction_hash));
    assert_eq!(
        last.explorer_url.unwrap().as_str(),
        format!(
            "https://base-sepolia.explorer.test/tx/{}",
            receipt.transaction_hash
        )
    );

    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].selector(), IERC20::approveCall::SELECTOR);
    assert_eq!(sent[0].tx.to.0, tests::BASE_USDC.0);
    assert_eq!(sent[1].selector(), IOmniExecutor::supplyToZetaCall::SELECTOR);
    assert_eq!(sent[1].tx.to, tests::BASE_EXECUTOR);
    assert_eq!(sent[1].tx.from, tests::OWNER);
    assert_eq!(sent[1].gas, chain::ESTIMATE.with_margin(30));
    assert_eq!(sent[1].hash, receipt.transaction_hash);
    assert!(
        sent.iter()
            .all(|sent| sent.network == eth::NetworkId::BaseSepolia)
    );
    assert_eq!(
        harness
            .chain
            .allowance(tests::BASE_USDC, tests::OWNER, tests::BASE_EXECUTOR),
        eth::U256::from(100_000_000)
    );
}

#[tokio::test]
async fn skips_approval_with_sufficient_allowance() {
    let harness = Harness::new(eth::NetworkId::BaseSepolia);
    harness.approve_base_executor();

    let handle = harness.perform(Kind::Supply, eth::NetworkId::BaseSepolia, "0.5");
    let log = handle.log().clone();
    handle.outcome().await.unwrap();

    assert_eq!(
        steps(&log),
        vec![Step::GasEstimated, Step::Submitted, Step::Confirmed]
    );
    let sent = harness.chain.sent();
    assert_eq!(sent.len(), 1);
    let call = IOmniExecutor::supplyToZetaCall::abi_decode(&sent[0].tx.input).unwrap();
    assert_eq!(call.amount, eth::U256::from(500_000));
}

#[tokio::test]
async fn repay_uses_decimals_of_the_source_network() {
    let harness = Harness::new(eth::NetworkId::BscTestnet);

    let handle = harness.perform(Kind::Repay, eth::NetworkId::BscTestnet, "1.5");
    handle.outcome().await.unwrap();

    let sent = harness.chain.sent();
    let approve = IERC20::approveCall::abi_decode(&sent[0].tx.input).unwrap();
    let repay = IOmniExecutor::repayToZetaCall::abi_decode(&sent[1].tx.input).unwrap();
    let units = eth::U256::from(1_500_000_000_000_000_000_u128);
    assert_eq!(approve.spender, tests::BSC_EXECUTOR.0);
    assert_eq!(approve.amount, units);
    assert_eq!(repay.asset, tests::BSC_USDC.0);
    assert_eq!(repay.amount, units);
}

#[tokio::test]
async fn switches_the_wallet_to_the_source_network() {
    let harness = Harness::new(eth::NetworkId::ZetaAthens);
    harness.approve_base_executor();

    let handle = harness.perform(Kind::Supply, eth::NetworkId::BaseSepolia, "1");
    handle.outcome().await.unwrap();

    assert_eq!(harness.chain.switches(), vec![eth::NetworkId::BaseSepolia]);
    assert_eq!(harness.chain.sent()[0].network, eth::NetworkId::BaseSepolia);

    // The token and executor bindings were built before the switch and
    // are rebuilt on the next use.
    assert_eq!(harness.chain.connections(), 2);
    harness
        .lending
        .read_allowance(
            eth::NetworkId::BaseSepolia,
            crate::domain::asset::AssetId::Usdc,
            tests::OWNER,
        )
        .await
        .unwrap();
    assert_eq!(harness.chain.connections(), 3);
}
