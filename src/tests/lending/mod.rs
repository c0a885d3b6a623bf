use {
    crate::{
        domain::{
            action::Kind,
            asset::AssetId,
            eth,
            lending::{Config, Handle, Lending},
            status,
        },
        tests::{self, mock::chain::Chain},
    },
    std::sync::Arc,
};

mod borrow;
mod queries;
mod supply;

/// A lending service and a wallet sharing one fake chain.
pub struct Harness {
    pub chain: Arc<Chain>,
    pub lending: Lending,
}

impl Harness {
    /// The wallet starts out connected to `network`.
    pub fn new(network: eth::NetworkId) -> Self {
        let chain = Arc::new(Chain::new(tests::OWNER, network));
        let lending = Lending::new(
            tests::bindings(&chain),
            Config {
                polling: tests::fast_polling(),
                ..Default::default()
            },
        );
        Self { chain, lending }
    }

    pub fn perform(&self, kind: Kind, network: eth::NetworkId, amount: &str) -> Handle {
        self.lending
            .perform_action(kind, network, AssetId::Usdc, amount, self.chain.clone())
    }

    /// Lets the Base Sepolia executor pull any amount of USDC from the owner.
    pub fn approve_base_executor(&self) {
        self.chain.set_allowance(
            tests::BASE_USDC,
            tests::OWNER,
            tests::BASE_EXECUTOR,
            eth::U256::MAX,
        );
    }
}

pub fn steps(log: &status::Log) -> Vec<status::Step> {
    log.history().iter().map(|update| update.step).collect()
}
