//! An in-memory chain acting as both the node and the wallet of a test.
//!
//! Token allowances are tracked per token contract, so approvals sent by an
//! action are visible to the allowance reads that follow them. Every
//! broadcast transaction is mined immediately unless configured otherwise.

use {
    crate::{
        domain::eth,
        infra::{
            blockchain::{self, Node},
            contracts::{IERC20, IOmniVault},
            wallet::{self, Wallet},
        },
    },
    alloy::sol_types::{Revert, SolCall, SolError, SolValue},
    std::{
        collections::HashMap,
        sync::{Mutex, MutexGuard},
    },
};

/// Gas reported by every successful estimate.
pub const ESTIMATE: eth::Gas = eth::Gas(100_000);

/// The block the first broadcast transaction is mined in.
const FIRST_BLOCK: u64 = 100;

/// A transaction broadcast through the fake wallet.
#[derive(Clone, Debug)]
pub struct Sent {
    pub network: eth::NetworkId,
    pub tx: eth::Transaction,
    pub gas: eth::Gas,
    pub hash: eth::TxHash,
}

impl Sent {
    pub fn selector(&self) -> [u8; 4] {
        selector(&self.tx.input)
    }
}

pub struct Chain {
    owner: eth::Address,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    active: Option<eth::NetworkId>,
    allowances: HashMap<(eth::Address, eth::Address, eth::Address), eth::U256>,
    balances: HashMap<(eth::Address, eth::Address), eth::U256>,
    prices: HashMap<eth::Address, eth::U256>,
    position: (eth::U256, eth::U256, eth::U256),
    liquidatable: bool,
    approval_cap: Option<eth::U256>,
    failing_estimates: bool,
    rejections: usize,
    reverts: HashMap<[u8; 4], String>,
    never_mine: bool,
    sent: Vec<Sent>,
    receipts: HashMap<eth::TxHash, eth::Receipt>,
    switches: Vec<eth::NetworkId>,
    calls: usize,
    polls: usize,
    connections: usize,
}

impl Chain {
    pub fn new(owner: eth::Address, active: eth::NetworkId) -> Self {
        Self {
            owner,
            state: Mutex::new(State {
                active: Some(active),
                position: (eth::U256::ZERO, eth::U256::ZERO, eth::U256::MAX),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_allowance(
        &self,
        token: eth::TokenAddress,
        owner: eth::Address,
        spender: eth::ContractAddress,
        amount: eth::U256,
    ) {
        self.state()
            .allowances
            .insert((token.0, owner, spender.0), amount);
    }

    pub fn allowance(
        &self,
        token: eth::TokenAddress,
        owner: eth::Address,
        spender: eth::ContractAddress,
    ) -> eth::U256 {
        self.state()
            .allowances
            .get(&(token.0, owner, spender.0))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_balance(&self, token: eth::TokenAddress, owner: eth::Address, amount: eth::U256) {
        self.state().balances.insert((token.0, owner), amount);
    }

    pub fn set_price(&self, asset: eth::TokenAddress, usd: eth::U256) {
        self.state().prices.insert(asset.0, usd);
    }

    pub fn set_position(&self, collateral: eth::U256, debt: eth::U256, health: eth::U256) {
        self.state().position = (collateral, debt, health);
    }

    pub fn set_liquidatable(&self, liquidatable: bool) {
        self.state().liquidatable = liquidatable;
    }

    /// Approvals grant at most `cap`, whatever amount they request.
    pub fn cap_approvals(&self, cap: eth::U256) {
        self.state().approval_cap = Some(cap);
    }

    pub fn fail_estimates(&self) {
        self.state().failing_estimates = true;
    }

    /// The user declines the next `count` wallet requests to sign.
    pub fn reject_sends(&self, count: usize) {
        self.state().rejections = count;
    }

    /// Transactions calling the function with `selector` revert with
    /// `reason` once mined.
    pub fn revert_with(&self, selector: [u8; 4], reason: &str) {
        self.state().reverts.insert(selector, reason.to_owned());
    }

    /// Broadcast transactions stay pending forever.
    pub fn never_mine(&self) {
        self.state().never_mine = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.state().sent.clone()
    }

    pub fn switches(&self) -> Vec<eth::NetworkId> {
        self.state().switches.clone()
    }

    /// View calls executed against the chain, replays included.
    pub fn calls(&self) -> usize {
        self.state().calls
    }

    pub fn polls(&self) -> usize {
        self.state().polls
    }

    /// Records that a contract binding connected to this chain.
    pub fn connected(&self) {
        self.state().connections += 1;
    }

    pub fn connections(&self) -> usize {
        self.state().connections
    }
}

fn selector(input: &[u8]) -> [u8; 4] {
    input
        .get(..4)
        .and_then(|prefix| prefix.try_into().ok())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl Node for Chain {
    async fn call(
        &self,
        tx: &eth::Transaction,
        block: Option<u64>,
    ) -> Result<eth::Bytes, blockchain::Error> {
        let mut state = self.state();
        state.calls += 1;

        let input = &tx.input;
        let selector = selector(input);
        if let Some(reason) = block.and(state.reverts.get(&selector)) {
            let payload = Revert {
                reason: reason.clone(),
            }
            .abi_encode();
            return Err(blockchain::Error::Revert(payload.into()));
        }

        let output = match selector {
            IERC20::allowanceCall::SELECTOR => {
                let call = IERC20::allowanceCall::abi_decode(input).unwrap();
                state
                    .allowances
                    .get(&(tx.to.0, call.owner, call.spender))
                    .copied()
                    .unwrap_or_default()
                    .abi_encode()
            }
            IERC20::balanceOfCall::SELECTOR => {
                let call = IERC20::balanceOfCall::abi_decode(input).unwrap();
                state
                    .balances
                    .get(&(tx.to.0, call.owner))
                    .copied()
                    .unwrap_or_default()
                    .abi_encode()
            }
            IOmniVault::getAssetPriceUSDCall::SELECTOR => {
                let call = IOmniVault::getAssetPriceUSDCall::abi_decode(input).unwrap();
                match state.prices.get(&call.asset) {
                    Some(price) => price.abi_encode(),
                    None => {
                        let payload = Revert {
                            reason: "unsupported asset".to_owned(),
                        }
                        .abi_encode();
                        return Err(blockchain::Error::Revert(payload.into()));
                    }
                }
            }
            IOmniVault::getCrossChainPositionCall::SELECTOR => state.position.abi_encode_params(),
            IOmniVault::canBeLiquidatedCall::SELECTOR => state.liquidatable.abi_encode(),
            _ => {
                return Err(blockchain::Error::Rpc(format!(
                    "unexpected call to {}",
                    tx.to.0
                )));
            }
        };
        Ok(output.into())
    }

    async fn receipt(&self, hash: eth::TxHash) -> Result<Option<eth::Receipt>, blockchain::Error> {
        let mut state = self.state();
        state.polls += 1;
        if state.never_mine {
            return Ok(None);
        }
        Ok(state.receipts.get(&hash).copied())
    }
}

#[async_trait::async_trait]
impl Wallet for Chain {
    fn address(&self) -> eth::Address {
        self.owner
    }

    async fn active_network(&self) -> Result<eth::NetworkId, wallet::Error> {
        self.state()
            .active
            .ok_or_else(|| wallet::Error::Rpc("wallet disconnected".to_owned()))
    }

    async fn switch_network(&self, network: eth::NetworkId) -> Result<(), wallet::Error> {
        let mut state = self.state();
        state.switches.push(network);
        state.active = Some(network);
        Ok(())
    }

    async fn estimate_gas(&self, _: &eth::Transaction) -> Result<eth::Gas, wallet::Error> {
        if self.state().failing_estimates {
            return Err(wallet::Error::Rpc("execution reverted".to_owned()));
        }
        Ok(ESTIMATE)
    }

    async fn send_transaction(
        &self,
        tx: eth::Transaction,
        gas: eth::Gas,
    ) -> Result<eth::TxHash, wallet::Error> {
        let mut state = self.state();
        if state.rejections > 0 {
            state.rejections -= 1;
            return Err(wallet::Error::Rejected);
        }
        let network = state
            .active
            .ok_or_else(|| wallet::Error::Rpc("wallet disconnected".to_owned()))?;

        let nonce = state.sent.len() as u64;
        let hash = eth::TxHash(eth::B256::with_last_byte(nonce as u8 + 1));
        let reverts = state.reverts.contains_key(&selector(&tx.input));
        if !reverts && selector(&tx.input) == IERC20::approveCall::SELECTOR {
            let call = IERC20::approveCall::abi_decode(&tx.input).unwrap();
            let granted = match state.approval_cap {
                Some(cap) => call.amount.min(cap),
                None => call.amount,
            };
            state
                .allowances
                .insert((tx.to.0, tx.from, call.spender), granted);
        }

        state.receipts.insert(
            hash,
            eth::Receipt {
                transaction_hash: hash,
                status: if reverts {
                    eth::Status::Reverted
                } else {
                    eth::Status::Success
                },
                block_number: FIRST_BLOCK + nonce,
                gas_used: eth::Gas(gas.0 / 2),
            },
        );
        state.sent.push(Sent {
            network,
            tx,
            gas,
            hash,
        });
        Ok(hash)
    }
}
