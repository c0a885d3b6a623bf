//! Orchestration of cross-chain lending actions.
//!
//! An action runs as a single task which steps strictly in order through
//! the allowance check, the optional approval, gas estimation, submission
//! and receipt polling. Every step is reported on the action's status log
//! and the log always ends with exactly one terminal update, unless the
//! task is cancelled.

pub mod approval;
pub mod poller;
mod query;
pub mod submitter;

pub use self::query::{Balance, Position, Price};
use {
    crate::{
        domain::{
            action::{Kind, PendingAction},
            amount::{self, InvalidAmount},
            asset::{AssetId, Deployment},
            eth,
            registry::{ConfigurationError, Registry, Role},
            status,
        },
        infra::{
            blockchain,
            contracts::{self, BindingFactory, IOmniExecutor, IOmniVault},
            metrics,
            wallet::{self, Wallet},
        },
    },
    alloy::sol_types::SolCall,
    std::sync::Arc,
    tracing::Instrument,
};

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub approval: approval::Policy,
    pub gas: submitter::GasPolicy,
    pub polling: poller::Policy,
    pub cross_chain: CrossChain,
}

/// Options attached to calls the protocol relays to another chain.
#[derive(Clone, Copy, Debug)]
pub struct CrossChain {
    /// Gas available to the relayed call on the destination chain.
    pub gas_limit: eth::Gas,
    /// Gas available to the revert handler when the relayed call fails.
    pub on_revert_gas_limit: eth::Gas,
}

impl Default for CrossChain {
    fn default() -> Self {
        Self {
            gas_limit: eth::Gas(500_000),
            on_revert_gas_limit: eth::Gas(500_000),
        }
    }
}

/// What the steps of a single action run against.
pub struct Context<'a> {
    pub bindings: &'a BindingFactory,
    pub config: &'a Config,
    pub wallet: &'a dyn Wallet,
}

/// Entry point for lending actions and queries.
#[derive(Clone)]
pub struct Lending {
    inner: Arc<Inner>,
}

struct Inner {
    bindings: BindingFactory,
    config: Config,
}

impl Lending {
    pub fn new(bindings: BindingFactory, config: Config) -> Self {
        Self {
            inner: Arc::new(Inner { bindings, config }),
        }
    }

    pub fn registry(&self) -> &Registry {
        self.inner.bindings.registry()
    }

    /// Starts a lending action and returns immediately.
    ///
    /// For supply and repay `network` is the satellite network the funds come
    /// from. For borrow and withdraw it is the network the funds are paid
    /// out on, while the transaction itself is signed on the hub.
    pub fn perform_action(
        &self,
        kind: Kind,
        network: eth::NetworkId,
        asset: AssetId,
        amount: impl Into<String>,
        wallet: Arc<dyn Wallet>,
    ) -> Handle {
        let action = PendingAction::new(kind, network, asset, amount, wallet.address());
        let (reporter, log) = status::channel();
        let span = tracing::info_span!(
            "action",
            %kind,
            %network,
            %asset,
            amount = %action.amount,
            origin = %action.origin,
        );

        let inner = self.inner.clone();
        let task = tokio::spawn({
            let action = action.clone();
            async move { inner.run(&action, wallet.as_ref(), reporter).await }.instrument(span)
        });

        Handle { action, log, task }
    }

    /// Must be called whenever the signing identity switches networks
    /// outside of an action.
    pub fn on_network_changed(&self) {
        self.inner.bindings.invalidate();
    }
}

impl Inner {
    async fn run(
        &self,
        action: &PendingAction,
        wallet: &dyn Wallet,
        mut reporter: status::Reporter,
    ) -> Result<eth::Receipt, Error> {
        let registry = self.bindings.registry();
        let ctx = Context {
            bindings: &self.bindings,
            config: &self.config,
            wallet,
        };

        let result = match Plan::new(registry, &self.config, action) {
            Ok(plan) => execute(&ctx, &plan, &mut reporter).await,
            Err(err) => Err(err),
        };
        let network = signing_network(registry, action);

        match &result {
            Ok(receipt) => {
                tracing::info!(
                    hash = %receipt.transaction_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used.0,
                    "action confirmed"
                );
                let symbol = registry
                    .asset(action.asset)
                    .map(|asset| asset.symbol.clone())
                    .unwrap_or_else(|_| action.asset.to_string());
                reporter.succeed(
                    format!(
                        "{} of {} {symbol} confirmed",
                        action.kind,
                        action.amount.trim(),
                    ),
                    Some(link(registry, network, receipt.transaction_hash)),
                );
                metrics::action(action.kind, "confirmed");
            }
            Err(err) => {
                tracing::warn!(?err, "action failed");
                let step = err.step();
                reporter.fail(
                    step,
                    err.user_message(),
                    err.transaction_hash()
                        .map(|hash| link(registry, network, hash)),
                );
                metrics::action(action.kind, step.label());
            }
        }
        result
    }
}

/// A running action.
pub struct Handle {
    pub action: PendingAction,
    log: status::Log,
    task: tokio::task::JoinHandle<Result<eth::Receipt, Error>>,
}

impl Handle {
    pub fn log(&self) -> &status::Log {
        &self.log
    }

    /// Streams every status update of the action, starting with the first.
    pub fn updates(&self) -> status::Updates {
        self.log.subscribe()
    }

    /// Waits for the action to reach a terminal state.
    pub async fn outcome(self) -> Result<eth::Receipt, Error> {
        self.task.await.unwrap_or(Err(Error::Abandoned))
    }

    /// Stops the action without waiting for its outcome. A transaction that
    /// was already broadcast is not recalled and may still settle, so the
    /// action is left abandoned rather than failed.
    pub fn cancel(self) {
        self.task.abort();
    }
}

/// An action resolved against the registry, ready to be executed.
#[derive(Debug)]
struct Plan {
    /// The network the transaction is signed on.
    network: eth::NetworkId,
    target: Role,
    asset: AssetId,
    deployment: Deployment,
    amount: eth::U256,
    input: eth::Bytes,
    /// The contract pulling the tokens, if the action moves value.
    spender: Option<eth::ContractAddress>,
}

impl Plan {
    /// Resolves an action without touching the network.
    fn new(registry: &Registry, config: &Config, action: &PendingAction) -> Result<Self, Error> {
        registry.network(action.network)?;
        registry.asset(action.asset)?;
        match action.kind {
            Kind::Supply | Kind::Repay => Self::to_hub(registry, config, action),
            Kind::Borrow | Kind::Withdraw => Self::from_hub(registry, config, action),
        }
    }

    fn to_hub(registry: &Registry, config: &Config, action: &PendingAction) -> Result<Self, Error> {
        let deployment = registry.deployment(action.asset, action.network)?;
        let amount = normalize(&action.amount, &deployment)?;
        let executor = registry.contract(action.network, Role::Executor)?;

        let revert_options = IOmniExecutor::RevertOptions {
            revertAddress: executor.0,
            callOnRevert: true,
            abortAddress: eth::Address::ZERO,
            revertMessage: eth::Bytes::new(),
            onRevertGasLimit: eth::U256::from(config.cross_chain.on_revert_gas_limit.0),
        };
        let input = if action.kind == Kind::Supply {
            IOmniExecutor::supplyToZetaCall {
                asset: deployment.token.0,
                amount,
                revertOptions: revert_options,
            }
            .abi_encode()
        } else {
            IOmniExecutor::repayToZetaCall {
                asset: deployment.token.0,
                amount,
                revertOptions: revert_options,
            }
            .abi_encode()
        };

        Ok(Self {
            network: action.network,
            target: Role::Executor,
            asset: action.asset,
            deployment,
            amount,
            input: input.into(),
            spender: Some(executor),
        })
    }

    fn from_hub(
        registry: &Registry,
        config: &Config,
        action: &PendingAction,
    ) -> Result<Self, Error> {
        let hub = registry.hub().id;
        let deployment = registry.deployment(action.asset, hub)?;
        let amount = normalize(&action.amount, &deployment)?;
        let vault = registry.contract(hub, Role::Hub)?;
        let destination = u16::try_from(registry.network(action.network)?.chain_id)
            .map_err(|_| ConfigurationError::UnroutableDestination(action.network))?;

        let call_options = IOmniVault::CallOptions {
            gasLimit: eth::U256::from(config.cross_chain.gas_limit.0),
            isArbitraryCall: true,
        };
        let revert_options = IOmniVault::RevertOptions {
            onRevert: true,
            revertAddress: vault.0,
        };
        let input = if action.kind == Kind::Borrow {
            IOmniVault::requestBorrowCrossChainCall {
                asset: deployment.token.0,
                amount,
                destChainId: destination,
                callOptions: call_options,
                revertOptions: revert_options,
            }
            .abi_encode()
        } else {
            IOmniVault::requestWithdrawCrossChainCall {
                asset: deployment.token.0,
                amount,
                destChainId: destination,
                callOptions: call_options,
                revertOptions: revert_options,
            }
            .abi_encode()
        };

        Ok(Self {
            network: hub,
            target: Role::Hub,
            asset: action.asset,
            deployment,
            amount,
            input: input.into(),
            spender: None,
        })
    }
}

async fn execute(
    ctx: &Context<'_>,
    plan: &Plan,
    reporter: &mut status::Reporter,
) -> Result<eth::Receipt, Error> {
    let registry = ctx.bindings.registry();
    let origin = ctx.wallet.address();

    if let Some(spender) = plan.spender {
        let token = ctx
            .bindings
            .get(plan.network, Role::Token(plan.asset))
            .await?;
        let symbol = &registry.asset(plan.asset)?.symbol;
        approval::ensure_allowance(
            ctx,
            &token,
            approval::Request {
                owner: origin,
                spender,
                required: plan.amount,
                decimals: plan.deployment.decimals,
                symbol,
            },
            reporter,
        )
        .instrument(tracing::debug_span!("approval", spender = ?spender.0))
        .await?;
    }

    let target = ctx.bindings.get(plan.network, plan.target).await?;
    let tx = target.transaction(origin, plan.input.clone());
    let prepared = submitter::prepare(ctx, plan.network, tx.clone()).await?;
    let message = if prepared.estimated {
        format!("gas limit set to {}", prepared.gas.0)
    } else {
        format!("gas estimation unavailable, using gas limit {}", prepared.gas.0)
    };
    reporter.progress(status::Step::GasEstimated, message, None);

    let hash = submitter::broadcast(ctx, prepared).await?;
    reporter.progress(
        status::Step::Submitted,
        "transaction submitted, waiting for confirmation",
        Some(link(registry, plan.network, hash)),
    );

    poller::confirm(target.node(), &tx, hash, &ctx.config.polling)
        .instrument(tracing::debug_span!("receipt", %hash))
        .await
}

fn normalize(amount: &str, deployment: &Deployment) -> Result<eth::U256, InvalidAmount> {
    let units = amount::normalize(amount, deployment)?;
    if units.is_zero() {
        return Err(InvalidAmount::Zero);
    }
    Ok(units)
}

fn signing_network(registry: &Registry, action: &PendingAction) -> eth::NetworkId {
    if action.kind.moves_value() {
        action.network
    } else {
        registry.hub().id
    }
}

fn link(registry: &Registry, network: eth::NetworkId, hash: eth::TxHash) -> status::Link {
    status::Link {
        hash,
        explorer_url: registry
            .network(network)
            .ok()
            .and_then(|network| network.explorer_url(hash)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidAmount(#[from] InvalidAmount),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("allowance of {allowance} is still below the required {required} after approval")]
    ApprovalInsufficient {
        allowance: eth::U256,
        required: eth::U256,
    },
    #[error("token approval was rejected in the wallet")]
    ApprovalRejected,
    #[error("transaction was rejected in the wallet")]
    SubmissionRejected,
    #[error("transaction {hash} reverted: {reason}")]
    TransactionReverted { hash: eth::TxHash, reason: String },
    #[error("no receipt for transaction {hash} after {attempts} attempts")]
    ReceiptTimeout { hash: eth::TxHash, attempts: u32 },
    #[error(transparent)]
    Node(#[from] contracts::Error),
    #[error(transparent)]
    Wallet(wallet::Error),
    #[error("action abandoned before completion")]
    Abandoned,
}

impl From<blockchain::Error> for Error {
    fn from(err: blockchain::Error) -> Self {
        Self::Node(err.into())
    }
}

impl Error {
    /// The terminal step this error is reported as.
    pub fn step(&self) -> status::Step {
        match self {
            Error::TransactionReverted { .. } => status::Step::Reverted,
            Error::ReceiptTimeout { .. } => status::Step::Timeout,
            _ => status::Step::Failed,
        }
    }

    /// The message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Error::TransactionReverted { reason, .. } => reason.clone(),
            Error::ReceiptTimeout { hash, .. } => format!(
                "transaction {hash} has not been confirmed yet; it may still settle, check back \
                 later"
            ),
            err => err.to_string(),
        }
    }

    pub fn transaction_hash(&self) -> Option<eth::TxHash> {
        match self {
            Error::TransactionReverted { hash, .. } | Error::ReceiptTimeout { hash, .. } => {
                Some(*hash)
            }
            _ => None,
        }
    }
}
