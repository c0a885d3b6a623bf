//! Gas estimation and broadcasting.
//!
//! A submission broadcasts at most one transaction. Failed broadcasts are
//! never retried, waiting for the transaction to settle is left to the
//! [`poller`](super::poller).

use {
    super::{Context, Error},
    crate::{
        domain::eth,
        infra::{metrics, wallet},
    },
};

#[derive(Clone, Copy, Debug)]
pub struct GasPolicy {
    /// Safety margin added on top of a successful estimate, in percent.
    pub margin_percent: u64,
    /// Gas limit used when the node cannot estimate the transaction.
    pub fallback: eth::Gas,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            margin_percent: 30,
            fallback: eth::Gas(500_000),
        }
    }
}

/// A transaction with a gas limit, ready to be broadcast.
#[derive(Debug)]
pub struct Prepared {
    pub network: eth::NetworkId,
    pub tx: eth::Transaction,
    pub gas: eth::Gas,
    /// Whether the gas limit comes from an estimate or from the fallback.
    pub estimated: bool,
}

/// Estimates and broadcasts a transaction on the specified network.
pub async fn submit(
    ctx: &Context<'_>,
    network: eth::NetworkId,
    tx: eth::Transaction,
) -> Result<eth::TxHash, Error> {
    let prepared = prepare(ctx, network, tx).await?;
    broadcast(ctx, prepared).await
}

/// Switches the wallet to the specified network and determines the gas limit
/// of the transaction.
///
/// Estimation failures are not errors, the configured fallback limit is used
/// instead.
pub async fn prepare(
    ctx: &Context<'_>,
    network: eth::NetworkId,
    tx: eth::Transaction,
) -> Result<Prepared, Error> {
    ensure_network(ctx, network).await?;

    let policy = &ctx.config.gas;
    let (gas, estimated) = match ctx.wallet.estimate_gas(&tx).await {
        Ok(estimate) => (estimate.with_margin(policy.margin_percent), true),
        Err(err) => {
            tracing::info!(
                ?err,
                fallback = policy.fallback.0,
                "gas estimation failed; using fallback gas limit"
            );
            metrics::gas_estimate_fallback();
            (policy.fallback, false)
        }
    };
    tracing::debug!(gas = gas.0, estimated, "prepared transaction");

    Ok(Prepared {
        network,
        tx,
        gas,
        estimated,
    })
}

/// Signs and broadcasts a prepared transaction exactly once.
pub async fn broadcast(ctx: &Context<'_>, prepared: Prepared) -> Result<eth::TxHash, Error> {
    let Prepared {
        network, tx, gas, ..
    } = prepared;
    let hash = ctx
        .wallet
        .send_transaction(tx, gas)
        .await
        .map_err(rejected_as(Error::SubmissionRejected))?;

    tracing::info!(%hash, %network, gas = gas.0, "transaction submitted");
    metrics::transaction_sent(network);
    Ok(hash)
}

/// Asks the wallet to switch networks if it is not on `network` yet.
async fn ensure_network(ctx: &Context<'_>, network: eth::NetworkId) -> Result<(), Error> {
    let active = ctx.wallet.active_network().await.map_err(Error::Wallet)?;
    if active == network {
        return Ok(());
    }

    tracing::info!(from = %active, to = %network, "switching wallet network");
    ctx.wallet
        .switch_network(network)
        .await
        .map_err(rejected_as(Error::SubmissionRejected))?;
    ctx.bindings.invalidate();
    Ok(())
}

/// Maps a wallet rejection to the specified error.
fn rejected_as(rejected: Error) -> impl FnOnce(wallet::Error) -> Error {
    move |err| match err {
        wallet::Error::Rejected => rejected,
        err => Error::Wallet(err),
    }
}
