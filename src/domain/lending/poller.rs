//! Waiting for broadcast transactions to settle.

use {
    super::Error,
    crate::{
        domain::{eth, revert},
        infra::{blockchain, metrics},
    },
    std::time::Duration,
};

/// How often and how long to poll for a receipt.
#[derive(Clone, Debug)]
pub struct Policy {
    pub max_attempts: u32,
    /// The wait after the first unsuccessful attempt.
    pub interval: Duration,
    /// Factor applied to the wait after every unsuccessful attempt.
    pub backoff: f64,
    pub max_interval: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(2),
            backoff: 1.5,
            max_interval: Duration::from_secs(10),
        }
    }
}

/// Polls for the receipt of a transaction.
///
/// Makes exactly `max_attempts` attempts before giving up with
/// [`Error::ReceiptTimeout`]. A timeout does not mean the transaction failed,
/// it may still be mined later. Node errors are logged and count as an
/// unsuccessful attempt.
pub async fn await_receipt(
    node: &dyn blockchain::Node,
    hash: eth::TxHash,
    policy: &Policy,
) -> Result<eth::Receipt, Error> {
    let mut wait = policy.interval;
    for attempt in 1..=policy.max_attempts {
        match node.receipt(hash).await {
            Ok(Some(receipt)) => {
                metrics::receipt_poll("mined");
                return Ok(receipt);
            }
            Ok(None) => {
                metrics::receipt_poll("pending");
                tracing::trace!(%hash, attempt, "transaction not mined yet");
            }
            Err(err) => {
                metrics::receipt_poll("error");
                tracing::warn!(?err, %hash, attempt, "failed to poll for receipt");
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(wait).await;
            wait = wait.mul_f64(policy.backoff).min(policy.max_interval);
        }
    }

    Err(Error::ReceiptTimeout {
        hash,
        attempts: policy.max_attempts,
    })
}

/// Waits for a transaction to be mined and requires it to succeed.
///
/// The reason of a reverted transaction is recovered by replaying it on top
/// of the state it was executed against.
pub async fn confirm(
    node: &dyn blockchain::Node,
    tx: &eth::Transaction,
    hash: eth::TxHash,
    policy: &Policy,
) -> Result<eth::Receipt, Error> {
    let receipt = await_receipt(node, hash, policy).await?;
    match receipt.status {
        eth::Status::Success => Ok(receipt),
        eth::Status::Reverted => Err(Error::TransactionReverted {
            hash,
            reason: revert_reason(node, tx, &receipt).await,
        }),
    }
}

async fn revert_reason(
    node: &dyn blockchain::Node,
    tx: &eth::Transaction,
    receipt: &eth::Receipt,
) -> String {
    let block = receipt.block_number.saturating_sub(1);
    match node.call(tx, Some(block)).await {
        Err(blockchain::Error::Revert(payload)) => revert::decode(&payload),
        Ok(_) => {
            tracing::debug!(hash = %receipt.transaction_hash, block, "replayed transaction did not revert");
            revert::GENERIC.to_owned()
        }
        Err(err) => {
            tracing::warn!(?err, hash = %receipt.transaction_hash, "failed to replay transaction");
            revert::GENERIC.to_owned()
        }
    }
}
