use {
    crate::domain::{eth, revert},
    alloy::{
        network::TransactionBuilder,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::{
            client::RpcClient,
            types::{BlockId, TransactionRequest},
        },
        transports::{TransportError, http::Http},
    },
    std::time::Duration,
};

pub use alloy::transports::http::reqwest::Client;

/// Creates the HTTP client shared by every RPC connection. Requests that take
/// longer than `timeout`, including connecting, fail instead of hanging.
pub fn client(timeout: Duration) -> Result<Client, Error> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(|err| Error::Rpc(format!("failed to build HTTP client: {err}")))
}

/// Creates a JSON RPC client for the specified endpoint.
pub fn connect(client: &Client, url: &reqwest::Url) -> RpcClient {
    let transport = Http::with_client(client.clone(), url.clone());
    let is_local = transport.guess_local();
    RpcClient::new(transport, is_local)
}

/// Creates a read-only provider for the specified RPC endpoint.
pub fn rpc(client: &Client, url: &reqwest::Url) -> DynProvider {
    ProviderBuilder::new()
        .connect_client(connect(client, url))
        .erased()
}

/// Converts a transaction into an RPC request.
pub fn request(tx: &eth::Transaction) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(tx.from)
        .with_to(tx.to.0)
        .with_value(tx.value.0)
        .with_input(tx.input.clone())
}

/// Read access to the RPC node of a single network.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Node: Send + Sync {
    /// Executes a call without broadcasting it, at the latest block or at
    /// the specified block.
    async fn call(&self, tx: &eth::Transaction, block: Option<u64>) -> Result<eth::Bytes, Error>;

    /// Fetches the receipt of a transaction. Returns `None` while the
    /// transaction is not mined.
    async fn receipt(&self, hash: eth::TxHash) -> Result<Option<eth::Receipt>, Error>;
}

/// A [`Node`] backed by a JSON RPC endpoint.
#[derive(Clone, Debug)]
pub struct Rpc {
    provider: DynProvider,
}

impl Rpc {
    pub fn new(client: &Client, url: &reqwest::Url) -> Self {
        Self {
            provider: rpc(client, url),
        }
    }
}

#[async_trait::async_trait]
impl Node for Rpc {
    async fn call(&self, tx: &eth::Transaction, block: Option<u64>) -> Result<eth::Bytes, Error> {
        let call = self.provider.call(request(tx));
        let call = match block {
            Some(number) => call.block(BlockId::number(number)),
            None => call,
        };
        Ok(call.await?)
    }

    async fn receipt(&self, hash: eth::TxHash) -> Result<Option<eth::Receipt>, Error> {
        let Some(receipt) = self.provider.get_transaction_receipt(hash.0).await? else {
            return Ok(None);
        };
        // Some nodes return receipts of pending transactions without a block.
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };
        Ok(Some(eth::Receipt {
            transaction_hash: eth::TxHash(receipt.transaction_hash),
            status: if receipt.status() {
                eth::Status::Success
            } else {
                eth::Status::Reverted
            },
            block_number,
            gas_used: eth::Gas(receipt.gas_used),
        }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("call reverted: {}", revert::decode(.0))]
    Revert(eth::Bytes),
    #[error("node request failed: {0}")]
    Rpc(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp().and_then(|payload| payload.as_revert_data()) {
            Some(data) => Self::Revert(data),
            None => Self::Rpc(err.to_string()),
        }
    }
}
