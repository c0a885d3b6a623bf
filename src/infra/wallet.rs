//! The signing identity of the user.

use {
    crate::{
        domain::eth,
        infra::blockchain::{self, Client},
    },
    alloy::{
        network::{EthereumWallet, TransactionBuilder},
        providers::{DynProvider, Provider, ProviderBuilder},
        signers::local::PrivateKeySigner,
        transports::TransportError,
    },
    std::{
        collections::HashMap,
        sync::{Mutex, PoisonError},
    },
};

/// EIP-1193 error code of a request the user declined.
const USER_REJECTED_REQUEST: i64 = 4001;

/// A signing identity bound to one active network at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> eth::Address;

    async fn active_network(&self) -> Result<eth::NetworkId, Error>;

    async fn switch_network(&self, network: eth::NetworkId) -> Result<(), Error>;

    /// Estimates the gas of a transaction on the active network.
    async fn estimate_gas(&self, tx: &eth::Transaction) -> Result<eth::Gas, Error>;

    /// Signs and broadcasts a transaction on the active network. Returns as
    /// soon as the node accepted the transaction.
    async fn send_transaction(
        &self,
        tx: eth::Transaction,
        gas: eth::Gas,
    ) -> Result<eth::TxHash, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request rejected by the user")]
    Rejected,
    #[error("wallet cannot sign on {0}")]
    UnavailableNetwork(eth::NetworkId),
    #[error("wallet request failed: {0}")]
    Rpc(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_REQUEST => Self::Rejected,
            _ => Self::Rpc(err.to_string()),
        }
    }
}

/// A wallet signing with a local private key, with one signing provider per
/// network.
pub struct LocalWallet {
    address: eth::Address,
    providers: HashMap<eth::NetworkId, DynProvider>,
    active: Mutex<eth::NetworkId>,
}

impl LocalWallet {
    pub fn new(
        signer: PrivateKeySigner,
        client: &Client,
        networks: impl IntoIterator<Item = (eth::NetworkId, reqwest::Url)>,
        active: eth::NetworkId,
    ) -> Result<Self, Error> {
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let providers = networks
            .into_iter()
            .map(|(network, url)| {
                let provider = ProviderBuilder::new()
                    .wallet(wallet.clone())
                    .connect_client(blockchain::connect(client, &url))
                    .erased();
                (network, provider)
            })
            .collect::<HashMap<_, _>>();
        if !providers.contains_key(&active) {
            return Err(Error::UnavailableNetwork(active));
        }

        tracing::info!(%address, %active, networks = providers.len(), "initialized wallet");
        Ok(Self {
            address,
            providers,
            active: Mutex::new(active),
        })
    }

    fn active(&self) -> eth::NetworkId {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn provider(&self) -> Result<&DynProvider, Error> {
        let network = self.active();
        self.providers
            .get(&network)
            .ok_or(Error::UnavailableNetwork(network))
    }
}

#[async_trait::async_trait]
impl Wallet for LocalWallet {
    fn address(&self) -> eth::Address {
        self.address
    }

    async fn active_network(&self) -> Result<eth::NetworkId, Error> {
        Ok(self.active())
    }

    async fn switch_network(&self, network: eth::NetworkId) -> Result<(), Error> {
        if !self.providers.contains_key(&network) {
            return Err(Error::UnavailableNetwork(network));
        }
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = network;
        tracing::debug!(%network, "switched wallet network");
        Ok(())
    }

    async fn estimate_gas(&self, tx: &eth::Transaction) -> Result<eth::Gas, Error> {
        let gas = self
            .provider()?
            .estimate_gas(blockchain::request(tx))
            .await?;
        Ok(eth::Gas(gas))
    }

    async fn send_transaction(
        &self,
        tx: eth::Transaction,
        gas: eth::Gas,
    ) -> Result<eth::TxHash, Error> {
        let request = blockchain::request(&tx).with_gas_limit(gas.0);
        let pending = self.provider()?.send_transaction(request).await?;
        Ok(eth::TxHash(*pending.tx_hash()))
    }
}
