//! Static chain and asset registry, resolved once at start-up.

use {
    crate::domain::{
        asset::{AssetDescriptor, AssetId, Deployment},
        eth,
    },
    std::{
        collections::HashMap,
        fmt::{self, Display, Formatter},
    },
};

/// The native currency of a network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u8,
}

/// Lending protocol contracts deployed on a network.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NetworkContracts {
    /// The hub vault. Only deployed on the hub network.
    pub hub: Option<eth::ContractAddress>,
    /// The satellite executor forwarding deposits to the hub.
    pub executor: Option<eth::ContractAddress>,
}

#[derive(Clone, Debug)]
pub struct NetworkDescriptor {
    pub id: eth::NetworkId,
    pub display_name: String,
    pub rpc: reqwest::Url,
    pub chain_id: u64,
    pub explorer: reqwest::Url,
    pub native_currency: Currency,
    pub contracts: NetworkContracts,
}

impl NetworkDescriptor {
    /// Returns the block explorer page of a transaction on this network.
    pub fn explorer_url(&self, hash: eth::TxHash) -> Option<reqwest::Url> {
        format!("{}/tx/{hash}", self.explorer.as_str().trim_end_matches('/'))
            .parse()
            .ok()
    }
}

/// The role a contract plays in the protocol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    Hub,
    Executor,
    Token(AssetId),
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Role::Hub => f.write_str("hub"),
            Role::Executor => f.write_str("executor"),
            Role::Token(asset) => write!(f, "token({asset})"),
        }
    }
}

/// Strongly typed lookups for every network and asset the orchestrator may
/// touch.
#[derive(Clone, Debug)]
pub struct Registry {
    hub: eth::NetworkId,
    networks: HashMap<eth::NetworkId, NetworkDescriptor>,
    assets: HashMap<AssetId, AssetDescriptor>,
}

impl Registry {
    pub fn new(
        hub: eth::NetworkId,
        networks: impl IntoIterator<Item = NetworkDescriptor>,
        assets: impl IntoIterator<Item = AssetDescriptor>,
    ) -> Result<Self, ConfigurationError> {
        let mut by_id = HashMap::new();
        for network in networks {
            if network.chain_id != network.id.chain_id() {
                return Err(ConfigurationError::ChainIdMismatch {
                    network: network.id,
                    chain_id: network.chain_id,
                });
            }
            if let Some(duplicate) = by_id.insert(network.id, network) {
                return Err(ConfigurationError::DuplicateNetwork(duplicate.id));
            }
        }

        let mut by_asset = HashMap::new();
        for asset in assets {
            if let Some(network) = asset
                .deployments
                .keys()
                .find(|network| !by_id.contains_key(network))
            {
                return Err(ConfigurationError::UnknownNetwork(*network));
            }
            if let Some(duplicate) = by_asset.insert(asset.id, asset) {
                return Err(ConfigurationError::DuplicateAsset(duplicate.id));
            }
        }

        let registry = Self {
            hub,
            networks: by_id,
            assets: by_asset,
        };
        registry.contract(hub, Role::Hub)?;
        Ok(registry)
    }

    /// The network hosting the hub vault.
    pub fn hub(&self) -> &NetworkDescriptor {
        &self.networks[&self.hub]
    }

    pub fn network(&self, id: eth::NetworkId) -> Result<&NetworkDescriptor, ConfigurationError> {
        self.networks
            .get(&id)
            .ok_or(ConfigurationError::UnknownNetwork(id))
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.values()
    }

    pub fn asset(&self, id: AssetId) -> Result<&AssetDescriptor, ConfigurationError> {
        self.assets
            .get(&id)
            .ok_or(ConfigurationError::UnknownAsset(id))
    }

    pub fn deployment(
        &self,
        asset: AssetId,
        network: eth::NetworkId,
    ) -> Result<Deployment, ConfigurationError> {
        self.asset(asset)?
            .deployment(network)
            .copied()
            .ok_or(ConfigurationError::NotDeployed { asset, network })
    }

    /// Resolves the address of the contract with the given role.
    pub fn contract(
        &self,
        network: eth::NetworkId,
        role: Role,
    ) -> Result<eth::ContractAddress, ConfigurationError> {
        let descriptor = self.network(network)?;
        let address = match role {
            Role::Hub => descriptor.contracts.hub,
            Role::Executor => descriptor.contracts.executor,
            Role::Token(asset) => Some(eth::ContractAddress(
                self.deployment(asset, network)?.token.0,
            )),
        };
        address.ok_or(ConfigurationError::MissingContract { network, role })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("network {0} is not configured")]
    UnknownNetwork(eth::NetworkId),
    #[error("asset {0} is not configured")]
    UnknownAsset(AssetId),
    #[error("asset {asset} is not deployed on {network}")]
    NotDeployed {
        asset: AssetId,
        network: eth::NetworkId,
    },
    #[error("asset {asset} has no decimals configured on {network}")]
    MissingDecimals {
        asset: AssetId,
        network: eth::NetworkId,
    },
    #[error("no {role} contract configured on {network}")]
    MissingContract {
        network: eth::NetworkId,
        role: Role,
    },
    #[error("network {network} is configured with chain ID {chain_id}")]
    ChainIdMismatch {
        network: eth::NetworkId,
        chain_id: u64,
    },
    #[error("network {0} is configured more than once")]
    DuplicateNetwork(eth::NetworkId),
    #[error("asset {0} is configured more than once")]
    DuplicateAsset(AssetId),
    #[error("the hub cannot route cross-chain calls to {0}")]
    UnroutableDestination(eth::NetworkId),
}
