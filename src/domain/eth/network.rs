use {
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// A supported network. The hub and every satellite chain the lending
/// protocol is deployed to has exactly one variant here.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
    ZetaAthens = 7001,
    BaseSepolia = 84532,
    EthereumSepolia = 11155111,
    BscTestnet = 97,
    AvalancheFuji = 43113,
}

impl NetworkId {
    pub const ALL: [Self; 5] = [
        Self::ZetaAthens,
        Self::BaseSepolia,
        Self::EthereumSepolia,
        Self::BscTestnet,
        Self::AvalancheFuji,
    ];

    pub fn new(chain_id: u64) -> Result<Self, UnsupportedNetwork> {
        Self::ALL
            .into_iter()
            .find(|network| network.chain_id() == chain_id)
            .ok_or(UnsupportedNetwork(chain_id.to_string()))
    }

    /// Returns the EIP-155 chain ID of the network.
    pub fn chain_id(self) -> u64 {
        self as u64
    }

    /// Returns the kebab-case name used in configuration files and on the
    /// command line.
    pub fn name(self) -> &'static str {
        match self {
            NetworkId::ZetaAthens => "zeta-athens",
            NetworkId::BaseSepolia => "base-sepolia",
            NetworkId::EthereumSepolia => "ethereum-sepolia",
            NetworkId::BscTestnet => "bsc-testnet",
            NetworkId::AvalancheFuji => "avalanche-fuji",
        }
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkId {
    type Err = UnsupportedNetwork;

    /// Accepts either the network name or its numeric chain ID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(chain_id) = s.parse::<u64>() {
            return Self::new(chain_id);
        }
        Self::ALL
            .into_iter()
            .find(|network| network.name() == s)
            .ok_or_else(|| UnsupportedNetwork(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported network {0:?}")]
pub struct UnsupportedNetwork(pub String);
