//! Assets supported by the lending protocol and where they are deployed.

use {
    crate::domain::eth,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// A lendable asset. Each asset is a distinct token contract on every
/// network it is deployed to (ERC-20 on satellites, ZRC-20 on the hub).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetId {
    Usdc,
    Eth,
}

impl AssetId {
    pub const ALL: [Self; 2] = [Self::Usdc, Self::Eth];

    pub fn name(self) -> &'static str {
        match self {
            AssetId::Usdc => "usdc",
            AssetId::Eth => "eth",
        }
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetId {
    type Err = UnsupportedAsset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedAsset(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported asset {0:?}")]
pub struct UnsupportedAsset(pub String);

/// The deployment of an asset on one network.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deployment {
    pub token: eth::TokenAddress,
    /// The number of decimals of the token contract on this network. The
    /// same asset may use different decimals on different networks.
    pub decimals: u8,
}

#[derive(Clone, Debug)]
pub struct AssetDescriptor {
    pub id: AssetId,
    pub symbol: String,
    pub deployments: HashMap<eth::NetworkId, Deployment>,
}

impl AssetDescriptor {
    pub fn deployment(&self, network: eth::NetworkId) -> Option<&Deployment> {
        self.deployments.get(&network)
    }
}
