//! User-initiated lending actions.

use {
    crate::domain::{asset::AssetId, eth},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Deposit collateral from a satellite network into the hub.
    Supply,
    /// Borrow from the hub, paid out on a destination network.
    Borrow,
    /// Repay debt from a satellite network.
    Repay,
    /// Withdraw collateral from the hub to a destination network.
    Withdraw,
}

impl Kind {
    /// Whether the action pulls tokens from the user's wallet and therefore
    /// requires an ERC-20 allowance. These actions are signed on the
    /// satellite network; all others are signed on the hub.
    pub fn moves_value(self) -> bool {
        matches!(self, Kind::Supply | Kind::Repay)
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Supply => "supply",
            Kind::Borrow => "borrow",
            Kind::Repay => "repay",
            Kind::Withdraw => "withdraw",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An action that has been requested but has not reached a terminal state.
#[derive(Clone, Debug)]
pub struct PendingAction {
    pub kind: Kind,
    /// The satellite network funds come from (supply, repay) or go to
    /// (borrow, withdraw).
    pub network: eth::NetworkId,
    pub asset: AssetId,
    /// The amount as entered by the user, before normalization.
    pub amount: String,
    pub origin: eth::Address,
    pub started_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(
        kind: Kind,
        network: eth::NetworkId,
        asset: AssetId,
        amount: impl Into<String>,
        origin: eth::Address,
    ) -> Self {
        Self {
            kind,
            network,
            asset,
            amount: amount.into(),
            origin,
            started_at: Utc::now(),
        }
    }
}
