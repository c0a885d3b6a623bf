mod network;

pub use {
    self::network::{NetworkId, UnsupportedNetwork},
    alloy::primitives::{Address, B256, Bytes, U256},
};

use {
    crate::util,
    serde::Serialize,
    std::fmt::{self, Debug, Display, Formatter},
};

/// A contract address.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ContractAddress(pub Address);

/// An ERC20 token address.
///
/// https://eips.ethereum.org/EIPS/eip-20
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TokenAddress(pub Address);

/// An Ether amount in wei.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ether(pub U256);

/// Gas amount.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Gas(pub u64);

impl Gas {
    /// Adds a proportional safety margin, in percent, on top of this amount.
    pub fn with_margin(self, percent: u64) -> Self {
        let margin = u128::from(self.0) * u128::from(percent) / 100;
        Self(u64::try_from(u128::from(self.0) + margin).unwrap_or(u64::MAX))
    }
}

/// A transaction hash.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TxHash(pub B256);

impl Display for TxHash {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An Ethereum transaction to be signed and broadcast, or replayed as a call.
#[derive(Clone, PartialEq)]
pub struct Transaction {
    pub from: Address,
    pub to: ContractAddress,
    pub value: Ether,
    pub input: Bytes,
}

impl Debug for Transaction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("value", &self.value)
            .field("input", &util::fmt::Hex(&self.input))
            .finish()
    }
}

/// The settlement outcome of a mined transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    Reverted,
}

/// A transaction receipt. Immutable once observed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub status: Status,
    pub block_number: u64,
    pub gas_used: Gas,
}
