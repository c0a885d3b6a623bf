use {
    crate::domain::{asset::AssetId, eth},
    alloy::signers::local::PrivateKeySigner,
    clap::{Parser, Subcommand},
    std::path::PathBuf,
};

/// Cross-chain lending orchestrator.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[clap(long, env = "LENDING_CONFIG", default_value = "lending.toml")]
    pub config: PathBuf,

    /// Log filter, in the `RUST_LOG` directive syntax.
    #[clap(long, env = "LENDING_LOG", default_value = "warn,lending=debug")]
    pub log: String,

    /// Private key of the account signing transactions. Only required for
    /// actions.
    #[clap(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<PrivateKeySigner>,

    /// Print all metrics in the Prometheus text format before exiting.
    #[clap(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Supply collateral from a satellite network to the hub.
    Supply(Action),
    /// Borrow from the hub, paid out on the specified network.
    Borrow(Action),
    /// Repay debt from a satellite network.
    Repay(Action),
    /// Withdraw collateral from the hub to the specified network.
    Withdraw(Action),
    /// Show how much the executor on a network may pull from an account.
    Allowance(Holding),
    /// Show the token balance of an account on a network.
    Balance(Holding),
    /// Show the USD price of an asset according to the hub oracle.
    Price {
        #[clap(long)]
        asset: AssetId,
    },
    /// Show the cross-chain position of an account.
    Position {
        /// Defaults to the account of the private key.
        #[clap(long)]
        user: Option<eth::Address>,
    },
}

#[derive(clap::Args, Debug)]
pub struct Action {
    /// The network funds come from (supply, repay) or are paid out on
    /// (borrow, withdraw). Accepts a network name or chain ID.
    #[clap(long)]
    pub network: eth::NetworkId,

    #[clap(long)]
    pub asset: AssetId,

    /// Decimal amount in whole tokens, for example `12.5`.
    pub amount: String,
}

#[derive(clap::Args, Debug)]
pub struct Holding {
    #[clap(long)]
    pub network: eth::NetworkId,

    #[clap(long)]
    pub asset: AssetId,

    /// Defaults to the account of the private key.
    #[clap(long)]
    pub owner: Option<eth::Address>,
}
