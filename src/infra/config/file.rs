use {
    crate::domain::{
        asset::{AssetDescriptor, AssetId, Deployment},
        eth,
        lending::{self, approval, poller, submitter},
        registry::{ConfigurationError, Currency, NetworkContracts, NetworkDescriptor, Registry},
    },
    anyhow::{Context, ensure},
    serde::Deserialize,
    serde_with::serde_as,
    std::{collections::BTreeMap, path::Path, time::Duration},
};

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// The network hosting the lending vault.
    hub: eth::NetworkId,

    /// Upper bound of a single RPC request, including connecting.
    #[serde(with = "humantime_serde", default = "default_rpc_timeout")]
    rpc_timeout: Duration,

    /// Allowance requested when an action needs an approval.
    #[serde(default)]
    approval: approval::Policy,

    #[serde(default)]
    gas: GasConfig,

    #[serde(default)]
    polling: PollingConfig,

    networks: BTreeMap<eth::NetworkId, NetworkConfig>,

    #[serde(default)]
    assets: BTreeMap<AssetId, AssetConfig>,
}

fn default_rpc_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
struct GasConfig {
    /// Safety margin added to gas estimates, in percent.
    margin_percent: u64,

    /// Gas limit used when a transaction cannot be estimated.
    fallback_limit: u64,

    /// Gas limit of calls relayed by the hub to a destination network.
    cross_chain_gas_limit: u64,

    /// Gas limit of the revert handler of relayed calls.
    on_revert_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        let gas = submitter::GasPolicy::default();
        let cross_chain = lending::CrossChain::default();
        Self {
            margin_percent: gas.margin_percent,
            fallback_limit: gas.fallback.0,
            cross_chain_gas_limit: cross_chain.gas_limit.0,
            on_revert_gas_limit: cross_chain.on_revert_gas_limit.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
struct PollingConfig {
    /// Receipt polls before an action is reported as timed out.
    max_attempts: u32,

    /// Wait between the first two polls.
    #[serde(with = "humantime_serde")]
    interval: Duration,

    /// Factor applied to the wait after every poll.
    backoff: f64,

    /// Upper bound of the wait between two polls.
    #[serde(with = "humantime_serde")]
    max_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let policy = poller::Policy::default();
        Self {
            max_attempts: policy.max_attempts,
            interval: policy.interval,
            backoff: policy.backoff,
            max_interval: policy.max_interval,
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct NetworkConfig {
    display_name: String,

    #[serde_as(as = "serde_with::DisplayFromStr")]
    rpc: reqwest::Url,

    /// Must match the chain ID of the network. Guards against RPC endpoints
    /// configured for the wrong network.
    chain_id: u64,

    /// Base URL of the block explorer.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    explorer: reqwest::Url,

    native_currency: CurrencyConfig,

    /// Address of the lending vault. Only set on the hub network.
    #[serde_as(as = "Option<serde_with::DisplayFromStr>")]
    hub: Option<eth::Address>,

    /// Address of the satellite executor.
    #[serde_as(as = "Option<serde_with::DisplayFromStr>")]
    executor: Option<eth::Address>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CurrencyConfig {
    symbol: String,
    decimals: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct AssetConfig {
    symbol: String,

    /// Decimals of every deployment that does not specify its own.
    decimals: Option<u8>,

    deployments: BTreeMap<eth::NetworkId, DeploymentConfig>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct DeploymentConfig {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    address: eth::Address,

    decimals: Option<u8>,
}

/// Load the orchestrator configuration from a TOML file.
pub async fn load(path: &Path) -> anyhow::Result<super::Config> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    let config = toml::de::from_str::<Config>(&data)
        .with_context(|| format!("TOML syntax error while reading {path:?}"))?;
    resolve(config).with_context(|| format!("invalid configuration in {path:?}"))
}

fn resolve(config: Config) -> anyhow::Result<super::Config> {
    ensure!(!config.rpc_timeout.is_zero(), "rpc-timeout must not be zero");
    ensure!(
        config.polling.max_attempts > 0,
        "polling.max-attempts must be at least 1"
    );
    ensure!(
        config.polling.backoff.is_finite() && config.polling.backoff >= 1.0,
        "polling.backoff must be a finite number of at least 1"
    );
    ensure!(
        config.polling.max_interval >= config.polling.interval,
        "polling.max-interval must not be shorter than polling.interval"
    );

    let networks = config
        .networks
        .into_iter()
        .map(|(id, network)| NetworkDescriptor {
            id,
            display_name: network.display_name,
            rpc: network.rpc,
            chain_id: network.chain_id,
            explorer: network.explorer,
            native_currency: Currency {
                symbol: network.native_currency.symbol,
                decimals: network.native_currency.decimals,
            },
            contracts: NetworkContracts {
                hub: network.hub.map(eth::ContractAddress),
                executor: network.executor.map(eth::ContractAddress),
            },
        })
        .collect::<Vec<_>>();

    let assets = config
        .assets
        .into_iter()
        .map(|(id, asset)| {
            let deployments = asset
                .deployments
                .into_iter()
                .map(|(network, deployment)| {
                    let decimals = deployment
                        .decimals
                        .or(asset.decimals)
                        .ok_or(ConfigurationError::MissingDecimals { asset: id, network })?;
                    Ok((
                        network,
                        Deployment {
                            token: eth::TokenAddress(deployment.address),
                            decimals,
                        },
                    ))
                })
                .collect::<Result<_, ConfigurationError>>()?;
            Ok(AssetDescriptor {
                id,
                symbol: asset.symbol,
                deployments,
            })
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;

    Ok(super::Config {
        registry: Registry::new(config.hub, networks, assets)?,
        rpc_timeout: config.rpc_timeout,
        lending: lending::Config {
            approval: config.approval,
            gas: submitter::GasPolicy {
                margin_percent: config.gas.margin_percent,
                fallback: eth::Gas(config.gas.fallback_limit),
            },
            polling: poller::Policy {
                max_attempts: config.polling.max_attempts,
                interval: config.polling.interval,
                backoff: config.polling.backoff,
                max_interval: config.polling.max_interval,
            },
            cross_chain: lending::CrossChain {
                gas_limit: eth::Gas(config.gas.cross_chain_gas_limit),
                on_revert_gas_limit: eth::Gas(config.gas.on_revert_gas_limit),
            },
        },
    })
}
