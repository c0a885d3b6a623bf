use {
    crate::{
        domain::{action::Kind, eth, lending::Lending},
        infra::{
            blockchain,
            cli,
            config,
            contracts::BindingFactory,
            metrics,
            wallet::{LocalWallet, Wallet},
        },
    },
    anyhow::Context,
    clap::Parser,
    futures::StreamExt,
    std::sync::Arc,
};

/// Runs a single command and exits.
pub async fn start(args: impl IntoIterator<Item = String>) -> anyhow::Result<()> {
    let args = cli::Args::parse_from(args);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(config = ?args.config, command = ?args.command, "starting");

    let result = run(&args).await;
    if args.metrics {
        print!("{}", metrics::encode());
    }
    result
}

async fn run(args: &cli::Args) -> anyhow::Result<()> {
    let config = config::file::load(&args.config).await?;
    let registry = Arc::new(config.registry);
    let client = blockchain::client(config.rpc_timeout)?;
    let lending = Lending::new(
        BindingFactory::new(registry.clone(), client.clone()),
        config.lending,
    );

    let wallet = match &args.private_key {
        Some(signer) => Some(Arc::new(LocalWallet::new(
            signer.clone(),
            &client,
            registry
                .networks()
                .map(|network| (network.id, network.rpc.clone())),
            registry.hub().id,
        )?)),
        None => None,
    };
    let account = |explicit: Option<eth::Address>| {
        explicit
            .or_else(|| wallet.as_ref().map(|wallet| wallet.address()))
            .context("no account specified and no private key configured")
    };

    let signing = || {
        wallet
            .clone()
            .context("a private key is required to perform actions")
    };

    match &args.command {
        cli::Command::Supply(action) => perform(&lending, Kind::Supply, action, signing()?).await?,
        cli::Command::Borrow(action) => perform(&lending, Kind::Borrow, action, signing()?).await?,
        cli::Command::Repay(action) => perform(&lending, Kind::Repay, action, signing()?).await?,
        cli::Command::Withdraw(action) => {
            perform(&lending, Kind::Withdraw, action, signing()?).await?
        }
        cli::Command::Allowance(holding) => {
            let allowance = lending
                .read_allowance(holding.network, holding.asset, account(holding.owner)?)
                .await?;
            println!("{allowance}");
        }
        cli::Command::Balance(holding) => {
            let balance = lending
                .read_balance(holding.network, holding.asset, account(holding.owner)?)
                .await?;
            println!("{balance}");
        }
        cli::Command::Price { asset } => {
            println!("{}", lending.read_asset_price(*asset).await?);
        }
        cli::Command::Position { user } => {
            let user = account(*user)?;
            let position = lending.read_position(user).await?;
            let liquidatable = lending.can_be_liquidated(user).await?;
            println!("{position}");
            if liquidatable {
                println!("position can be liquidated");
            }
        }
    }
    Ok(())
}

/// Performs an action, printing every status update as a JSON line.
async fn perform(
    lending: &Lending,
    kind: Kind,
    action: &cli::Action,
    wallet: Arc<LocalWallet>,
) -> anyhow::Result<()> {
    let handle = lending.perform_action(kind, action.network, action.asset, &action.amount, wallet);
    let mut updates = handle.updates();
    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(update) => println!("{}", serde_json::to_string(&update)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted");
                handle.cancel();
                anyhow::bail!("interrupted; a submitted transaction may still settle");
            }
        }
    }
    handle.outcome().await?;
    Ok(())
}
