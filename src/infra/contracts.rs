use {
    crate::{
        domain::{
            eth,
            registry::{ConfigurationError, NetworkDescriptor, Registry, Role},
        },
        infra::blockchain::{self, Node},
    },
    alloy::sol_types::SolCall,
    std::sync::Arc,
};

alloy::sol! {
    /// The lending vault on the hub network.
    interface IOmniVault {
        struct CallOptions {
            uint256 gasLimit;
            bool isArbitraryCall;
        }

        struct RevertOptions {
            bool onRevert;
            address revertAddress;
        }

        function requestBorrowCrossChain(
            address asset,
            uint256 amount,
            uint16 destChainId,
            CallOptions callOptions,
            RevertOptions revertOptions
        ) external;

        function requestWithdrawCrossChain(
            address asset,
            uint256 amount,
            uint16 destChainId,
            CallOptions callOptions,
            RevertOptions revertOptions
        ) external;

        function getCrossChainPosition(address user)
            external
            view
            returns (uint256 collateralUsd, uint256 debtUsd, uint256 hf);

        function canBeLiquidated(address user) external view returns (bool);

        function getAssetPriceUSD(address asset) external view returns (uint256);
    }

    /// The satellite executor forwarding deposits and repayments to the hub.
    interface IOmniExecutor {
        struct RevertOptions {
            address revertAddress;
            bool callOnRevert;
            address abortAddress;
            bytes revertMessage;
            uint256 onRevertGasLimit;
        }

        function supplyToZeta(address asset, uint256 amount, RevertOptions revertOptions)
            external
            payable;

        function repayToZeta(address asset, uint256 amount, RevertOptions revertOptions)
            external
            payable;
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);

        function allowance(address owner, address spender) external view returns (uint256);

        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// A contract with a known role on a network, bound to that network's node.
pub struct Binding {
    pub network: eth::NetworkId,
    pub role: Role,
    pub address: eth::ContractAddress,
    node: Arc<dyn Node>,
}

impl Binding {
    /// Executes a view call against the contract.
    pub async fn read<C: SolCall + Send + Sync>(&self, call: C) -> Result<C::Return, Error> {
        let tx = eth::Transaction {
            from: eth::Address::ZERO,
            to: self.address,
            value: eth::Ether::default(),
            input: call.abi_encode().into(),
        };
        let output = self.node.call(&tx, None).await?;
        C::abi_decode_returns(&output).map_err(|err| Error::Decode {
            call: C::SIGNATURE,
            reason: err.to_string(),
        })
    }

    /// Builds a state changing transaction to be signed by `from`.
    pub fn transaction(&self, from: eth::Address, input: eth::Bytes) -> eth::Transaction {
        eth::Transaction {
            from,
            to: self.address,
            value: eth::Ether::default(),
            input,
        }
    }

    /// The node of the network the contract is deployed to.
    pub fn node(&self) -> &dyn Node {
        self.node.as_ref()
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("network", &self.network)
            .field("role", &self.role)
            .field("address", &self.address)
            .finish()
    }
}

type Connect = dyn Fn(&NetworkDescriptor) -> Arc<dyn Node> + Send + Sync;

/// Lazily builds and caches one [`Binding`] per network and role.
///
/// The cache is shared by all actions and must be invalidated whenever the
/// signing identity switches networks.
#[derive(Clone)]
pub struct BindingFactory {
    registry: Arc<Registry>,
    connect: Arc<Connect>,
    cache: moka::future::Cache<(eth::NetworkId, Role), Arc<Binding>>,
}

impl BindingFactory {
    /// Creates a factory connecting to the configured RPC endpoints through
    /// the specified HTTP client.
    pub fn new(registry: Arc<Registry>, client: blockchain::Client) -> Self {
        Self::with_connector(registry, move |network| {
            Arc::new(blockchain::Rpc::new(&client, &network.rpc))
        })
    }

    pub fn with_connector(
        registry: Arc<Registry>,
        connect: impl Fn(&NetworkDescriptor) -> Arc<dyn Node> + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            connect: Arc::new(connect),
            cache: moka::future::Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .build(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the binding of the contract with the given role on a network.
    pub async fn get(
        &self,
        network: eth::NetworkId,
        role: Role,
    ) -> Result<Arc<Binding>, ConfigurationError> {
        let address = self.registry.contract(network, role)?;
        let descriptor = self.registry.network(network)?;
        let binding = self
            .cache
            .get_with((network, role), async {
                tracing::debug!(%network, %role, address = ?address.0, "building contract binding");
                Arc::new(Binding {
                    network,
                    role,
                    address,
                    node: (self.connect)(descriptor),
                })
            })
            .await;
        Ok(binding)
    }

    /// Drops every cached binding.
    pub fn invalidate(&self) {
        tracing::debug!("invalidating contract bindings");
        self.cache.invalidate_all();
    }
}

/// Every network, role pair fits comfortably.
const CACHE_CAPACITY: u64 = 256;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Node(#[from] blockchain::Error),
    #[error("failed to decode {call} return data: {reason}")]
    Decode { call: &'static str, reason: String },
}
