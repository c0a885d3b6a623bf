pub mod file;

use {
    crate::domain::{lending, registry::Registry},
    std::time::Duration,
};

/// Everything the orchestrator is configured with.
#[derive(Clone, Debug)]
pub struct Config {
    pub registry: Registry,
    /// Upper bound of a single RPC request.
    pub rpc_timeout: Duration,
    pub lending: lending::Config,
}
