use {
    crate::domain::{action, eth},
    prometheus_metric_storage::StorageRegistry,
    std::sync::LazyLock,
};

static STORAGE: LazyLock<StorageRegistry> =
    LazyLock::new(|| StorageRegistry::new(prometheus::default_registry().clone()));

/// Metrics for the lending orchestrator.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "lending")]
struct Metrics {
    /// Lending actions that reached a terminal state.
    #[metric(labels("kind", "outcome"))]
    actions: prometheus::IntCounterVec,

    /// Transactions broadcast through the wallet.
    #[metric(labels("network"))]
    transactions: prometheus::IntCounterVec,

    /// Gas estimations that failed and fell back to the configured limit.
    gas_estimate_fallbacks: prometheus::IntCounter,

    /// Receipt polls by result.
    #[metric(labels("result"))]
    receipt_polls: prometheus::IntCounterVec,
}

pub fn action(kind: action::Kind, outcome: &str) {
    get()
        .actions
        .with_label_values(&[kind.label(), outcome])
        .inc();
}

pub fn transaction_sent(network: eth::NetworkId) {
    get()
        .transactions
        .with_label_values(&[network.name()])
        .inc();
}

pub fn gas_estimate_fallback() {
    get().gas_estimate_fallbacks.inc();
}

pub fn receipt_poll(result: &str) {
    get().receipt_polls.with_label_values(&[result]).inc();
}

/// Renders all metrics in the Prometheus text format.
pub fn encode() -> String {
    use prometheus::Encoder;

    let mut buffer = Vec::new();
    if let Err(err) =
        prometheus::TextEncoder::new().encode(&STORAGE.registry().gather(), &mut buffer)
    {
        tracing::warn!(?err, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Get the metrics instance.
fn get() -> &'static Metrics {
    Metrics::instance(&STORAGE)
        .expect("unexpected error getting metrics instance")
}
