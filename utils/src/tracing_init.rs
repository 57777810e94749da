use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Initializes a process-wide `tracing` subscriber for the engine.
/// Mirrors `tracer::init_tracing` minus the OpenTelemetry exporter: this
/// core has no network collector to talk to, so only the stdout layer
/// is kept.
pub fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer().pretty();
    let subscriber = Registry::default().with(env_filter).with(stdout_layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already set, skipping re-initialization");
    }
}
