//! Tracing bootstrap.

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false));
    if registry.try_init().is_ok() {
        tracing::debug!(level, "tracing initialized");
    }
}
