use tracing_subscriber::prelude::*;

/// Installs a stdout `tracing` subscriber. `RUST_LOG` overrides
/// `default_filter`. Returns false if a global subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

/// Subscriber that writes through the test harness's captured output.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("worldstyler=debug"))
        .with_test_writer()
        .try_init();
}
