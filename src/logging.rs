use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,model_controller=debug";

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Returns `false` when a global subscriber is already installed, which
/// makes repeated calls (e.g. from several tests) harmless.
pub fn init() -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
