/// Installs a `tracing` subscriber filtered by `level`, falling back to `RUST_LOG` when
/// set so operators can still override per-module filtering without a redeploy.
pub fn init(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
