use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for the engine.
///
/// Filtering is controlled by `TABGRID_LOG` (falling back to
/// `RUST_LOG`), e.g. `TABGRID_LOG=tabgrid::engine=debug`.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = std::env::var("TABGRID_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(|spec| EnvFilter::new(spec))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
