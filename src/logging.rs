use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr log subscriber. `RUST_LOG` wins when set; otherwise
/// `warn`, or `debug` for this crate under `--verbose`.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "ier=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        tracing::debug!(error = %e, "log subscriber already installed, keeping it");
    }
}
