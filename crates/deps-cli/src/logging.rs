use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber, writing compact logs to stderr.
///
/// `RUST_LOG` decides the level unless `verbose` forces `debug`; the
/// default is `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    // a subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
