use tracing_subscriber::EnvFilter;

/// Install the JSON log subscriber on stderr.
///
/// `RUST_LOG` wins when set. Otherwise quiet mode disables logging and verbose mode logs
/// at info level.
pub fn init_logging(quiet: bool) {
    let default_directive = if quiet { "off" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
