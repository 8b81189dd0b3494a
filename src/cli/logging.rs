//! Logging initialization

/// Initialize logging based on debug flag
///
/// Logs go to stderr so they never mix with the narration on stdout.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };

    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .try_init();

    // A subscriber may already be installed when embedded in tests
    if result.is_err() {
        tracing::debug!("Tracing subscriber already initialized");
    }
}
