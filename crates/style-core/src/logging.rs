use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the diagnostic tracing subscriber.
///
/// Uses the `RUST_LOG` environment variable, defaulting to "info".
/// `verbose` forces "debug" regardless of the environment.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let filter_layer = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info};

    #[test]
    fn test_logging_init() {
        // Only the first init in a process succeeds
        let _ = init(true);
        assert!(init(false).is_err());

        debug!("debug message");
        info!("info message");
    }
}
