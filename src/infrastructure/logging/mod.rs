// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Initialize logging system
///
/// `RUST_LOG` wins when set; otherwise `level` applies to this crate only.
/// Verbose mode adds source locations and thread ids to every event.
pub fn init_logging(level: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_thread_ids(verbose)
                .with_file(verbose)
                .with_line_number(verbose)
        )
        .try_init()?;

    tracing::debug!("HomeGate logging system initialized");
    Ok(())
}

fn default_directive(level: &str) -> String {
    format!("homegate={},warn", level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "homegate=debug,warn");
        assert!(EnvFilter::try_new(default_directive("info")).is_ok());
    }

    #[test]
    fn test_logging_init_twice() {
        // A second global subscriber is refused, not a panic
        let first = init_logging("info", false);
        let second = init_logging("info", false);
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
