//! Logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the given verbosity
///
/// `-v` and `-vv` take precedence over the configured level.
pub fn filter_directive(configured: &str, verbose: u8) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global `tracing` subscriber (honors `RUST_LOG` if present)
pub fn init_logging(configured: &str, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(configured, verbose)));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive("info", 0), "info");
        assert_eq!(filter_directive("warn,tower_http=debug", 0), "warn,tower_http=debug");
        assert_eq!(filter_directive("info", 1), "debug");
        assert_eq!(filter_directive("info", 2), "trace");
        assert_eq!(filter_directive("info", 5), "trace");
    }
}
