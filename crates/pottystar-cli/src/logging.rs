//! Logging initialization.
//!
//! Logs go to stderr so stdout stays clean for the countdown and JSON events.
//! `POTTYSTAR_LOG` overrides the verbosity flags with a full filter directive.

use tracing_subscriber::EnvFilter;

/// Maps a verbosity level to a tracing directive string.
pub fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Uses `try_init()` so a second call is harmless.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env("POTTYSTAR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_saturates_at_trace() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(9), "trace");
    }
}
