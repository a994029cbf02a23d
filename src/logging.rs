//! Log output for the CLI.
//!
//! The library only emits `tracing` events. The binary installs a compact
//! stderr subscriber so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Maps the number of `-v` flags to a level for this crate's events.
fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter used when `RUST_LOG` is not set.
fn default_directive(verbosity: u8) -> String {
    format!("warn,scicat_ingest={}", default_level(verbosity))
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbosity`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_crate_level() {
        assert_eq!(default_directive(0), "warn,scicat_ingest=warn");
        assert_eq!(default_directive(1), "warn,scicat_ingest=info");
        assert_eq!(default_directive(2), "warn,scicat_ingest=debug");
        assert_eq!(default_directive(7), "warn,scicat_ingest=trace");
    }
}
