//! Subscriber installation for binaries and tests.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit directive is given.
pub const DEFAULT_FILTER: &str = "enrichflow=info";

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter` (or [`DEFAULT_FILTER`]).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_not_an_error() {
        let _ = init_tracing(Some("enrichflow=debug"));
        assert!(!init_tracing(None));
    }
}
