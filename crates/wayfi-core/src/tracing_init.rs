//! Logging setup for the wayfi binaries.
//!
//! Every wayfi crate logs through `tracing`; the server installs one global
//! subscriber at startup. `RUST_LOG` wins over the configured level so that a
//! single module can be turned up without touching the settings file.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events the configured `log_level` applies to.
const WAYFI_TARGETS: [&str; 3] = ["wayfi_server", "wayfi_core", "wayfi_crypto"];

/// Filter directive applying `level` to every wayfi crate. Dependencies
/// (sqlx, hyper) stay silent unless `RUST_LOG` names them.
pub fn default_filter(level: &str) -> String {
    WAYFI_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `log_json` switches to one JSON object per
/// line for log aggregation.
pub fn init_tracing(level: &str, log_json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_every_wayfi_crate() {
        assert_eq!(
            default_filter("debug"),
            "wayfi_server=debug,wayfi_core=debug,wayfi_crypto=debug"
        );
    }

    #[test]
    fn filter_parses_as_directives() {
        assert!(EnvFilter::try_new(default_filter("warn")).is_ok());
    }
}
