//! Tracing setup for structured logging.
//!
//! The engine only emits `tracing` events; installing a subscriber is the
//! embedding host's call. These helpers cover the common case of a
//! standalone process.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global subscriber with the given filter directives
/// (e.g. "info", "cobalt_store=debug").
///
/// `RUST_LOG` takes precedence over `filter` when set. With `json` the
/// output is line-delimited JSON for log shippers; otherwise a compact
/// human-readable format.
pub fn init_tracing(filter: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    tracing::info!(filter, json, "Tracing initialized");
}

/// Install a global subscriber configured from `RUST_LOG` and
/// `COBALT_LOG_JSON`.
pub fn init_tracing_from_env() {
    let json = std::env::var("COBALT_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    init_tracing(&filter, json);
}
