//! Logging setup.
//!
//! `RUST_LOG` wins when set; otherwise `[logging] level` from `quire.toml`
//! applies. Logs go to stderr so command output on stdout stays clean.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// The filter `init` would install for `level`, given `RUST_LOG`.
pub fn filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(level),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let rust_log = std::env::var("RUST_LOG").ok();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry()
        .with(filter(level, rust_log.as_deref()))
        .with(fmt_layer)
        .try_init();
}
