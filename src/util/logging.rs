// svctail - util/logging.rs
//
// Diagnostics for the CLI. Stdout carries the aggregated service output and
// nothing else, so every tracing event goes to stderr and the default level
// only lets warnings through. `svctail api | grep ERROR` never sees a
// diagnostic line.
//
// Level precedence, first match wins:
//   RUST_LOG  >  --debug  >  config.toml [logging] level  >  "warn"

use crate::util::constants::{APP_NAME, APP_VERSION, DEFAULT_LOG_LEVEL};
use tracing_subscriber::EnvFilter;

/// Which setting produced the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOrigin {
    Env,
    DebugFlag,
    Config,
    Default,
}

/// Resolve the filter directive from the candidate settings.
fn choose_directive(
    rust_log: Option<String>,
    debug_flag: bool,
    config_level: Option<&str>,
) -> (FilterOrigin, String) {
    match (rust_log, debug_flag, config_level) {
        (Some(directive), _, _) if !directive.trim().is_empty() => (FilterOrigin::Env, directive),
        (_, true, _) => (FilterOrigin::DebugFlag, "debug".to_string()),
        (_, _, Some(level)) => (FilterOrigin::Config, level.to_string()),
        _ => (FilterOrigin::Default, DEFAULT_LOG_LEVEL.to_string()),
    }
}

/// Install the stderr subscriber.
///
/// A malformed RUST_LOG falls back to the default level instead of failing
/// startup. Calling this twice keeps the first subscriber.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let (origin, directive) =
        choose_directive(std::env::var("RUST_LOG").ok(), debug_flag, config_level);

    let (filter, rejected) = match EnvFilter::try_new(&directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_LEVEL), Some(e)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .compact()
        .try_init();

    if let Some(e) = rejected {
        tracing::warn!(directive = %directive, error = %e, "Invalid log filter, using default");
    }
    tracing::debug!(
        app = APP_NAME,
        version = APP_VERSION,
        origin = ?origin,
        directive = %directive,
        "Diagnostics enabled"
    );
}
