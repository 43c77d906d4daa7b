// svctail - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "svctail";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "svctail";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Presentation
// =============================================================================

/// Banner printed once before the historical replay.
pub const LOGS_BANNER: &str = "=== Logs ===";

/// Suffix added to the source label for lines synthesised by the service
/// manager itself (the `messages` stream).
pub const MESSAGES_LABEL: &str = "svctail";

// =============================================================================
// Live follow limits
// =============================================================================

/// How often each follower polls its run log for new content (ms).
pub const DEFAULT_FOLLOW_POLL_INTERVAL_MS: u64 = 250;

/// Minimum user-configurable follow poll interval (ms).
pub const MIN_FOLLOW_POLL_INTERVAL_MS: u64 = 10;

/// Maximum user-configurable follow poll interval (ms).
pub const MAX_FOLLOW_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

/// How often the cancel flag is checked within each poll sleep interval (ms).
pub const FOLLOW_CANCEL_CHECK_INTERVAL_MS: u64 = 50;

/// Maximum bytes read from a single run log in one poll tick.
/// Larger bursts are consumed over several ticks.
pub const MAX_FOLLOW_READ_BYTES_PER_TICK: usize = 512 * 1_024; // 512 KiB

/// Default capacity of the shared live channel. Followers block (never drop)
/// once this many events are queued and the consumer has not caught up.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Minimum user-configurable live channel capacity.
pub const MIN_CHANNEL_CAPACITY: usize = 1;

/// Maximum user-configurable live channel capacity.
pub const MAX_CHANNEL_CAPACITY: usize = 65_536;

// =============================================================================
// Logging
// =============================================================================

/// Default diagnostic log level. Kept quiet because stdout carries the
/// aggregated service output itself.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maximum length of a raw run-log line included in error messages and
/// debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Service catalog file name (looked up in the config directory by default).
pub const CATALOG_FILE_NAME: &str = "services.toml";

/// Extension appended to a service name to form its default run-log file name.
pub const RUN_LOG_EXTENSION: &str = "log";
