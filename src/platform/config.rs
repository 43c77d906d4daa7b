// svctail - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows) and
// Library (macOS) compliance.

use crate::app::tail::{FollowConfig, HandoffMode};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for svctail configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Default config.toml location (e.g. ~/.config/svctail/config.toml).
    pub config_file: PathBuf,

    /// Default service catalog location.
    pub catalog_file: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        let config_dir = match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => proj_dirs.config_dir().to_path_buf(),
            None => {
                tracing::warn!(
                    "Could not determine platform directories, using current directory"
                );
                PathBuf::from(".")
            }
        };

        let paths = Self::in_dir(&config_dir);
        tracing::debug!(
            config = %paths.config_file.display(),
            catalog = %paths.catalog_file.display(),
            "Platform paths resolved"
        );
        paths
    }

    /// Paths rooted at an explicit directory.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self {
            config_file: config_dir.join(constants::CONFIG_FILE_NAME),
            catalog_file: config_dir.join(constants::CATALOG_FILE_NAME),
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[follow]` section.
    pub follow: FollowSection,
    /// `[catalog]` section.
    pub catalog: CatalogSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[follow]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FollowSection {
    /// Poll interval for live followers in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Capacity of the shared live channel.
    pub channel_capacity: Option<usize>,
    /// Handoff between history and live follow: "offset" or "line-count".
    pub handoff: Option<String>,
}

/// `[catalog]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Path of the services.toml catalog.
    pub file: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Follow --
    pub poll_interval_ms: u64,
    pub channel_capacity: usize,
    pub handoff: HandoffMode,

    // -- Catalog --
    /// Catalog path override (relative paths resolve against the config file).
    pub catalog_file: Option<PathBuf>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_FOLLOW_POLL_INTERVAL_MS,
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
            handoff: HandoffMode::default(),
            catalog_file: None,
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Follower settings derived from this configuration.
    pub fn follow_config(&self) -> FollowConfig {
        FollowConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            channel_capacity: self.channel_capacity,
            handoff: self.handoff,
        }
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning;
/// the tool still runs but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match load_config_explicit(config_path) {
        Ok(result) => result,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load a config file the user named explicitly (`--config`).
///
/// Unlike [`load_config`], a missing, unreadable or unparseable file is an
/// error: silently ignoring a file the user asked for would hide a typo.
/// Out-of-range values still only produce warnings.
pub fn load_config_explicit(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(validate(raw, base_dir))
}

/// Validate each field against named constants, accumulating all problems.
fn validate(raw: RawConfig, base_dir: &Path) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Follow: poll_interval_ms --
    if let Some(ms) = raw.follow.poll_interval_ms {
        if (constants::MIN_FOLLOW_POLL_INTERVAL_MS..=constants::MAX_FOLLOW_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            config.poll_interval_ms = ms;
        } else {
            warnings.push(format!(
                "[follow] poll_interval_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_FOLLOW_POLL_INTERVAL_MS,
                constants::MAX_FOLLOW_POLL_INTERVAL_MS,
                constants::DEFAULT_FOLLOW_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Follow: channel_capacity --
    if let Some(capacity) = raw.follow.channel_capacity {
        if (constants::MIN_CHANNEL_CAPACITY..=constants::MAX_CHANNEL_CAPACITY).contains(&capacity)
        {
            config.channel_capacity = capacity;
        } else {
            warnings.push(format!(
                "[follow] channel_capacity = {capacity} is out of range ({}-{}). Using default ({}).",
                constants::MIN_CHANNEL_CAPACITY,
                constants::MAX_CHANNEL_CAPACITY,
                constants::DEFAULT_CHANNEL_CAPACITY,
            ));
        }
    }

    // -- Follow: handoff --
    if let Some(ref handoff) = raw.follow.handoff {
        match HandoffMode::from_name(handoff) {
            Some(mode) => config.handoff = mode,
            None => warnings.push(format!(
                "[follow] handoff = \"{handoff}\" is not recognised. \
                 Expected \"offset\" or \"line-count\". Using default (offset).",
            )),
        }
    }

    // -- Catalog: file --
    if let Some(ref file) = raw.catalog.file {
        if !file.is_empty() {
            config.catalog_file = Some(base_dir.join(file));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn load_str(content: &str) -> (AppConfig, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        load_config(&path)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join("absent.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config.poll_interval_ms, constants::DEFAULT_FOLLOW_POLL_INTERVAL_MS);
        assert_eq!(config.handoff, HandoffMode::Offset);
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = load_str(
            r#"
            [follow]
            poll_interval_ms = 100
            channel_capacity = 16
            handoff = "line-count"

            [logging]
            level = "DEBUG"
            "#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.handoff, HandoffMode::LineCount);
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let follow = config.follow_config();
        assert_eq!(follow.poll_interval, Duration::from_millis(100));
        assert_eq!(follow.channel_capacity, 16);
    }

    #[test]
    fn test_out_of_range_values_fall_back_with_warnings() {
        let (config, warnings) = load_str(
            r#"
            [follow]
            poll_interval_ms = 1
            channel_capacity = 0
            handoff = "bytes"

            [logging]
            level = "loud"
            "#,
        );
        assert_eq!(warnings.len(), 4, "warnings: {warnings:?}");
        assert_eq!(config.poll_interval_ms, constants::DEFAULT_FOLLOW_POLL_INTERVAL_MS);
        assert_eq!(config.channel_capacity, constants::DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.handoff, HandoffMode::Offset);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_file_uses_defaults_with_warning() {
        let (config, warnings) = load_str("[follow\npoll_interval_ms = ");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"));
        assert_eq!(config.channel_capacity, constants::DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_explicit(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_catalog_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE_NAME);
        fs::write(&path, "[catalog]\nfile = \"svc/services.toml\"\n").unwrap();

        let (config, _) = load_config(&path);

        assert_eq!(
            config.catalog_file,
            Some(dir.path().join("svc/services.toml"))
        );
    }

    #[test]
    fn test_platform_paths_in_dir() {
        let paths = PlatformPaths::in_dir(Path::new("/etc/svctail"));
        assert_eq!(paths.config_file, PathBuf::from("/etc/svctail/config.toml"));
        assert_eq!(paths.catalog_file, PathBuf::from("/etc/svctail/services.toml"));
    }
}
