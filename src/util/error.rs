// svctail - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error keeps its causal chain
// so the binary can print the full context once.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all svctail operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum SvcTailError {
    /// The caller did not select anything to watch.
    Usage(UsageError),

    /// A selected name could not be resolved to a service or group.
    Resolution(ResolutionError),

    /// The service catalog could not be loaded or is inconsistent.
    Catalog(CatalogError),

    /// Configuration loading failed.
    Config(ConfigError),

    /// The historical scan of a run log failed.
    History(HistoryError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for SvcTailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(e) => write!(f, "{e}"),
            Self::Resolution(e) => write!(f, "Resolution error: {e}"),
            Self::Catalog(e) => write!(f, "Catalog error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::History(e) => write!(f, "History error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SvcTailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(e) => Some(e),
            Self::Resolution(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::History(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Usage errors
// ---------------------------------------------------------------------------

/// Errors caused by how the tool was invoked.
#[derive(Debug)]
pub enum UsageError {
    /// No service or group names were given.
    NoSelection,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSelection => write!(f, "At least one service or group must be specified"),
        }
    }
}

impl std::error::Error for UsageError {}

impl From<UsageError> for SvcTailError {
    fn from(e: UsageError) -> Self {
        Self::Usage(e)
    }
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// Errors raised while turning user-supplied names into services and groups.
#[derive(Debug)]
pub enum ResolutionError {
    /// No service or group with this name exists.
    UnknownName { name: String },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownName { name } => {
                write!(f, "Service or group not found: '{name}'")
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

impl From<ResolutionError> for SvcTailError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

/// Errors related to loading and validating the service catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The same name is declared twice (services and groups share a namespace).
    DuplicateName { name: String },

    /// A group lists a member that is declared nowhere in the catalog.
    UnknownMember { group: String, member: String },

    /// A group contains itself, directly or through nested groups.
    GroupCycle { group: String },

    /// A service has an empty name.
    MissingName { index: usize },

    /// I/O error reading the catalog file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::DuplicateName { name } => {
                write!(f, "Name '{name}' is declared more than once")
            }
            Self::UnknownMember { group, member } => {
                write!(f, "Group '{group}' references unknown member '{member}'")
            }
            Self::GroupCycle { group } => {
                write!(f, "Group '{group}' contains itself")
            }
            Self::MissingName { index } => {
                write!(f, "Service entry #{index} has no name")
            }
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading catalog '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CatalogError> for SvcTailError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

// ---------------------------------------------------------------------------
// Line parse errors
// ---------------------------------------------------------------------------

/// Errors produced when a single raw run-log line cannot be interpreted.
#[derive(Debug)]
pub enum LineParseError {
    /// The line is empty or whitespace only.
    Empty,

    /// The line is not a valid run-log record: bad JSON, a missing or
    /// unparsable `Time`, or a `Stream` other than stdout/stderr/messages.
    Malformed {
        preview: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for LineParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::Malformed { preview, source } => {
                write!(f, "could not parse log line '{preview}': {source}")
            }
        }
    }
}

impl std::error::Error for LineParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// History errors
// ---------------------------------------------------------------------------

/// Errors raised by the historical scan of a run log. All of them abort the
/// session: a partial scan would leave the live handoff position untrusted.
#[derive(Debug)]
pub enum HistoryError {
    /// The run log could not be opened (typically: the service never logged).
    Open { path: PathBuf, source: io::Error },

    /// Reading the run log failed part way through.
    Read {
        path: PathBuf,
        line_number: u64,
        source: io::Error,
    },

    /// A line in the run log could not be parsed.
    Parse {
        path: PathBuf,
        line_number: u64,
        source: LineParseError,
    },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Cannot open run log '{}': {source}", path.display())
            }
            Self::Read {
                path,
                line_number,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: read failed: {source}",
                path.display()
            ),
            Self::Parse {
                path,
                line_number,
                source,
            } => write!(f, "'{}' line {line_number}: {source}", path.display()),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl From<HistoryError> for SvcTailError {
    fn from(e: HistoryError) -> Self {
        Self::History(e)
    }
}

// ---------------------------------------------------------------------------
// Follow errors
// ---------------------------------------------------------------------------

/// Terminal errors of a single live follower. These never abort the session;
/// they are reported through the live channel and end only that source.
#[derive(Debug)]
pub enum FollowError {
    /// The run log could not be opened when the follower started.
    Open { path: PathBuf, source: io::Error },

    /// A newly appended line could not be parsed.
    Parse {
        path: PathBuf,
        line_number: u64,
        source: LineParseError,
    },
}

impl fmt::Display for FollowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Cannot follow run log '{}': {source}", path.display())
            }
            Self::Parse {
                path,
                line_number,
                source,
            } => write!(f, "'{}' line {line_number}: {source}", path.display()),
        }
    }
}

impl std::error::Error for FollowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for SvcTailError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for svctail results.
pub type Result<T> = std::result::Result<T, SvcTailError>;
