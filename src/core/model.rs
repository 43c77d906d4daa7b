// svctail - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies. These types are the shared vocabulary across
// all layers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Log line (normalised output of parsing)
// =============================================================================

/// A single line of service output, as read from a run log.
///
/// This is the unit that flows from the historical scan and the live
/// followers to presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Service that produced the line. Attached from the log source, since a
    /// run log belongs to exactly one service.
    pub service_name: String,

    /// Which output stream the line was captured from.
    pub stream: Stream,

    /// When the writer recorded the line. Used to order historical entries.
    pub timestamp: DateTime<Utc>,

    /// Line content, untrimmed. Presentation trims it and drops it if blank.
    pub message: String,
}

// =============================================================================
// Stream
// =============================================================================

/// Origin of a run-log line. Deserialised from the record's `Stream` field;
/// any other value makes the line malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// The service's standard output.
    Stdout,
    /// The service's standard error.
    Stderr,
    /// Notices synthesised by the service manager itself (lifecycle events).
    Messages,
}

// =============================================================================
// Selection (services and groups)
// =============================================================================

/// A single service as known to the service catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Unique service name.
    pub name: String,

    /// Command used to launch the service. Services without one never run
    /// and therefore never log.
    pub launch_command: Option<String>,

    /// Path of the append-only run log the service's output is written to.
    pub run_log: PathBuf,
}

impl ServiceDescriptor {
    pub fn has_launch_command(&self) -> bool {
        self.launch_command
            .as_deref()
            .is_some_and(|cmd| !cmd.trim().is_empty())
    }

    pub fn run_log_path(&self) -> &Path {
        &self.run_log
    }
}

/// A named group of services, possibly containing further groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescriptor {
    pub name: String,
    /// Nested groups, in declaration order.
    pub groups: Vec<GroupDescriptor>,
    /// Direct member services, in declaration order.
    pub services: Vec<ServiceDescriptor>,
}

/// One element of a user selection: either a single service or a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOrGroup {
    Service(ServiceDescriptor),
    Group(GroupDescriptor),
}

impl ServiceOrGroup {
    pub fn name(&self) -> &str {
        match self {
            ServiceOrGroup::Service(s) => &s.name,
            ServiceOrGroup::Group(g) => &g.name,
        }
    }
}

// =============================================================================
// Log source
// =============================================================================

/// One file-backed provider of log lines for one launchable service.
///
/// Deliberately not `Clone`: a source is owned by the historical reader
/// during the scan and then moved into exactly one live follower.
#[derive(Debug, PartialEq, Eq)]
pub struct LogSource {
    pub service_name: String,
    pub path: PathBuf,
}

impl LogSource {
    pub fn new(service_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            service_name: service_name.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(launch: Option<&str>) -> ServiceDescriptor {
        ServiceDescriptor {
            name: "api".to_string(),
            launch_command: launch.map(str::to_string),
            run_log: PathBuf::from("/tmp/api.log"),
        }
    }

    #[test]
    fn test_has_launch_command() {
        assert!(service(Some("./run.sh")).has_launch_command());
        assert!(!service(None).has_launch_command());
        assert!(!service(Some("   ")).has_launch_command());
    }

    #[test]
    fn test_stream_wire_names() {
        let parsed: Vec<Stream> =
            serde_json::from_str(r#"["stdout", "stderr", "messages"]"#).unwrap();
        assert_eq!(parsed, [Stream::Stdout, Stream::Stderr, Stream::Messages]);
        assert!(serde_json::from_str::<Stream>(r#""STDOUT""#).is_err());
    }
}
