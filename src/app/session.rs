// svctail - app/session.rs
//
// Aggregation session: the run of one log-watch invocation.
//
// Phases, enforced by ownership:
//   1. `AggregationSession::open` resolves names into ordered log sources.
//   2. `AggregationSession::replay` consumes the session, scans every run log
//      sequentially on the calling thread and merges the history.
//   3. `Replay::into_live` consumes the replay and only then starts the
//      followers, so no live line can reach presentation before the history
//      has been handed over in full.
//
// Failure policy: anything in phases 1-2 aborts the session before a single
// follower exists. In phase 3 a failing follower only ends its own source.

use crate::app::history;
use crate::app::present::Presenter;
use crate::app::tail::{FollowConfig, FollowTarget, HandoffMode, LiveStream, StartPosition, TailEvent};
use crate::core::merge::merge_history;
use crate::core::model::{LogLine, LogSource, ServiceOrGroup};
use crate::core::resolve::{count_services, resolve_sources, SelectionLookup};
use crate::util::error::{Result, SvcTailError, UsageError};
use std::io::Write;
use std::path::PathBuf;

/// A resolved selection, ready to be scanned.
#[derive(Debug)]
pub struct AggregationSession {
    sources: Vec<LogSource>,
    label_sources: bool,
    follow: FollowConfig,
}

impl AggregationSession {
    /// Resolve `names` through `lookup`.
    ///
    /// Fails with a usage error when nothing is selected and with a
    /// resolution error when any name is unknown; no file is touched either way.
    pub fn open<L>(names: &[String], lookup: &L, follow: FollowConfig) -> Result<Self>
    where
        L: SelectionLookup + ?Sized,
    {
        if names.is_empty() {
            return Err(UsageError::NoSelection.into());
        }
        let selection = lookup.resolve_selection(names)?;
        Ok(Self::from_selection(&selection, follow))
    }

    /// Build a session from already-resolved services and groups.
    pub fn from_selection(selection: &[ServiceOrGroup], follow: FollowConfig) -> Self {
        let sources = resolve_sources(selection);
        let label_sources = count_services(selection) > 1;

        tracing::info!(
            selected = selection.len(),
            sources = sources.len(),
            label_sources,
            "Session resolved"
        );

        Self {
            sources,
            label_sources,
            follow,
        }
    }

    /// Sources in scan order.
    pub fn sources(&self) -> &[LogSource] {
        &self.sources
    }

    /// Whether presentation should prefix lines with their service name.
    pub fn label_sources(&self) -> bool {
        self.label_sources
    }

    /// Scan every source's history and merge it oldest-first.
    ///
    /// The first source that cannot be opened, read or parsed aborts the
    /// whole session.
    pub fn replay(self) -> Result<Replay> {
        let Self {
            sources,
            label_sources,
            follow,
        } = self;

        let mut batches = Vec::with_capacity(sources.len());
        let mut targets = Vec::with_capacity(sources.len());

        for source in sources {
            let snapshot = history::read_history(&source)?;
            let start = match follow.handoff {
                HandoffMode::Offset => StartPosition::Offset(snapshot.end_offset),
                HandoffMode::LineCount => StartPosition::SkipLines(snapshot.lines_consumed),
            };
            targets.push(FollowTarget {
                source,
                start,
                lines_before: snapshot.lines_consumed,
            });
            batches.push(snapshot.entries);
        }

        let entries = merge_history(batches);

        tracing::info!(
            sources = targets.len(),
            entries = entries.len(),
            "History merged"
        );

        Ok(Replay {
            entries,
            targets,
            follow,
            label_sources,
        })
    }
}

/// Merged history plus the handoff positions for the live phase.
#[derive(Debug)]
pub struct Replay {
    entries: Vec<LogLine>,
    targets: Vec<FollowTarget>,
    follow: FollowConfig,
    label_sources: bool,
}

impl Replay {
    /// Historical lines, sorted by timestamp (stable).
    pub fn entries(&self) -> &[LogLine] {
        &self.entries
    }

    pub fn label_sources(&self) -> bool {
        self.label_sources
    }

    /// Start one follower per source, in scan order.
    pub fn into_live(self) -> LiveStream {
        LiveStream::start(self.targets, &self.follow)
    }
}

/// Run a session to completion through `presenter`.
///
/// Emits the merged history, then (if `follow_live`) every live line until
/// the live stream ends, which only happens once every follower has stopped.
pub fn watch<W: Write>(
    session: AggregationSession,
    presenter: &mut Presenter<W>,
    follow_live: bool,
) -> Result<()> {
    let replay = session.replay()?;

    for line in replay.entries() {
        presenter.emit(line).map_err(output_error)?;
    }
    presenter.flush().map_err(output_error)?;

    if !follow_live {
        return Ok(());
    }

    let live = replay.into_live();
    let mut active = live.follower_count();

    for event in live {
        match event {
            TailEvent::Line(line) => {
                presenter.emit(&line).map_err(output_error)?;
                presenter.flush().map_err(output_error)?;
            }
            TailEvent::SourceStopped { service, error } => {
                active = active.saturating_sub(1);
                tracing::warn!(
                    service = %service,
                    error = %error,
                    remaining = active,
                    "Stopped following service"
                );
            }
        }
    }

    tracing::info!(lines = presenter.emitted(), "Live stream ended");
    Ok(())
}

/// Wrap a failed write to the presentation sink.
pub fn output_error(source: std::io::Error) -> SvcTailError {
    SvcTailError::Io {
        path: PathBuf::from("<stdout>"),
        operation: "write",
        source,
    }
}
