// svctail - app/tail.rs
//
// Live follow: one background thread per run log, each picking up exactly
// where the historical scan stopped and feeding a single shared channel.
//
// Architecture:
//   - `LiveStream` owns the receiving end of a bounded `sync_channel`, the
//     shared cancel flag and the follower join handles.
//   - `run_follower` runs on its own thread per source, polling the file on
//     a fixed interval for appended bytes.
//   - A full channel blocks the follower; nothing is ever dropped.
//   - Dropping or stopping the stream sets the cancel flag, drops the
//     receiver (unblocking any follower stuck in `send`) and joins them all.
//
// Failure handling:
//   - Cannot open the file at start, or a line that does not parse: the
//     follower ends and reports `TailEvent::SourceStopped`. Other followers
//     are unaffected.
//   - Stat/read errors after a successful start are logged and retried on
//     the next tick; the follower stalls instead of ending.
//   - A file that shrinks below the read offset is treated as truncated and
//     re-read from byte 0. Rotation is not detected.

use crate::core::model::{LogLine, LogSource};
use crate::core::parser;
use crate::util::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_FOLLOW_POLL_INTERVAL_MS, FOLLOW_CANCEL_CHECK_INTERVAL_MS,
    MAX_FOLLOW_READ_BYTES_PER_TICK,
};
use crate::util::error::FollowError;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// =============================================================================
// Public types
// =============================================================================

/// How a follower locates the end of the history it must not repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandoffMode {
    /// Seek straight to the byte offset where the scan stopped.
    #[default]
    Offset,
    /// Re-read the file from the start and discard the number of lines the
    /// scan consumed.
    LineCount,
}

impl HandoffMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffMode::Offset => "offset",
            HandoffMode::LineCount => "line-count",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "offset" => Some(HandoffMode::Offset),
            "line-count" | "line_count" | "lines" => Some(HandoffMode::LineCount),
            _ => None,
        }
    }
}

/// Where a follower starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Start at this byte offset.
    Offset(u64),
    /// Start at byte 0 and discard this many complete lines.
    SkipLines(u64),
}

/// Settings shared by every follower in a session.
#[derive(Debug, Clone)]
pub struct FollowConfig {
    pub poll_interval: Duration,
    pub channel_capacity: usize,
    pub handoff: HandoffMode,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_FOLLOW_POLL_INTERVAL_MS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            handoff: HandoffMode::default(),
        }
    }
}

/// One source to follow, with the position handed over by its history scan.
#[derive(Debug)]
pub struct FollowTarget {
    pub source: LogSource,
    pub start: StartPosition,
    /// Lines already consumed before `start`, used to number lines in errors.
    pub lines_before: u64,
}

/// Messages delivered on the shared live channel.
#[derive(Debug)]
pub enum TailEvent {
    /// A newly appended line.
    Line(LogLine),
    /// A follower ended for good. No further lines arrive for `service`.
    SourceStopped { service: String, error: FollowError },
}

// =============================================================================
// LiveStream
// =============================================================================

/// Arrival-ordered stream of live lines from every followed source.
///
/// Not restartable; consumed once. Iterating blocks until the next event and
/// ends when every follower has exited.
pub struct LiveStream {
    rx: Option<Receiver<TailEvent>>,
    cancel: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

/// Cloneable handle that ends a `LiveStream` from another thread.
#[derive(Debug, Clone)]
pub struct Canceller {
    flag: Arc<AtomicBool>,
}

impl Canceller {
    /// Ask every follower to stop at its next line or poll boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl LiveStream {
    /// Spawn one follower per target, in target order.
    pub fn start(targets: Vec<FollowTarget>, config: &FollowConfig) -> Self {
        let (tx, rx) = mpsc::sync_channel(config.channel_capacity.max(1));
        let cancel = Arc::new(AtomicBool::new(false));

        let follower_count = targets.len();
        let workers = targets
            .into_iter()
            .map(|target| {
                let tx = tx.clone();
                let cancel = Arc::clone(&cancel);
                let poll_interval = config.poll_interval;
                std::thread::spawn(move || {
                    run_follower(target, poll_interval, tx, cancel);
                })
            })
            .collect();

        tracing::info!(
            followers = follower_count,
            capacity = config.channel_capacity,
            "Live follow started"
        );

        Self {
            rx: Some(rx),
            cancel,
            workers,
        }
    }

    /// Number of follower threads started.
    pub fn follower_count(&self) -> usize {
        self.workers.len()
    }

    /// Block until the next event. `None` once every follower has exited.
    pub fn recv(&self) -> Option<TailEvent> {
        self.rx.as_ref()?.recv().ok()
    }

    /// Block for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<TailEvent, RecvTimeoutError> {
        match &self.rx {
            Some(rx) => rx.recv_timeout(timeout),
            None => Err(RecvTimeoutError::Disconnected),
        }
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            flag: Arc::clone(&self.cancel),
        }
    }

    /// Stop every follower and wait for all of them to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        // Dropping the receiver fails any send a follower is blocked in.
        self.rx = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("Follower thread panicked");
            }
        }
    }
}

impl Iterator for LiveStream {
    type Item = TailEvent;

    fn next(&mut self) -> Option<TailEvent> {
        self.recv()
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
            tracing::debug!("Live follow stopped");
        }
    }
}

// =============================================================================
// Per-file read state
// =============================================================================

/// Byte-level read state of one followed file. Free of I/O so the line
/// splitting, skipping and truncation rules can be tested directly.
#[derive(Debug)]
struct FollowState {
    /// Byte position of the next byte to read.
    offset: u64,
    /// Complete lines still to discard (line-count handoff).
    skip_remaining: u64,
    /// 1-based number of the last complete line seen.
    line_number: u64,
    /// Bytes after the most recent newline: an in-progress line.
    partial: Vec<u8>,
}

impl FollowState {
    fn new(start: StartPosition, lines_before: u64) -> Self {
        match start {
            StartPosition::Offset(offset) => Self {
                offset,
                skip_remaining: 0,
                line_number: lines_before,
                partial: Vec::new(),
            },
            StartPosition::SkipLines(count) => Self {
                offset: 0,
                skip_remaining: count,
                line_number: 0,
                partial: Vec::new(),
            },
        }
    }

    /// Reset when the file is now shorter than what was already read.
    /// Returns true if a reset happened.
    fn observe_size(&mut self, size: u64) -> bool {
        if size >= self.offset {
            return false;
        }
        self.offset = 0;
        self.line_number = 0;
        self.partial.clear();
        true
    }

    /// Consume freshly read bytes and return the complete lines to deliver,
    /// numbered, with trailing newlines removed.
    fn ingest(&mut self, bytes: &[u8]) -> Vec<(u64, String)> {
        self.offset += bytes.len() as u64;
        self.partial.extend_from_slice(bytes);

        let Some(last_nl) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let rest = self.partial.split_off(last_nl + 1);
        let complete = std::mem::replace(&mut self.partial, rest);

        let mut lines = Vec::new();
        for raw in complete[..complete.len() - 1].split(|&b| b == b'\n') {
            self.line_number += 1;
            if self.skip_remaining > 0 {
                self.skip_remaining -= 1;
                continue;
            }
            lines.push((self.line_number, String::from_utf8_lossy(raw).into_owned()));
        }
        lines
    }
}

// =============================================================================
// Background follower
// =============================================================================

/// Follow one run log until cancelled, the receiver goes away, or a line
/// fails to parse.
fn run_follower(
    target: FollowTarget,
    poll_interval: Duration,
    tx: SyncSender<TailEvent>,
    cancel: Arc<AtomicBool>,
) {
    let FollowTarget {
        source,
        start,
        lines_before,
    } = target;

    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                // Receiver dropped; the session is over.
                return;
            }
        };
    }

    if let Err(e) = std::fs::File::open(&source.path) {
        tracing::debug!(
            service = %source.service_name,
            file = %source.path.display(),
            error = %e,
            "Follow: cannot open run log"
        );
        send!(TailEvent::SourceStopped {
            service: source.service_name.clone(),
            error: FollowError::Open {
                path: source.path.clone(),
                source: e,
            },
        });
        return;
    }

    tracing::debug!(
        service = %source.service_name,
        file = %source.path.display(),
        start = ?start,
        "Follow: started"
    );

    let mut state = FollowState::new(start, lines_before);
    let mut stalled = false;

    loop {
        if cancel.load(Ordering::SeqCst) {
            return;
        }

        let mut more_pending = false;
        match read_appended(&source.path, &mut state) {
            Ok((lines, pending)) => {
                if stalled {
                    tracing::info!(file = %source.path.display(), "Follow: run log readable again");
                    stalled = false;
                }
                more_pending = pending;

                for (line_number, raw) in lines {
                    if cancel.load(Ordering::SeqCst) {
                        return;
                    }
                    match parser::parse_line_for(&source.service_name, &raw) {
                        Ok(line) => send!(TailEvent::Line(line)),
                        Err(e) => {
                            tracing::debug!(
                                service = %source.service_name,
                                file = %source.path.display(),
                                line = line_number,
                                error = %e,
                                "Follow: unparsable line, stopping this source"
                            );
                            send!(TailEvent::SourceStopped {
                                service: source.service_name.clone(),
                                error: FollowError::Parse {
                                    path: source.path.clone(),
                                    line_number,
                                    source: e,
                                },
                            });
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                if !stalled {
                    tracing::warn!(
                        file = %source.path.display(),
                        error = %e,
                        "Follow: cannot read run log, will retry"
                    );
                    stalled = true;
                }
            }
        }

        if !more_pending && sleep_interruptible(poll_interval, &cancel) {
            return;
        }
    }
}

/// Read whatever was appended since the last tick (capped per tick).
///
/// Returns the complete lines to deliver and whether unread bytes remain.
fn read_appended(
    path: &Path,
    state: &mut FollowState,
) -> std::io::Result<(Vec<(u64, String)>, bool)> {
    let size = std::fs::metadata(path)?.len();

    if state.observe_size(size) {
        tracing::info!(
            file = %path.display(),
            new_size = size,
            "Follow: file truncated, re-reading from the start"
        );
    }

    if size == state.offset {
        return Ok((Vec::new(), false));
    }

    let available = (size - state.offset) as usize;
    let limit = available.min(MAX_FOLLOW_READ_BYTES_PER_TICK);
    let bytes = read_bytes_at(path, state.offset, limit)?;
    if bytes.is_empty() {
        return Ok((Vec::new(), false));
    }

    let pending = bytes.len() < available;
    Ok((state.ingest(&bytes), pending))
}

/// Read at most `limit` bytes from `path` starting at byte position `offset`.
fn read_bytes_at(path: &Path, offset: u64, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Sleep for `total`, waking every `FOLLOW_CANCEL_CHECK_INTERVAL_MS` to check
/// the cancel flag. Returns true if cancellation was requested.
fn sleep_interruptible(total: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    let slice = Duration::from_millis(FOLLOW_CANCEL_CHECK_INTERVAL_MS);
    loop {
        if cancel.load(Ordering::SeqCst) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(slice.min(deadline - now));
    }
}
