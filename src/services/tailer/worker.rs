//! Tailer Worker Task
//!
//! Owns all per-file state of a running tailer: positions, debounce timers,
//! and the duplicate-emission guard. Raw notifications arrive over a channel;
//! each re-arms the file's debounce timer, and the file is read once the
//! timer expires.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use prompt_coach_core::PromptEvent;
use serde::Serialize;
use tokio::fs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::time::{delay_queue, DelayQueue};

use super::dedupe::RecentEmissions;
use super::events::{TailerEmitter, TailerError};
use super::parser::{parse_line, ParsedLine};
use super::position::{read_complete_lines, Change, FilePosition, Observation};

/// Raw input to the worker
#[derive(Debug)]
pub enum Notification {
    /// A file may have changed
    Changed(PathBuf),
    /// The native watcher reported a failure
    Failed(notify::Error),
}

/// Counters shared between the worker and the tailer handle
#[derive(Debug, Default)]
pub struct StatsCounters {
    emitted: AtomicU64,
    duplicates: AtomicU64,
    malformed: AtomicU64,
}

impl StatsCounters {
    pub fn snapshot(&self) -> TailerStats {
        TailerStats {
            prompts_emitted: self.emitted.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates.load(Ordering::Relaxed),
            malformed_lines: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time tailer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TailerStats {
    pub prompts_emitted: u64,
    pub duplicates_suppressed: u64,
    pub malformed_lines: u64,
}

pub struct TailWorker {
    emitter: TailerEmitter,
    stats: Arc<StatsCounters>,
    positions: HashMap<PathBuf, FilePosition>,
    recent: RecentEmissions,
    pending: HashMap<PathBuf, delay_queue::Key>,
    timers: DelayQueue<PathBuf>,
    debounce: Duration,
}

impl TailWorker {
    pub fn new(
        emitter: TailerEmitter,
        stats: Arc<StatsCounters>,
        positions: HashMap<PathBuf, FilePosition>,
        dedupe_capacity: usize,
        debounce: Duration,
    ) -> Self {
        Self {
            emitter,
            stats,
            positions,
            recent: RecentEmissions::new(dedupe_capacity),
            pending: HashMap::new(),
            timers: DelayQueue::new(),
            debounce,
        }
    }

    /// Drive the worker until cancelled or the notification channel closes.
    ///
    /// A file being read when cancellation arrives is finished first; pending
    /// timers are discarded.
    pub async fn run(
        mut self,
        mut notifications: mpsc::UnboundedReceiver<Notification>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    let path = expired.into_inner();
                    self.pending.remove(&path);
                    self.process(path).await;
                }

                notification = notifications.recv() => match notification {
                    Some(Notification::Changed(path)) => self.schedule(path),
                    Some(Notification::Failed(error)) => {
                        self.emitter.emit_error(TailerError::from_notify_error(&error));
                    }
                    None => break,
                },
            }
        }

        self.timers.clear();
        self.pending.clear();
        tracing::debug!(files = self.positions.len(), "Tailer worker exited");
    }

    /// Arm or re-arm the debounce timer of a file.
    fn schedule(&mut self, path: PathBuf) {
        match self.pending.get(&path) {
            Some(key) => self.timers.reset(key, self.debounce),
            None => {
                let key = self.timers.insert(path.clone(), self.debounce);
                self.pending.insert(path, key);
            }
        }
    }

    async fn process(&mut self, path: PathBuf) {
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.positions.remove(&path).is_some() {
                    tracing::debug!(path = %path.display(), "Log file removed");
                }
                return;
            }
            Err(e) => {
                self.emitter.emit_error(TailerError::from_io_error(&e, path));
                return;
            }
        };
        if !metadata.is_file() {
            return;
        }

        let seen = Observation::of(&metadata);
        let position = self
            .positions
            .entry(path.clone())
            .or_insert_with(|| FilePosition::unseen(&path));

        let lines = match position.change(seen) {
            Change::Unchanged => {
                let offset = position.offset.min(seen.byte_size);
                position.commit(seen, offset);
                return;
            }
            Change::Appended { from, to } => match read_complete_lines(&path, from, to).await {
                Ok(window) => {
                    position.commit(seen, window.next_offset);
                    window.lines
                }
                Err(e) => {
                    self.emitter.emit_error(TailerError::from_io_error(&e, path));
                    return;
                }
            },
        };

        for line in &lines {
            self.handle_line(line, &path);
        }
    }

    fn handle_line(&mut self, line: &str, path: &Path) {
        match parse_line(line, path) {
            ParsedLine::Prompt(prompt) => {
                if !self.recent.insert(prompt.emission_key()) {
                    self.stats.duplicates.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        session_id = %prompt.session_id,
                        timestamp = %prompt.timestamp,
                        "Suppressed duplicate prompt"
                    );
                    return;
                }
                self.stats.emitted.fetch_add(1, Ordering::Relaxed);
                self.emitter.emit_prompt(PromptEvent {
                    prompt,
                    file_path: path.to_path_buf(),
                });
            }
            ParsedLine::Skipped => {}
            ParsedLine::Malformed(reason) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(path = %path.display(), reason = %reason, "Skipping malformed log line");
            }
        }
    }
}
