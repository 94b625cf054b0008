//! Log Tailer Service
//!
//! Watches a directory tree of append-only `*.jsonl` logs with the `notify`
//! crate and emits each newly appended prompt exactly once per run.
//!
//! The native watcher callback only forwards paths into a channel. A worker
//! task coalesces bursts with a per-file debounce window, reads complete new
//! lines, and publishes events to subscribers.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::events::{TailerEmitter, TailerEvents};
use super::position::{FilePosition, Observation};
use super::worker::{Notification, StatsCounters, TailWorker, TailerStats};
use crate::models::settings::{Settings, DEFAULT_DEBOUNCE_MS, DEFAULT_DEDUPE_CAPACITY};
use crate::utils::error::{AppError, AppResult};

/// Extension of the log files being tailed
pub const LOG_EXTENSION: &str = "jsonl";

/// Configuration for the log tailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailerConfig {
    /// Per-file debounce window
    pub debounce_ms: u64,
    /// Capacity of the duplicate-emission guard
    pub dedupe_capacity: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            dedupe_capacity: DEFAULT_DEDUPE_CAPACITY,
        }
    }
}

impl From<&Settings> for TailerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            debounce_ms: settings.debounce_ms,
            dedupe_capacity: settings.dedupe_capacity,
        }
    }
}

struct RunningTailer {
    /// Dropping the watcher releases the native handle
    watcher: RecommendedWatcher,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Cloneable handle that feeds synthetic change notifications to a tailer.
///
/// Notifications sent before `start` are queued and processed once the
/// tailer runs; after `stop` sending fails.
#[derive(Debug, Clone)]
pub struct TailerTrigger {
    tx: mpsc::UnboundedSender<Notification>,
}

impl TailerTrigger {
    /// Report that `path` may have changed.
    pub fn trigger(&self, path: impl Into<PathBuf>) -> AppResult<()> {
        self.tx
            .send(Notification::Changed(path.into()))
            .map_err(|_| AppError::validation("Log tailer is stopped"))
    }
}

/// Tails every `*.jsonl` file below a root directory.
///
/// Files present at [`start`](Self::start) are tracked from their current
/// size; files that appear later are read from the beginning. Subscriptions
/// end when the tailer stops; subscribe again after a restart.
pub struct LogTailer {
    root: PathBuf,
    config: TailerConfig,
    emitter: TailerEmitter,
    stats: Arc<StatsCounters>,
    notify_tx: mpsc::UnboundedSender<Notification>,
    notify_rx: Option<mpsc::UnboundedReceiver<Notification>>,
    running: Option<RunningTailer>,
}

impl LogTailer {
    /// Create a tailer with the default configuration
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, TailerConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(root: impl Into<PathBuf>, config: TailerConfig) -> Self {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        Self {
            root: root.into(),
            config,
            emitter: TailerEmitter::new(),
            stats: Arc::new(StatsCounters::default()),
            notify_tx,
            notify_rx: Some(notify_rx),
            running: None,
        }
    }

    /// Tail the configured Claude projects directory
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::with_config(
            settings.projects_dir()?,
            TailerConfig::from(settings),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Subscribe to tailer events.
    ///
    /// Subscribe before `start` to observe the `Ready` event.
    pub fn subscribe(&self) -> TailerEvents {
        self.emitter.subscribe()
    }

    /// Start watching. Emits `Ready` once existing files are snapshotted.
    pub async fn start(&mut self) -> AppResult<()> {
        if self.running.is_some() {
            return Ok(());
        }

        if !fs::try_exists(&self.root).await? {
            return Err(AppError::not_found(format!(
                "Log directory not found: {}",
                self.root.display()
            )));
        }

        let notify_rx = match self.notify_rx.take() {
            Some(rx) => rx,
            None => {
                // Restarted after stop: the previous channel died with its worker
                let (tx, rx) = mpsc::unbounded_channel();
                self.notify_tx = tx;
                rx
            }
        };
        let native_tx = self.notify_tx.clone();
        let mut watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    for path in event.paths {
                        if is_log_file(&path) {
                            let _ = native_tx.send(Notification::Changed(path));
                        }
                    }
                }
                Err(error) => {
                    let _ = native_tx.send(Notification::Failed(error));
                }
            },
        )?;

        // Watch before scanning so appends racing the scan still notify
        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        let positions = snapshot_positions(&self.root).await?;
        let tracked = positions.len();

        self.emitter.activate();
        self.emitter.emit_ready();

        let cancel = CancellationToken::new();
        let worker = TailWorker::new(
            self.emitter.clone(),
            self.stats.clone(),
            positions,
            self.config.dedupe_capacity,
            Duration::from_millis(self.config.debounce_ms),
        );
        let task = tokio::spawn(worker.run(notify_rx, cancel.clone()));

        self.running = Some(RunningTailer {
            watcher,
            cancel,
            task,
        });

        tracing::info!(
            root = %self.root.display(),
            files = tracked,
            debounce_ms = self.config.debounce_ms,
            "Log tailer started"
        );
        Ok(())
    }

    /// Stop watching.
    ///
    /// Pending debounce timers are cancelled and the native watcher is
    /// released. No event is observable by any subscriber after this returns.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        self.emitter.shutdown();
        running.cancel.cancel();
        drop(running.watcher);

        if let Err(e) = running.task.await {
            tracing::warn!(error = %e, "Tailer worker ended abnormally");
        }
        tracing::info!(root = %self.root.display(), "Log tailer stopped");
    }

    /// Feed a synthetic change notification for `path`.
    pub fn trigger(&self, path: impl Into<PathBuf>) -> AppResult<()> {
        self.trigger_handle().trigger(path)
    }

    /// A handle for triggering from elsewhere, e.g. while the tailer is
    /// owned by a watch loop.
    pub fn trigger_handle(&self) -> TailerTrigger {
        TailerTrigger {
            tx: self.notify_tx.clone(),
        }
    }

    /// Counters accumulated since the tailer was created
    pub fn stats(&self) -> TailerStats {
        self.stats.snapshot()
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            self.emitter.shutdown();
            running.cancel.cancel();
        }
    }
}

/// Builder for LogTailer
pub struct LogTailerBuilder {
    root: PathBuf,
    config: TailerConfig,
}

impl LogTailerBuilder {
    /// Create a new builder
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: TailerConfig::default(),
        }
    }

    /// Set the debounce duration
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    /// Set the duplicate-emission guard capacity
    pub fn dedupe_capacity(mut self, capacity: usize) -> Self {
        self.config.dedupe_capacity = capacity;
        self
    }

    /// Build the tailer
    pub fn build(self) -> LogTailer {
        LogTailer::with_config(self.root, self.config)
    }
}

fn is_log_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
}

/// Positions of every log file currently below `root`, tracked at their end.
async fn snapshot_positions(root: &Path) -> AppResult<HashMap<PathBuf, FilePosition>> {
    let mut positions = HashMap::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A subdirectory removed mid-scan is not an error
            Err(e) if e.kind() == ErrorKind::NotFound && dir != root => continue,
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() && is_log_file(&path) {
                let metadata = entry.metadata().await?;
                let position = FilePosition::at_end(&path, Observation::of(&metadata));
                positions.insert(path, position);
            }
        }
    }

    Ok(positions)
}
