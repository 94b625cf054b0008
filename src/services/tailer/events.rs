//! Tailer Event Definitions
//!
//! Events emitted by the log tailer and the channel plumbing that delivers
//! them. Delivery is gated: once the tailer is stopped, subscribers observe
//! no further events, even ones already queued.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use prompt_coach_core::PromptEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Types of tailer errors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TailerErrorKind {
    /// Permission denied to watch or read a path
    PermissionDenied,
    /// Path does not exist
    PathNotFound,
    /// Too many files to watch
    MaxFilesReached,
    /// Reading a log file failed
    Read,
    /// Generic watch error
    Generic,
}

/// A recoverable problem observed while tailing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TailerError {
    pub message: String,
    pub path: Option<PathBuf>,
    pub kind: TailerErrorKind,
}

impl TailerError {
    /// Create a new tailer error
    pub fn new(message: impl Into<String>, path: Option<PathBuf>, kind: TailerErrorKind) -> Self {
        Self {
            message: message.into(),
            path,
            kind,
        }
    }

    /// Create from a notify error
    pub fn from_notify_error(error: &notify::Error) -> Self {
        let kind = match &error.kind {
            notify::ErrorKind::PathNotFound => TailerErrorKind::PathNotFound,
            notify::ErrorKind::MaxFilesWatch => TailerErrorKind::MaxFilesReached,
            notify::ErrorKind::Io(io_err)
                if io_err.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                TailerErrorKind::PermissionDenied
            }
            _ => TailerErrorKind::Generic,
        };

        let path = error.paths.first().cloned();

        Self::new(error.to_string(), path, kind)
    }

    /// Create from a failed read of a log file
    pub fn from_io_error(error: &std::io::Error, path: PathBuf) -> Self {
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            TailerErrorKind::PermissionDenied
        } else {
            TailerErrorKind::Read
        };
        Self::new(error.to_string(), Some(path), kind)
    }
}

impl std::fmt::Display for TailerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.message, path.display()),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Events observed by tailer subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailerEvent {
    /// The tailer is watching and has snapshotted existing files
    Ready,
    /// A newly appended prompt
    Prompt(PromptEvent),
    /// A recoverable watch or read failure
    Error(TailerError),
}

/// Receiving half of a tailer subscription.
#[derive(Debug)]
pub struct TailerEvents {
    rx: mpsc::UnboundedReceiver<TailerEvent>,
    active: Arc<AtomicBool>,
}

impl TailerEvents {
    /// Wait for the next event.
    ///
    /// Returns `None` once the tailer has been stopped.
    pub async fn recv(&mut self) -> Option<TailerEvent> {
        if !self.active.load(Ordering::Acquire) {
            return None;
        }
        let event = self.rx.recv().await?;
        if !self.active.load(Ordering::Acquire) {
            return None;
        }
        Some(event)
    }

    /// Take an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<TailerEvent> {
        if !self.active.load(Ordering::Acquire) {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

/// Sending half shared by the tailer and its worker task.
#[derive(Debug, Clone)]
pub struct TailerEmitter {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<TailerEvent>>>>,
    active: Arc<AtomicBool>,
}

impl TailerEmitter {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> TailerEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        TailerEvents {
            rx,
            active: self.active.clone(),
        }
    }

    /// Open the gate; events flow to subscribers
    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Close the gate and end every subscription
    pub fn shutdown(&self) {
        self.active.store(false, Ordering::Release);
        self.lock().clear();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Emit the ready event
    pub fn emit_ready(&self) {
        self.emit(TailerEvent::Ready);
    }

    /// Emit a prompt event
    pub fn emit_prompt(&self, event: PromptEvent) {
        self.emit(TailerEvent::Prompt(event));
    }

    /// Emit an error event
    pub fn emit_error(&self, error: TailerError) {
        tracing::warn!(error = %error, "Tailer error");
        self.emit(TailerEvent::Error(error));
    }

    fn emit(&self, event: TailerEvent) {
        if !self.is_active() {
            return;
        }
        // Dropped subscriptions are pruned on the way
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<TailerEvent>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TailerEmitter {
    fn default() -> Self {
        Self::new()
    }
}
