//! Log Tailing
//!
//! Real-time, exactly-once ingestion of Claude Code project logs.
//!
//! - `watcher`: `LogTailer` lifecycle (start, stop, subscribe, trigger)
//! - `worker`: debounce timers and per-file reads
//! - `position`: byte offsets and complete-line reads
//! - `parser`: log line to `Prompt`
//! - `dedupe`: duplicate-emission guard
//! - `events`: event types and gated delivery

pub mod dedupe;
pub mod events;
pub mod parser;
pub mod position;
pub mod watcher;
pub mod worker;

pub use dedupe::RecentEmissions;
pub use events::{TailerError, TailerErrorKind, TailerEvent, TailerEvents};
pub use parser::{parse_line, ParsedLine};
pub use position::{FilePosition, Observation};
pub use watcher::{LogTailer, LogTailerBuilder, TailerConfig, TailerTrigger, LOG_EXTENSION};
pub use worker::TailerStats;
