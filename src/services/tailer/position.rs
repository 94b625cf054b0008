//! File Positions
//!
//! Per-file tailing state: the size, mtime and file identity seen at the
//! last processed notification, and the byte offset just past the last
//! complete line.

use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// One stat of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub byte_size: u64,
    pub modified: Option<SystemTime>,
    /// Inode number where the platform has one
    pub file_id: Option<u64>,
}

impl Observation {
    pub fn new(byte_size: u64, modified: Option<SystemTime>, file_id: Option<u64>) -> Self {
        Self {
            byte_size,
            modified,
            file_id,
        }
    }

    pub fn of(metadata: &Metadata) -> Self {
        Self::new(metadata.len(), metadata.modified().ok(), file_id(metadata))
    }
}

#[cfg(unix)]
fn file_id(metadata: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn file_id(_metadata: &Metadata) -> Option<u64> {
    None
}

/// Tailing state of one log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosition {
    pub path: PathBuf,
    pub byte_size: u64,
    pub modified: Option<SystemTime>,
    pub file_id: Option<u64>,
    /// End of the last complete line consumed
    pub offset: u64,
}

/// What a notification means for a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Size and mtime are as last seen, or nothing new past the offset
    Unchanged,
    /// Bytes `[from, to)` need reading
    Appended { from: u64, to: u64 },
}

impl FilePosition {
    /// A file first seen after the tailer started; read from the beginning.
    pub fn unseen(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            byte_size: 0,
            modified: None,
            file_id: None,
            offset: 0,
        }
    }

    /// A file that existed when the tailer started; only later appends count.
    pub fn at_end(path: impl Into<PathBuf>, seen: Observation) -> Self {
        Self {
            path: path.into(),
            byte_size: seen.byte_size,
            modified: seen.modified,
            file_id: seen.file_id,
            offset: seen.byte_size,
        }
    }

    /// Compare a fresh observation with the stored state.
    ///
    /// A file that shrank below the consumed offset was truncated, and one
    /// whose identity changed was replaced (e.g. renamed over). Both are read
    /// again from zero.
    pub fn change(&self, seen: Observation) -> Change {
        let replaced = seen.file_id != self.file_id;
        if !replaced && seen.byte_size == self.byte_size && seen.modified == self.modified {
            return Change::Unchanged;
        }
        let from = if replaced || seen.byte_size < self.offset {
            0
        } else {
            self.offset
        };
        if from == seen.byte_size {
            Change::Unchanged
        } else {
            Change::Appended {
                from,
                to: seen.byte_size,
            }
        }
    }

    /// Record an observation and the new consumed offset.
    pub fn commit(&mut self, seen: Observation, offset: u64) {
        self.byte_size = seen.byte_size;
        self.modified = seen.modified;
        self.file_id = seen.file_id;
        self.offset = offset;
    }
}

/// Complete lines read from a byte window of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWindow {
    pub lines: Vec<String>,
    /// Offset just past the last newline in the window
    pub next_offset: u64,
}

/// Read `[from, to)` of `path` and split it into complete lines.
///
/// A trailing fragment without a newline is not consumed; `next_offset`
/// stops at the last newline so the fragment is read again once finished.
/// Empty lines are dropped.
pub async fn read_complete_lines(path: &Path, from: u64, to: u64) -> std::io::Result<ReadWindow> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(from)).await?;

    let mut buf = Vec::with_capacity(to.saturating_sub(from) as usize);
    file.take(to.saturating_sub(from)).read_to_end(&mut buf).await?;

    let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
        return Ok(ReadWindow {
            lines: Vec::new(),
            next_offset: from,
        });
    };

    let lines = buf[..last_newline]
        .split(|&b| b == b'\n')
        .map(|line| String::from_utf8_lossy(line).trim_end_matches('\r').to_string())
        .filter(|line| !line.trim().is_empty())
        .collect();

    Ok(ReadWindow {
        lines,
        next_offset: from + last_newline as u64 + 1,
    })
}
