//! Log Tailer Integration Tests
//!
//! Drive a real `LogTailer` over a temporary projects directory. Appends are
//! followed by an explicit trigger so the tests do not depend on native
//! notification latency; debouncing still applies to both paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use prompt_coach::services::tailer::{LogTailer, LogTailerBuilder, TailerEvent, TailerEvents};
use prompt_coach_core::PromptEvent;

use crate::support::{append, assistant_line, user_line};

const DEBOUNCE_MS: u64 = 100;
const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Helper Functions
// ============================================================================

fn project_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("-home-dev-api");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn tailer(temp: &TempDir) -> LogTailer {
    LogTailerBuilder::new(temp.path())
        .debounce_ms(DEBOUNCE_MS)
        .build()
}

async fn started(tailer: &mut LogTailer) -> TailerEvents {
    let mut events = tailer.subscribe();
    tailer.start().await.unwrap();
    let first = tokio::time::timeout(WAIT, events.recv()).await.unwrap();
    assert_eq!(first, Some(TailerEvent::Ready));
    events
}

async fn next_prompt(events: &mut TailerEvents) -> PromptEvent {
    loop {
        match tokio::time::timeout(WAIT, events.recv()).await {
            Ok(Some(TailerEvent::Prompt(event))) => return event,
            Ok(Some(_)) => continue,
            Ok(None) => panic!("event stream ended"),
            Err(_) => panic!("no prompt within {:?}", WAIT),
        }
    }
}

/// Assert that no prompt arrives within a few debounce windows.
async fn assert_quiet(events: &mut TailerEvents) {
    let quiet = Duration::from_millis(DEBOUNCE_MS * 4);
    let deadline = tokio::time::Instant::now() + quiet;
    while let Ok(event) = tokio::time::timeout_at(deadline, events.recv()).await {
        match event {
            Some(TailerEvent::Prompt(event)) => {
                panic!("unexpected prompt: {:?}", event.prompt.content)
            }
            Some(_) => continue,
            None => return,
        }
    }
}

fn append_line(tailer: &LogTailer, path: &Path, line: &str) {
    append(path, &format!("{}\n", line));
    tailer.trigger(path).unwrap();
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_start_emits_ready_and_skips_existing_content() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    append(&log, &format!("{}\n", user_line("old prompt", "2025-01-15T09:00:00Z", "s1")));

    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    append_line(&tailer, &log, &user_line("new prompt", "2025-01-15T09:05:00Z", "s1"));
    let event = next_prompt(&mut events).await;

    assert_eq!(event.prompt.content, "new prompt");
    assert_eq!(event.prompt.session_id, "s1");
    assert_eq!(event.prompt.project, "api");
    assert_eq!(event.file_path, log);
    assert_quiet(&mut events).await;

    tailer.stop().await;
}

#[tokio::test]
async fn test_stop_ends_subscriptions() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    append_line(&tailer, &log, &user_line("pending", "2025-01-15T09:00:00Z", "s1"));
    tailer.stop().await;

    assert!(!tailer.is_running());
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);

    let _ = started(&mut tailer).await;
    tailer.stop().await;

    let mut events = started(&mut tailer).await;
    append_line(&tailer, &log, &user_line("after restart", "2025-01-15T10:00:00Z", "s1"));
    assert_eq!(next_prompt(&mut events).await.prompt.content, "after restart");

    tailer.stop().await;
}

// ============================================================================
// Ingestion Tests
// ============================================================================

#[tokio::test]
async fn test_new_file_read_from_beginning() {
    let temp = TempDir::new().unwrap();
    let dir = project_dir(&temp);
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    let log = dir.join("fresh.jsonl");
    append(
        &log,
        &format!(
            "{}\n{}\n",
            user_line("first", "2025-01-15T09:00:00Z", "fresh"),
            user_line("second", "2025-01-15T09:01:00Z", "fresh"),
        ),
    );
    tailer.trigger(&log).unwrap();

    assert_eq!(next_prompt(&mut events).await.prompt.content, "first");
    assert_eq!(next_prompt(&mut events).await.prompt.content, "second");

    tailer.stop().await;
}

#[tokio::test]
async fn test_burst_emits_each_prompt_once_in_order() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    for i in 0..5 {
        append_line(
            &tailer,
            &log,
            &user_line(&format!("prompt {}", i), &format!("2025-01-15T09:00:0{}Z", i), "s1"),
        );
    }

    for i in 0..5 {
        assert_eq!(next_prompt(&mut events).await.prompt.content, format!("prompt {}", i));
    }
    assert_quiet(&mut events).await;
    assert_eq!(tailer.stats().prompts_emitted, 5);

    tailer.stop().await;
}

#[tokio::test]
async fn test_nothing_emitted_before_debounce_window() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = LogTailerBuilder::new(temp.path()).debounce_ms(600).build();
    let mut events = started(&mut tailer).await;

    append_line(&tailer, &log, &user_line("debounced", "2025-01-15T09:00:00Z", "s1"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.try_recv().is_none());

    assert_eq!(next_prompt(&mut events).await.prompt.content, "debounced");
    tailer.stop().await;
}

#[tokio::test]
async fn test_partial_line_waits_for_newline() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    let line = user_line("split write", "2025-01-15T09:00:00Z", "s1");
    let (head, tail) = line.split_at(line.len() / 2);

    append(&log, head);
    tailer.trigger(&log).unwrap();
    assert_quiet(&mut events).await;

    append(&log, &format!("{}\n", tail));
    tailer.trigger(&log).unwrap();
    assert_eq!(next_prompt(&mut events).await.prompt.content, "split write");

    tailer.stop().await;
}

#[tokio::test]
async fn test_truncated_file_reread_from_start() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    append_line(&tailer, &log, &user_line("a long first prompt to pad the file", "2025-01-15T09:00:00Z", "s1"));
    append_line(&tailer, &log, &user_line("a long second prompt to pad the file", "2025-01-15T09:01:00Z", "s1"));
    next_prompt(&mut events).await;
    next_prompt(&mut events).await;

    std::fs::write(&log, format!("{}\n", user_line("short", "2025-01-15T10:00:00Z", "s1"))).unwrap();
    tailer.trigger(&log).unwrap();

    assert_eq!(next_prompt(&mut events).await.prompt.content, "short");
    tailer.stop().await;
}

#[tokio::test]
async fn test_file_replaced_by_rename_reread_from_start() {
    let temp = TempDir::new().unwrap();
    let dir = project_dir(&temp);
    let log = dir.join("s1.jsonl");
    append(&log, &format!("{}\n", user_line("original", "2025-01-15T09:00:00Z", "s1")));

    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    let staged = dir.join("s1.jsonl.tmp");
    append(
        &staged,
        &format!(
            "{}\n{}\n{}\n",
            user_line("rotated 1", "2025-01-15T10:00:00Z", "s1"),
            user_line("rotated 2", "2025-01-15T10:01:00Z", "s1"),
            user_line("rotated 3", "2025-01-15T10:02:00Z", "s1"),
        ),
    );
    std::fs::rename(&staged, &log).unwrap();
    tailer.trigger(&log).unwrap();

    for i in 1..=3 {
        assert_eq!(next_prompt(&mut events).await.prompt.content, format!("rotated {}", i));
    }
    assert_quiet(&mut events).await;
    assert_eq!(tailer.stats().malformed_lines, 0);

    tailer.stop().await;
}

#[tokio::test]
async fn test_duplicate_prompt_suppressed() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    let line = user_line("same prompt", "2025-01-15T09:00:00Z", "s1");
    append_line(&tailer, &log, &line);
    next_prompt(&mut events).await;

    append_line(&tailer, &log, &line);
    assert_quiet(&mut events).await;
    assert_eq!(tailer.stats().duplicates_suppressed, 1);

    tailer.stop().await;
}

#[tokio::test]
async fn test_retrigger_of_unchanged_file_is_silent() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    append_line(&tailer, &log, &user_line("once", "2025-01-15T09:00:00Z", "s1"));
    next_prompt(&mut events).await;

    tailer.trigger(&log).unwrap();
    tailer.trigger(&log).unwrap();
    assert_quiet(&mut events).await;
    assert_eq!(tailer.stats().prompts_emitted, 1);
    assert_eq!(tailer.stats().duplicates_suppressed, 0);

    tailer.stop().await;
}

#[tokio::test]
async fn test_non_prompt_lines_skipped() {
    let temp = TempDir::new().unwrap();
    let log = project_dir(&temp).join("s1.jsonl");
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    append(&log, "this is not json\n");
    append(&log, &format!("{}\n", assistant_line("sure, done", "2025-01-15T09:00:00Z")));
    append(&log, &format!("{}\n", user_line("<command-name>/clear</command-name>", "2025-01-15T09:00:01Z", "s1")));
    append_line(&tailer, &log, &user_line("real prompt", "2025-01-15T09:00:02Z", "s1"));

    assert_eq!(next_prompt(&mut events).await.prompt.content, "real prompt");
    assert_quiet(&mut events).await;
    assert_eq!(tailer.stats().malformed_lines, 1);

    tailer.stop().await;
}

#[tokio::test]
async fn test_other_extensions_ignored() {
    let temp = TempDir::new().unwrap();
    let dir = project_dir(&temp);
    let mut tailer = tailer(&temp);
    let mut events = started(&mut tailer).await;

    let notes = dir.join("notes.txt");
    append(&notes, &format!("{}\n", user_line("not a log", "2025-01-15T09:00:00Z", "s1")));
    assert_quiet(&mut events).await;

    tailer.stop().await;
}
