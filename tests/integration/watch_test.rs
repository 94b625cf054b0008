//! Watch Orchestrator Integration Tests
//!
//! Full live loop: tailer, per-prompt cache, mock backend, and a recording
//! display sink, stopped through a shutdown future.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::oneshot;

use prompt_coach::services::cache::CacheLayout;
use prompt_coach::services::tailer::LogTailerBuilder;
use prompt_coach::services::watch::{DisplaySink, WatchOrchestrator, WatchSummary};
use prompt_coach::utils::error::AppResult;
use prompt_coach_core::{AnalysisResult, PromptEvent};

use crate::support::{append, user_line, wait_until, MockService};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Recording Sink
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    ready: Mutex<bool>,
    results: Mutex<Vec<(String, AnalysisResult, bool)>>,
    errors: Mutex<Vec<(Option<String>, String)>>,
}

impl RecordingSink {
    fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap()
    }

    fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl DisplaySink for RecordingSink {
    fn ready(&self) {
        *self.ready.lock().unwrap() = true;
    }

    fn show_result(&self, event: &PromptEvent, result: &AnalysisResult, from_cache: bool) {
        self.results
            .lock()
            .unwrap()
            .push((event.prompt.content.clone(), result.clone(), from_cache));
    }

    fn show_error(&self, event: Option<&PromptEvent>, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((event.map(|e| e.prompt.content.clone()), message.to_string()));
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

struct Harness {
    _temp: TempDir,
    log: std::path::PathBuf,
    sink: Arc<RecordingSink>,
    service: Arc<MockService>,
    trigger: prompt_coach::services::tailer::TailerTrigger,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<AppResult<WatchSummary>>,
}

async fn spawn_watch(service: MockService) -> Harness {
    let temp = TempDir::new().unwrap();
    let projects = temp.path().join("projects");
    let dir = projects.join("-home-dev-api");
    std::fs::create_dir_all(&dir).unwrap();

    let layout = CacheLayout::new(temp.path().join("results"), temp.path().join("cache"));
    let tailer = LogTailerBuilder::new(&projects).debounce_ms(50).build();
    let sink = Arc::new(RecordingSink::default());
    let service = Arc::new(service);

    let mut orchestrator =
        WatchOrchestrator::new(tailer, service.clone(), layout.prompt_cache(), sink.clone());
    let trigger = orchestrator.trigger_handle();
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        orchestrator
            .run(async {
                let _ = stopped.await;
            })
            .await
    });

    let ready_sink = sink.clone();
    assert!(wait_until(|| ready_sink.is_ready(), WAIT).await);

    Harness {
        _temp: temp,
        log: dir.join("s1.jsonl"),
        sink,
        service,
        trigger,
        stop,
        task,
    }
}

impl Harness {
    fn write_prompt(&self, content: &str, timestamp: &str) {
        append(&self.log, &format!("{}\n", user_line(content, timestamp, "s1")));
        self.trigger.trigger(&self.log).unwrap();
    }

    async fn shutdown(self) -> WatchSummary {
        self.stop.send(()).unwrap();
        tokio::time::timeout(WAIT, self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap()
    }
}

// ============================================================================
// Watch Loop Tests
// ============================================================================

#[tokio::test]
async fn test_prompts_analyzed_then_served_from_cache() {
    let harness = spawn_watch(MockService::new()).await;

    harness.write_prompt("fix the login", "2025-01-15T12:00:00Z");
    let sink = harness.sink.clone();
    assert!(wait_until(|| sink.result_count() == 1, WAIT).await);

    // Same text later the same day: a new emission, but a cache hit
    harness.write_prompt("fix the login", "2025-01-15T12:05:00Z");
    assert!(wait_until(|| sink.result_count() == 2, WAIT).await);

    let results = sink.results.lock().unwrap().clone();
    assert!(!results[0].2);
    assert!(results[1].2);
    assert_eq!(results[0].1, results[1].1);
    assert_eq!(results[0].1.stats.prompts_with_issues, 1);
    assert_eq!(harness.service.call_count(), 1);

    let summary = harness.shutdown().await;
    assert_eq!(
        summary,
        WatchSummary {
            prompts_seen: 2,
            cache_hits: 1,
            analyzed: 1,
            failures: 0,
        }
    );
}

#[tokio::test]
async fn test_backend_failure_reported_and_loop_continues() {
    let harness = spawn_watch(MockService::new().with_failure()).await;

    harness.write_prompt("fix the login", "2025-01-15T12:00:00Z");
    harness.write_prompt("add tests", "2025-01-15T12:01:00Z");
    let sink = harness.sink.clone();
    assert!(wait_until(|| sink.error_count() == 2, WAIT).await);

    let errors = sink.errors.lock().unwrap().clone();
    assert_eq!(errors[0].0.as_deref(), Some("fix the login"));
    assert!(errors[0].1.contains("backend exploded"));
    assert_eq!(sink.result_count(), 0);

    let summary = harness.shutdown().await;
    assert_eq!(summary.failures, 2);
    assert_eq!(summary.analyzed, 0);
}

#[tokio::test]
async fn test_shutdown_stops_tailer() {
    let harness = spawn_watch(MockService::new()).await;
    let trigger = harness.trigger.clone();
    let log = harness.log.clone();

    let summary = harness.shutdown().await;
    assert_eq!(summary, WatchSummary::default());
    assert!(trigger.trigger(&log).is_err());
}
