//! Batch Analyzer Integration Tests
//!
//! End-to-end runs of `BatchAnalyzer` against a counting mock backend and a
//! real on-disk cache layout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use prompt_coach::models::settings::Settings;
use prompt_coach::services::analyzer::BatchAnalyzer;
use prompt_coach::services::cache::{clear_cache, CacheLayout};
use prompt_coach::utils::error::AppError;
use prompt_coach_core::{AnalysisContext, BatchLimits, Severity};

use crate::support::MockService;

const DATE: &str = "2025-01-15";

// ============================================================================
// Helper Functions
// ============================================================================

fn layout(temp: &TempDir) -> CacheLayout {
    CacheLayout::new(temp.path().join("results"), temp.path().join("cache"))
}

fn analyzer(layout: &CacheLayout, service: Arc<MockService>) -> BatchAnalyzer {
    BatchAnalyzer::new(service, layout.prompt_cache(), layout.batch_cache(7))
}

/// Service that analyzes every prompt on its own, so results land in the
/// per-prompt cache.
fn singleton_service() -> Arc<MockService> {
    Arc::new(MockService::new().with_limits(BatchLimits::new(10_000).with_max_items(1)))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

// ============================================================================
// Caching Tests
// ============================================================================

#[tokio::test]
async fn test_repeat_run_is_served_from_cache() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = Arc::new(MockService::new());
    let analyzer = analyzer(&layout, service.clone());
    let prompts = strings(&["fix it", "add a health endpoint", "document the parser"]);

    let first = analyzer.analyze(&prompts, DATE, None).await.unwrap();
    let calls = service.call_count();
    let second = analyzer.analyze(&prompts, DATE, None).await.unwrap();

    assert_eq!(calls, 1);
    assert_eq!(service.call_count(), calls);
    assert_eq!(first, second);
    assert_eq!(json_files(&layout.batches_dir()).len(), 1);
}

#[tokio::test]
async fn test_only_uncached_prompts_reach_backend() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = singleton_service();
    let analyzer = analyzer(&layout, service.clone());

    analyzer
        .analyze(&strings(&["fix the login"]), DATE, None)
        .await
        .unwrap();
    assert_eq!(service.call_count(), 1);

    let result = analyzer
        .analyze(
            &strings(&["fix the login", "rename the module", "add tests"]),
            DATE,
            None,
        )
        .await
        .unwrap();

    assert_eq!(service.call_count(), 3);
    assert_eq!(result.stats.total_prompts, 3);
    assert_eq!(result.stats.prompts_with_issues, 1);
}

#[tokio::test]
async fn test_partial_overlap_sends_only_new_prompts() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = Arc::new(MockService::new());
    let analyzer = analyzer(&layout, service.clone());

    analyzer
        .analyze(&strings(&["fix it", "add a health endpoint", "document the parser"]), DATE, None)
        .await
        .unwrap();

    let result = analyzer
        .analyze(
            &strings(&["fix it", "add a health endpoint", "document the parser", "fix bug"]),
            DATE,
            None,
        )
        .await
        .unwrap();

    assert_eq!(service.batch_sizes(), vec![3, 1]);
    assert_eq!(result.stats.total_prompts, 4);
    assert_eq!(result.stats.prompts_with_issues, 2);
    assert_eq!(json_files(&layout.results_root().join(DATE)).len(), 4);
}

#[tokio::test]
async fn test_corrupt_entry_is_reanalyzed_and_repaired() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = singleton_service();
    let analyzer = analyzer(&layout, service.clone());
    let prompts = strings(&["fix the login"]);

    analyzer.analyze(&prompts, DATE, None).await.unwrap();
    let entries = json_files(&layout.results_root().join(DATE));
    assert_eq!(entries.len(), 1);

    std::fs::write(&entries[0], "{not json").unwrap();
    let result = analyzer.analyze(&prompts, DATE, None).await.unwrap();

    assert_eq!(service.call_count(), 2);
    assert_eq!(result.stats.total_prompts, 1);
    let repaired = std::fs::read_to_string(&entries[0]).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
}

#[tokio::test]
async fn test_project_scopes_cache_entries() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = singleton_service();
    let analyzer = analyzer(&layout, service.clone());
    let prompts = strings(&["fix the login"]);

    let api = AnalysisContext::new().with_project("api");
    let web = AnalysisContext::new().with_project("web");
    analyzer.analyze(&prompts, DATE, Some(&api)).await.unwrap();
    analyzer.analyze(&prompts, DATE, Some(&web)).await.unwrap();
    analyzer.analyze(&prompts, DATE, Some(&api)).await.unwrap();

    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_clear_cache_forces_reanalysis() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = Arc::new(MockService::new());
    let analyzer = analyzer(&layout, service.clone());
    let prompts = strings(&["fix it", "add tests"]);

    analyzer.analyze(&prompts, DATE, None).await.unwrap();
    clear_cache(&layout).await.unwrap();
    assert!(!layout.batches_dir().exists());

    analyzer.analyze(&prompts, DATE, None).await.unwrap();
    assert_eq!(service.call_count(), 2);
}

// ============================================================================
// Batching and Merge Tests
// ============================================================================

#[tokio::test]
async fn test_batches_are_merged() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = Arc::new(MockService::new().with_limits(BatchLimits::new(10_000).with_max_items(2)));
    let analyzer = analyzer(&layout, service.clone());
    let prompts = strings(&["fix it", "add a health endpoint", "fix bug", "write parser docs"]);

    let result = analyzer.analyze(&prompts, DATE, None).await.unwrap();

    assert_eq!(service.batch_sizes(), vec![2, 2]);
    assert_eq!(result.date, DATE);
    assert_eq!(result.stats.total_prompts, 4);
    assert_eq!(result.stats.prompts_with_issues, 2);
    assert_eq!(result.stats.overall_score, 8.0);

    assert_eq!(result.patterns.len(), 1);
    let vague = &result.patterns[0];
    assert_eq!(vague.id, "vague");
    assert_eq!(vague.frequency, 1.0);
    assert_eq!(vague.severity, Severity::Medium);
    assert_eq!(vague.examples, strings(&["fix it", "fix bug"]));
}

#[tokio::test]
async fn test_from_settings_uses_configured_dirs() {
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        results_dir: Some(temp.path().join("r")),
        cache_dir: Some(temp.path().join("c")),
        ..Default::default()
    };
    let service = Arc::new(MockService::new());
    let analyzer = BatchAnalyzer::from_settings(service, &settings).unwrap();

    analyzer
        .analyze(&strings(&["fix it", "add tests"]), DATE, None)
        .await
        .unwrap();

    assert_eq!(json_files(&temp.path().join("c").join("batches")).len(), 1);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_backend_failure_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let layout = layout(&temp);
    let service = Arc::new(MockService::new().with_failure());
    let analyzer = analyzer(&layout, service);

    let err = analyzer
        .analyze(&strings(&["fix it", "add tests"]), DATE, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Analysis(_)));
    assert!(!layout.results_root().exists());
    assert!(json_files(&layout.batches_dir()).is_empty());
}
