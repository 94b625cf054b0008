//! Integration Tests Module
//!
//! End-to-end tests for the Prompt Coach engine: batch analysis over the
//! on-disk caches, live log tailing, and the watch loop.


// Batch analyzer with per-prompt and batch caches
mod analyzer_test;

// Log tailer lifecycle and exactly-once ingestion
mod tailer_test;

// Watch loop: tailer to cache to display sink
mod watch_test;
