//! Watch Orchestrator
//!
//! Live mode: every prompt the tailer emits is analyzed on its own (or
//! answered from the per-prompt cache) and handed to a display sink.

use std::future::Future;
use std::sync::Arc;

use prompt_coach_core::{AnalysisContext, AnalysisResult, PromptEvent};
use prompt_coach_llm::AnalysisService;
use serde::Serialize;

use super::cache::{template_hash, FingerprintInput, PerPromptCache, PromptResultMetadata};
use super::tailer::{LogTailer, TailerEvent, TailerTrigger};
use crate::utils::error::AppResult;

/// Receives what the watch loop produces.
pub trait DisplaySink: Send + Sync {
    /// The tailer is watching.
    fn ready(&self);

    /// Analysis of one prompt, fresh or cached.
    fn show_result(&self, event: &PromptEvent, result: &AnalysisResult, from_cache: bool);

    /// A recoverable failure. `event` is set when it concerns one prompt.
    fn show_error(&self, event: Option<&PromptEvent>, message: &str);
}

/// Counters for one watch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSummary {
    pub prompts_seen: u64,
    pub cache_hits: u64,
    pub analyzed: u64,
    pub failures: u64,
}

pub struct WatchOrchestrator {
    tailer: LogTailer,
    service: Arc<dyn AnalysisService>,
    cache: PerPromptCache,
    sink: Arc<dyn DisplaySink>,
    no_cache: bool,
}

impl WatchOrchestrator {
    pub fn new(
        tailer: LogTailer,
        service: Arc<dyn AnalysisService>,
        cache: PerPromptCache,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            tailer,
            service,
            cache,
            sink,
            no_cache: false,
        }
    }

    /// Skip cache lookup and write-back
    pub fn without_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Handle for feeding synthetic change notifications into the tailer
    pub fn trigger_handle(&self) -> TailerTrigger {
        self.tailer.trigger_handle()
    }

    /// Watch until `shutdown` resolves or the event stream ends, then stop
    /// the tailer.
    ///
    /// A prompt being analyzed when `shutdown` resolves is finished first.
    pub async fn run<F>(&mut self, shutdown: F) -> AppResult<WatchSummary>
    where
        F: Future<Output = ()>,
    {
        let mut events = self.tailer.subscribe();
        self.tailer.start().await?;

        let mut summary = WatchSummary::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                event = events.recv() => match event {
                    Some(TailerEvent::Ready) => self.sink.ready(),
                    Some(TailerEvent::Prompt(event)) => {
                        self.handle_prompt(&event, &mut summary).await;
                    }
                    Some(TailerEvent::Error(error)) => {
                        self.sink.show_error(None, &error.to_string());
                    }
                    None => break,
                },
            }
        }

        self.tailer.stop().await;
        tracing::info!(
            prompts = summary.prompts_seen,
            cache_hits = summary.cache_hits,
            analyzed = summary.analyzed,
            failures = summary.failures,
            "Watch loop finished"
        );
        Ok(summary)
    }

    async fn handle_prompt(&mut self, event: &PromptEvent, summary: &mut WatchSummary) {
        summary.prompts_seen += 1;
        let prompt = &event.prompt;

        let template = template_hash(self.service.instruction_template());
        let fp = self.cache.fingerprint(FingerprintInput {
            prompt: &prompt.content,
            date: &prompt.date,
            project: Some(&prompt.project),
            model: self.service.model(),
            schema_id: self.service.schema_id(),
            template_hash: &template,
        });

        if !self.no_cache {
            if let Some(hit) = self.cache.get(&fp).await {
                summary.cache_hits += 1;
                self.sink.show_result(event, &hit.result, true);
                return;
            }
        }

        let mut context = AnalysisContext::new().with_project(prompt.project.clone());
        if self.no_cache {
            context = context.without_cache();
        }

        let result = match self
            .service
            .analyze(std::slice::from_ref(&prompt.content), &prompt.date, Some(&context))
            .await
        {
            Ok(result) => result.normalized(),
            Err(e) => {
                summary.failures += 1;
                tracing::warn!(
                    session_id = %prompt.session_id,
                    error = %e,
                    "Prompt analysis failed"
                );
                self.sink.show_error(Some(event), &e.to_string());
                return;
            }
        };
        summary.analyzed += 1;

        if !self.no_cache {
            let metadata = PromptResultMetadata::for_fingerprint(&fp);
            if let Err(e) = self.cache.put(&fp, &result, metadata).await {
                self.sink
                    .show_error(Some(event), &format!("Failed to cache result: {}", e));
            }
        }

        self.sink.show_result(event, &result, false);
    }
}
