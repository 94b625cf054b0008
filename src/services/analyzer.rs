//! Batch Analyzer
//!
//! Orchestrates one analysis run: per-prompt cache lookup, batching of the
//! uncached prompts by backend limits, batch cache lookup, backend calls,
//! write-back, and the final merge.
//!
//! Cache routing: every result is written to the per-prompt cache under
//! each fingerprint of its batch. Multi-prompt batches additionally go to the
//! batch cache, and their per-prompt entries carry the batch fingerprint so
//! that a later run merges one shared result once, not once per prompt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use prompt_coach_core::{
    AnalysisContext, AnalysisResult, BatchLimits, BatchProgress, NoopReporter, Reporter,
};
use prompt_coach_llm::AnalysisService;

use super::batcher::{split, Batch};
use super::cache::{
    template_hash, BatchCache, CacheLayout, FingerprintInput, PerPromptCache, PromptFingerprint,
    PromptResultMetadata,
};
use super::merge::merge;
use crate::models::settings::{Settings, DEFAULT_MAX_COST_PER_BATCH};
use crate::utils::error::{AppError, AppResult};

/// Configuration for the `BatchAnalyzer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Limits used when the backend declares none
    pub default_limits: BatchLimits,
    /// Backend calls in flight at once; 1 means strictly sequential
    pub max_concurrent_batches: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_limits: BatchLimits::new(DEFAULT_MAX_COST_PER_BATCH),
            max_concurrent_batches: 1,
        }
    }
}

impl From<&Settings> for AnalyzerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            default_limits: BatchLimits::new(settings.default_max_cost_per_batch),
            max_concurrent_batches: settings.max_concurrent_batches,
        }
    }
}

/// How one batch gets its result.
enum BatchPlan {
    /// Answered by the batch cache
    Cached {
        batch: Batch,
        batch_key: String,
        result: AnalysisResult,
    },
    /// Needs a backend call; `batch_key` is set for multi-prompt batches
    Call {
        batch: Batch,
        batch_key: Option<String>,
    },
}

struct BatchOutcome {
    batch: Batch,
    batch_key: Option<String>,
    result: AnalysisResult,
    from_cache: bool,
}

/// Map-reduce analysis over a cache-aware batcher.
pub struct BatchAnalyzer {
    service: Arc<dyn AnalysisService>,
    prompt_cache: PerPromptCache,
    batch_cache: BatchCache,
    reporter: Arc<dyn Reporter>,
    config: AnalyzerConfig,
}

impl BatchAnalyzer {
    /// Create an analyzer over the given caches
    pub fn new(
        service: Arc<dyn AnalysisService>,
        prompt_cache: PerPromptCache,
        batch_cache: BatchCache,
    ) -> Self {
        Self {
            service,
            prompt_cache,
            batch_cache,
            reporter: Arc::new(NoopReporter),
            config: AnalyzerConfig::default(),
        }
    }

    /// Create an analyzer from resolved settings
    pub fn from_settings(service: Arc<dyn AnalysisService>, settings: &Settings) -> AppResult<Self> {
        let layout: CacheLayout = settings.cache_layout()?;
        Ok(Self::new(
            service,
            layout.prompt_cache(),
            layout.batch_cache(settings.batch_ttl_days),
        )
        .with_config(AnalyzerConfig::from(settings)))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether the backend can currently serve requests
    pub async fn is_available(&self) -> bool {
        self.service.is_available().await
    }

    /// Analyze `prompts` for `date` and return one merged report.
    ///
    /// Backend failures propagate. Cache write failures are reported as
    /// warnings and the run continues uncached.
    pub async fn analyze(
        &self,
        prompts: &[String],
        date: &str,
        context: Option<&AnalysisContext>,
    ) -> AppResult<AnalysisResult> {
        if prompts.is_empty() {
            return Ok(AnalysisResult::empty(date));
        }

        let use_cache = !context.is_some_and(|c| c.no_cache);
        let project = context.and_then(AnalysisContext::project);
        let model = self.service.model();
        let template = template_hash(self.service.instruction_template());

        // Phase 1: Partition prompts into cached and uncached
        let mut cached_results: Vec<AnalysisResult> = Vec::new();
        let mut uncached: Vec<String> = Vec::new();
        let mut fingerprints: HashMap<String, PromptFingerprint> = HashMap::new();
        let mut seen_batches: HashSet<String> = HashSet::new();

        for prompt in prompts {
            let fp = self.prompt_cache.fingerprint(FingerprintInput {
                prompt,
                date,
                project,
                model,
                schema_id: self.service.schema_id(),
                template_hash: &template,
            });

            if use_cache {
                if let Some(hit) = self.prompt_cache.get(&fp).await {
                    let first_of_batch = match hit.metadata.batch_fingerprint {
                        Some(key) => seen_batches.insert(key),
                        None => true,
                    };
                    if first_of_batch {
                        cached_results.push(hit.result);
                    }
                    continue;
                }
            }
            uncached.push(prompt.clone());
            fingerprints.insert(prompt.clone(), fp);
        }

        if uncached.is_empty() {
            tracing::info!(
                prompts = prompts.len(),
                date,
                "All prompts answered from cache"
            );
            return Ok(merge(&cached_results, date));
        }

        // Phase 2: Batch the uncached prompts and consult the batch cache
        let limits = self
            .service
            .batch_limits()
            .unwrap_or(self.config.default_limits);
        limits.validate()?;

        let batches = split(&uncached, &limits);
        let total_batches = batches.len();
        let mut plans = Vec::with_capacity(total_batches);
        for batch in batches {
            if batch.len() == 1 {
                plans.push(BatchPlan::Call {
                    batch,
                    batch_key: None,
                });
                continue;
            }

            let key = self.batch_cache.fingerprint(&batch.prompts, model, &template);
            if use_cache {
                if let Some(hit) = self.batch_cache.get(&key, model, &template).await {
                    plans.push(BatchPlan::Cached {
                        batch,
                        batch_key: key,
                        result: hit.result,
                    });
                    continue;
                }
            }
            plans.push(BatchPlan::Call {
                batch,
                batch_key: Some(key),
            });
        }

        tracing::info!(
            prompts = prompts.len(),
            cached = cached_results.len(),
            batches = total_batches,
            backend = self.service.name(),
            "Analyzing uncached prompts"
        );

        // Phase 3: Run batches in order, persisting each result as it lands
        let concurrency = self.config.max_concurrent_batches.max(1);
        let mut outcomes = stream::iter(plans)
            .map(|plan| self.run_batch(plan, date, context))
            .buffered(concurrency);

        let mut new_results = Vec::with_capacity(total_batches);
        let mut batch_index = 0;
        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome?;
            self.reporter.progress(BatchProgress {
                batch_index,
                total_batches,
                batch_size: outcome.batch.len(),
                from_cache: outcome.from_cache,
            });
            batch_index += 1;

            if use_cache {
                self.persist(&outcome, &fingerprints, &template).await;
            }
            new_results.push(outcome.result);
        }

        // Phase 4: Merge cached and new results
        cached_results.extend(new_results);
        Ok(merge(&cached_results, date))
    }

    async fn run_batch(
        &self,
        plan: BatchPlan,
        date: &str,
        context: Option<&AnalysisContext>,
    ) -> AppResult<BatchOutcome> {
        match plan {
            BatchPlan::Cached {
                batch,
                batch_key,
                result,
            } => Ok(BatchOutcome {
                batch,
                batch_key: Some(batch_key),
                result,
                from_cache: true,
            }),
            BatchPlan::Call { batch, batch_key } => {
                let result = self
                    .service
                    .analyze(&batch.prompts, date, context)
                    .await?
                    .normalized();
                Ok(BatchOutcome {
                    batch,
                    batch_key,
                    result,
                    from_cache: false,
                })
            }
        }
    }

    /// Write a batch result back: to the batch cache when it is a fresh
    /// multi-prompt result, and to the per-prompt cache for every prompt of
    /// the batch.
    async fn persist(
        &self,
        outcome: &BatchOutcome,
        fingerprints: &HashMap<String, PromptFingerprint>,
        template: &str,
    ) {
        if let (Some(key), false) = (&outcome.batch_key, outcome.from_cache) {
            if let Err(e) = self
                .batch_cache
                .put(key, self.service.model(), template, &outcome.result)
                .await
            {
                self.warn_cache_write(&e);
            }
        }

        for prompt in &outcome.batch.prompts {
            let Some(fp) = fingerprints.get(prompt) else {
                continue;
            };
            let metadata =
                PromptResultMetadata::for_fingerprint(fp).with_batch(outcome.batch_key.clone());
            if let Err(e) = self.prompt_cache.put(fp, &outcome.result, metadata).await {
                // Report once per batch
                self.warn_cache_write(&e);
                break;
            }
        }
    }

    fn warn_cache_write(&self, error: &AppError) {
        tracing::warn!(error = %error, "Failed to cache analysis result");
        self.reporter
            .warn(&format!("Failed to cache analysis result: {}", error));
    }
}
