//! Result Merging
//!
//! Reduce step of the batch analysis: combines per-batch results into one
//! report for the whole run.

use std::cmp::Ordering;
use std::collections::HashMap;

use prompt_coach_core::{AnalysisPattern, AnalysisResult, AnalysisStats, MAX_EXAMPLES, MAX_PATTERNS};

struct PatternGroup {
    pattern: AnalysisPattern,
    frequency_sum: f64,
    count: usize,
}

/// Merge per-batch results into one report dated `date`.
///
/// Patterns are grouped by id in batch order. A group's frequency is the
/// rounded mean of its members, its severity the highest present, its
/// examples the first three seen; name, suggestion and before/after come from
/// the first occurrence. Counters are summed and the overall score is the
/// rounded unweighted mean of the inputs' scores.
pub fn merge(results: &[AnalysisResult], date: &str) -> AnalysisResult {
    match results {
        [] => return AnalysisResult::empty(date),
        [only] => {
            let mut merged = only.clone();
            merged.date = date.to_string();
            return merged;
        }
        _ => {}
    }

    let mut groups: Vec<PatternGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for pattern in results.iter().flat_map(|r| r.patterns.iter()) {
        match index.get(&pattern.id) {
            Some(&i) => {
                let group = &mut groups[i];
                group.frequency_sum += pattern.frequency;
                group.count += 1;
                group.pattern.severity = group.pattern.severity.max(pattern.severity);
                let room = MAX_EXAMPLES.saturating_sub(group.pattern.examples.len());
                group
                    .pattern
                    .examples
                    .extend(pattern.examples.iter().take(room).cloned());
            }
            None => {
                index.insert(pattern.id.clone(), groups.len());
                let mut first = pattern.clone();
                first.examples.truncate(MAX_EXAMPLES);
                groups.push(PatternGroup {
                    frequency_sum: pattern.frequency,
                    count: 1,
                    pattern: first,
                });
            }
        }
    }

    let mut patterns: Vec<AnalysisPattern> = groups
        .into_iter()
        .map(|group| {
            let mut pattern = group.pattern;
            pattern.frequency = (group.frequency_sum / group.count as f64).round();
            pattern
        })
        .collect();
    patterns.sort_by(|a, b| {
        b.frequency
            .partial_cmp(&a.frequency)
            .unwrap_or(Ordering::Equal)
    });
    patterns.truncate(MAX_PATTERNS);

    let score_sum: f64 = results.iter().map(|r| r.stats.overall_score).sum();
    let stats = AnalysisStats {
        total_prompts: results.iter().map(|r| r.stats.total_prompts).sum(),
        prompts_with_issues: results.iter().map(|r| r.stats.prompts_with_issues).sum(),
        overall_score: (score_sum / results.len() as f64).round(),
    };

    let top_suggestion = results
        .iter()
        .map(|r| r.top_suggestion.as_str())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();

    AnalysisResult {
        date: date.to_string(),
        patterns,
        stats,
        top_suggestion,
    }
}
