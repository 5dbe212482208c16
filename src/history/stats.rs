//! History aggregation for `oxbow stats`.
//!
//! Reads the JSONL query log and summarizes routing outcomes: how many
//! queries succeeded, which models the backend picked, and how long they
//! took.

use std::collections::HashMap;

use crate::history::{self, QueryLogEntry};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `oxbow stats`.
#[derive(Debug)]
pub struct Stats {
    pub total_queries: usize,
    pub answered: usize,
    pub failed: usize,
    pub avg_latency_ms: u64,
    /// Per-model routing counts, most-used first.
    pub model_stats: Vec<ModelStat>,
}

impl Stats {
    /// Share of queries that reached an answer, 0.0 when empty.
    pub fn success_pct(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            (self.answered as f64 / self.total_queries as f64) * 100.0
        }
    }
}

/// Aggregated statistics for one routed-to model.
#[derive(Debug, Clone)]
pub struct ModelStat {
    pub model: String,
    pub count: usize,
    pub avg_latency_ms: u64,
    pub avg_steps: f64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute aggregate stats, optionally filtered to the last `days` days.
pub fn compute_stats(days: Option<u32>) -> Stats {
    let entries = history::read_entries_since_days(days);
    build_stats(&entries)
}

fn build_stats(entries: &[QueryLogEntry]) -> Stats {
    if entries.is_empty() {
        return Stats {
            total_queries: 0,
            answered: 0,
            failed: 0,
            avg_latency_ms: 0,
            model_stats: Vec::new(),
        };
    }

    let total_queries = entries.len();
    let answered = entries.iter().filter(|e| e.ok).count();
    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();

    Stats {
        total_queries,
        answered,
        failed: total_queries - answered,
        avg_latency_ms: total_latency / total_queries as u64,
        model_stats: compute_model_stats(entries),
    }
}

fn compute_model_stats(entries: &[QueryLogEntry]) -> Vec<ModelStat> {
    struct Acc {
        count: usize,
        latency_ms: u64,
        steps: usize,
    }

    let mut by_model: HashMap<&str, Acc> = HashMap::new();
    for entry in entries {
        let Some(model) = entry.model_used.as_deref() else {
            continue;
        };
        let acc = by_model.entry(model).or_insert(Acc {
            count: 0,
            latency_ms: 0,
            steps: 0,
        });
        acc.count += 1;
        acc.latency_ms += entry.latency_ms;
        acc.steps += entry.steps;
    }

    let mut stats: Vec<ModelStat> = by_model
        .into_iter()
        .map(|(model, acc)| ModelStat {
            model: model.to_string(),
            count: acc.count,
            avg_latency_ms: acc.latency_ms / acc.count as u64,
            avg_steps: acc.steps as f64 / acc.count as f64,
        })
        .collect();

    // Most-used first; ties break alphabetically for stable output.
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.model.cmp(&b.model)));
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
