//! Local query history (JSONL log).
//!
//! Every completed playground query appends one line to
//! `~/.oxbow/query-log.jsonl`. The log is local-only convenience — the
//! backend keeps its own authoritative query logs — so writes are
//! best-effort and malformed lines are skipped on read.

pub mod stats;

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// A single entry in the query history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub timestamp: String,
    pub query: String,
    /// Model the backend routed to. Absent for failed queries.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model_used: Option<String>,
    /// Number of routing steps the backend reported.
    #[serde(default)]
    pub steps: usize,
    /// Wall-clock time from submission to terminal frame.
    pub latency_ms: u64,
    /// Whether the query reached a final answer.
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Record one completed query. Failures to write are swallowed — history
/// must never break the chat loop.
pub fn log_query(query: &str, model_used: Option<&str>, steps: usize, latency_ms: u64, ok: bool) {
    let entry = QueryLogEntry {
        timestamp: Utc::now().to_rfc3339(),
        query: query.to_string(),
        model_used: model_used.map(str::to_string),
        steps,
        latency_ms,
        ok,
    };

    let _ = append_log_entry(&entry);
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read all history entries. Silently skips malformed lines; returns an
/// empty vec if the file does not exist or cannot be read.
pub fn read_all_entries() -> Vec<QueryLogEntry> {
    let Some(path) = query_log_path() else {
        return Vec::new();
    };

    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<QueryLogEntry>(&line).ok())
        .collect()
}

/// Read history entries filtered to a time window (last N days).
///
/// If `days` is `None`, returns all entries.
pub fn read_entries_since_days(days: Option<u32>) -> Vec<QueryLogEntry> {
    let entries = read_all_entries();

    let Some(days) = days else {
        return entries;
    };

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    let cutoff_str = cutoff.to_rfc3339();

    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff_str)
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_log_entry(entry: &QueryLogEntry) -> Result<()> {
    let Some(path) = query_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the query history log.
pub fn query_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".oxbow").join("query-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrips_through_json() {
        let entry = QueryLogEntry {
            timestamp: "2026-08-30T12:00:00+00:00".to_string(),
            query: "what is an oxbow lake".to_string(),
            model_used: Some("claude-haiku".to_string()),
            steps: 4,
            latency_ms: 1800,
            ok: true,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: QueryLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.query, entry.query);
        assert_eq!(back.model_used.as_deref(), Some("claude-haiku"));
        assert_eq!(back.steps, 4);
    }

    #[test]
    fn failed_entry_omits_model_field() {
        let entry = QueryLogEntry {
            timestamp: "2026-08-30T12:00:00+00:00".to_string(),
            query: "q".to_string(),
            model_used: None,
            steps: 1,
            latency_ms: 300,
            ok: false,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("model_used"));
        let back: QueryLogEntry = serde_json::from_str(&json).unwrap();
        assert!(back.model_used.is_none());
        assert!(!back.ok);
    }
}
