//! CLI command implementations for oxbow.
//!
//! Provides subcommand handlers for:
//! - `oxbow chat` — interactive playground session with live routing steps
//! - `oxbow ask "query"` — one-shot query
//! - `oxbow models` — selectable-model catalog
//! - `oxbow ranges` — valid constraint ranges
//! - `oxbow wallet` — wallet balance
//! - `oxbow history` / `oxbow stats` — local query history views
//! - `oxbow health` — backend reachability, config, log file
//! - `oxbow config show|init|set|reset` — configuration management

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::ApiClient;
use crate::config::{self, OxbowConfig};
use crate::history::{self, stats};
use crate::playground::params::{AutoParams, QueryParams};
use crate::playground::session::{FrameOutcome, QueryOutcome, QuerySession};
use crate::playground::{Entry, Role};

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Query parameter assembly
// ---------------------------------------------------------------------------

/// Optional per-invocation overrides for auto-mode routing parameters.
#[derive(Debug, Default, Clone)]
pub struct ParamOverrides {
    pub model: Option<String>,
    pub cost_priority: Option<f64>,
    pub accuracy_priority: Option<f64>,
    pub latency_priority: Option<f64>,
    pub cost_max: Option<f64>,
    pub perf_min: Option<f64>,
    pub lat_max: Option<f64>,
}

/// Build query parameters from config defaults plus CLI overrides.
///
/// Naming a model switches to manual selection; otherwise auto mode with
/// the configured priority weights. Constraints left unset are seeded to
/// the permissive extreme of the fetched ranges by the session driver.
fn build_params(cfg: &OxbowConfig, overrides: &ParamOverrides) -> QueryParams {
    if let Some(model_id) = &overrides.model {
        return QueryParams::Manual {
            model_id: model_id.clone(),
        };
    }

    QueryParams::Auto(AutoParams {
        cost_priority: overrides.cost_priority.unwrap_or(cfg.defaults.cost_priority),
        accuracy_priority: overrides
            .accuracy_priority
            .unwrap_or(cfg.defaults.accuracy_priority),
        latency_priority: overrides
            .latency_priority
            .unwrap_or(cfg.defaults.latency_priority),
        cost_max: overrides.cost_max,
        perf_min: overrides.perf_min,
        lat_max: overrides.lat_max,
    })
}

// ---------------------------------------------------------------------------
// Streaming query driver
// ---------------------------------------------------------------------------

/// Submit one query and pump its stream to completion.
///
/// Stages the transcript, opens the single SSE connection, applies each
/// frame to the session, and renders progress as it arrives. Any transport
/// failure aborts the session so the caller can resubmit.
fn run_streaming_query(
    client: &ApiClient,
    session: &mut QuerySession,
    cfg: &OxbowConfig,
    query: &str,
    params: &QueryParams,
    show_steps: bool,
) -> Result<QueryOutcome> {
    let entry_id = session.begin_query(query, params)?;

    let started = Instant::now();
    let mut stream = match client.stream_query(query, params) {
        Ok(stream) => stream,
        Err(e) => {
            session.abort();
            return Err(e.context("could not reach the backend"));
        }
    };

    loop {
        let frame = match stream.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                // Server hung up without a terminal frame.
                session.abort();
                log_outcome(cfg, query, None, session, entry_id, started, false);
                anyhow::bail!("connection closed before a final answer");
            }
            Err(e) => {
                session.abort();
                log_outcome(cfg, query, None, session, entry_id, started, false);
                return Err(e.context("query stream failed"));
            }
        };

        match session.apply_frame(frame) {
            FrameOutcome::Continue => {
                if show_steps
                    && let Some(entry) = session.transcript().get(entry_id)
                    && let Some(step) = entry.steps.last()
                {
                    print_step(&step.label, step.payload.as_ref());
                }
            }
            FrameOutcome::Finished(outcome) => {
                stream.close();
                let model = match &outcome {
                    QueryOutcome::Answered { model, .. } => model.as_deref(),
                    QueryOutcome::Failed { .. } => None,
                };
                let ok = matches!(outcome, QueryOutcome::Answered { .. });
                log_outcome(cfg, query, model, session, entry_id, started, ok);
                return Ok(outcome);
            }
        }
    }
}

fn log_outcome(
    cfg: &OxbowConfig,
    query: &str,
    model: Option<&str>,
    session: &QuerySession,
    entry_id: crate::playground::EntryId,
    started: Instant,
    ok: bool,
) {
    if !cfg.logging.enabled {
        return;
    }
    let steps = session
        .transcript()
        .get(entry_id)
        .map(|e| e.steps.len())
        .unwrap_or(0);
    history::log_query(query, model, steps, started.elapsed().as_millis() as u64, ok);
}

fn print_step(label: &str, payload: Option<&serde_json::Value>) {
    println!("  {} {}", "·".cyan(), label.dimmed());
    if let Some(value) = payload
        && let Ok(pretty) = serde_json::to_string_pretty(value)
    {
        for line in pretty.lines() {
            println!("    {}", line.dimmed());
        }
    }
}

fn print_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::Answered { text, model } => {
            println!();
            println!("{text}");
            if let Some(model) = model {
                println!("{}", format!("— answered by {model}").dimmed());
            }
        }
        QueryOutcome::Failed { message } => {
            println!("{} {}", "error:".red().bold(), message);
        }
    }
}

// ---------------------------------------------------------------------------
// oxbow ask
// ---------------------------------------------------------------------------

/// One-shot query: submit, stream, print the answer, exit.
pub fn run_ask(query: &str, overrides: &ParamOverrides, show_steps: bool) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.backend);
    let mut session = QuerySession::new();

    seed_session_ranges(&client, &mut session);

    let mut params = build_params(&cfg, overrides);
    if let (QueryParams::Auto(auto), Some(ranges)) = (&mut params, session.ranges()) {
        auto.seed_constraints(ranges);
    }

    let outcome = run_streaming_query(&client, &mut session, &cfg, query, &params, show_steps)?;
    print_outcome(&outcome);

    if matches!(outcome, QueryOutcome::Failed { .. }) {
        std::process::exit(1);
    }
    Ok(())
}

/// Fetch constraint ranges into the session. A failure is a dimmed notice,
/// not a blocking error — validation then defers to the backend.
fn seed_session_ranges(client: &ApiClient, session: &mut QuerySession) {
    match client.get_ranges() {
        Ok(ranges) => session.set_ranges(ranges),
        Err(e) => eprintln!(
            "{}",
            format!("note: constraint ranges unavailable ({e:#})").dimmed()
        ),
    }
}

// ---------------------------------------------------------------------------
// oxbow chat
// ---------------------------------------------------------------------------

/// Interactive playground loop.
///
/// Reads one query per line; `/steps` folds or unfolds the latest routing
/// steps, `/transcript` replays the conversation, `/reset` clears it,
/// `/quit` exits.
pub fn run_chat(overrides: &ParamOverrides) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.backend);
    let mut session =
        QuerySession::with_greeting("Welcome to the oxbow playground. Ask me anything.");

    println!("{}", "oxbow playground".bold().cyan());
    println!(
        "{}",
        "Type a query, or /steps, /transcript, /reset, /quit.".dimmed()
    );
    seed_session_ranges(&client, &mut session);
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", "you>".green().bold());
        io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            break; // EOF
        };
        let line = line.context("failed to read input")?;
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("{}", "transcript cleared".dimmed());
                continue;
            }
            "/transcript" => {
                print_transcript(&session);
                continue;
            }
            "/steps" => {
                toggle_latest_steps(&mut session);
                continue;
            }
            _ => {}
        }

        let mut params = build_params(&cfg, overrides);
        if let (QueryParams::Auto(auto), Some(ranges)) = (&mut params, session.ranges()) {
            auto.seed_constraints(ranges);
        }

        match run_streaming_query(&client, &mut session, &cfg, input, &params, true) {
            Ok(outcome) => print_outcome(&outcome),
            // Validation and transport errors are both recoverable here:
            // show them and keep the loop alive for a fresh submission.
            Err(e) => println!("{} {e:#}", "error:".red().bold()),
        }
        println!();
    }

    Ok(())
}

/// Fold/unfold the most recent processing entry's step list and re-render it.
fn toggle_latest_steps(session: &mut QuerySession) {
    let Some(id) = session
        .transcript()
        .entries()
        .iter()
        .rev()
        .find(|e| e.role == Role::Processing)
        .map(|e| e.id)
    else {
        println!("{}", "no routing steps yet".dimmed());
        return;
    };

    session.toggle_steps(id);
    if let Some(entry) = session.transcript().get(id) {
        print_entry(entry);
    }
}

fn print_transcript(session: &QuerySession) {
    if session.transcript().is_empty() {
        println!("{}", "transcript is empty".dimmed());
        return;
    }
    for entry in session.transcript().entries() {
        print_entry(entry);
    }
}

fn print_entry(entry: &Entry) {
    match entry.role {
        Role::User => println!("{} {}", "you>".green().bold(), entry.text),
        Role::System => {
            println!("{} {}", "oxbow>".cyan().bold(), entry.text);
            if let Some(model) = &entry.model {
                println!("  {}", format!("— answered by {model}").dimmed());
            }
        }
        Role::Processing => {
            let state = if entry.done { "routed" } else { "interrupted" };
            println!(
                "{} {} ({} steps)",
                "⋯".cyan(),
                state.dimmed(),
                entry.steps.len()
            );
            if entry.expanded {
                for step in &entry.steps {
                    print_step(&step.label, step.payload.as_ref());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// oxbow models
// ---------------------------------------------------------------------------

/// Show the selectable-model catalog.
pub fn run_models(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.backend);
    let models = client.model_catalog()?;

    if models.is_empty() {
        println!("{}", "The catalog is empty.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let values: Vec<_> = models
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "id": m.id,
                        "name": m.name,
                        "cost": m.cost,
                        "latency": m.latency,
                        "performance": m.performance,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Csv => {
            println!("id,name,cost,latency,performance");
            for m in &models {
                println!("{},{},{},{},{}", m.id, m.name, m.cost, m.latency, m.performance);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Model Catalog".bold().cyan());
            println!("{}", "=".repeat(60));
            println!(
                "  {:<28} {:>8} {:>10} {:>12}",
                "Name", "Cost", "Latency", "Performance"
            );
            println!("  {}", "-".repeat(58));
            for (i, m) in models.iter().enumerate() {
                let line = format!(
                    "  {:<28} {:>8.2} {:>10.0} {:>12.1}",
                    truncate(&m.name, 28),
                    m.cost,
                    m.latency,
                    m.performance,
                );
                if i % 2 == 0 {
                    println!("{line}");
                } else {
                    println!("{}", line.dimmed());
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// oxbow ranges
// ---------------------------------------------------------------------------

/// Show the valid constraint ranges.
pub fn run_ranges(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.backend);
    let ranges = client.get_ranges()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ranges)?);
        return Ok(());
    }

    println!("{}", "Valid Constraint Ranges".bold().cyan());
    println!("{}", "=".repeat(40));
    println!(
        "  {} [{}, {}]",
        "Cost:       ".bold(),
        ranges.cost_min,
        ranges.cost_max
    );
    println!(
        "  {} [{}, {}]",
        "Performance:".bold(),
        ranges.performance_min,
        ranges.performance_max
    );
    println!(
        "  {} [{}, {}]",
        "Latency:    ".bold(),
        ranges.latency_min,
        ranges.latency_max
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// oxbow wallet
// ---------------------------------------------------------------------------

/// Show the wallet balance.
pub fn run_wallet() -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.backend);
    let balance = client.wallet_balance()?;

    println!("  {} {:.2} credits", "Balance:".bold(), balance);
    if balance <= 10.0 {
        println!(
            "  {}",
            "Balance is low — queries may be rejected.".yellow()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// oxbow history
// ---------------------------------------------------------------------------

/// List recent queries from the local history log.
pub fn run_history(format: OutputFormat, days: Option<u32>, limit: usize) -> Result<()> {
    let mut entries = history::read_entries_since_days(days);

    if entries.is_empty() {
        println!(
            "{}",
            "No history yet. Run some queries to populate it.".yellow()
        );
        return Ok(());
    }

    // Newest first.
    entries.reverse();
    entries.truncate(limit);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Csv => {
            println!("timestamp,query,model_used,steps,latency_ms,ok");
            for e in &entries {
                println!(
                    "{},{},{},{},{},{}",
                    e.timestamp,
                    e.query.replace(',', ";"),
                    e.model_used.as_deref().unwrap_or(""),
                    e.steps,
                    e.latency_ms,
                    e.ok,
                );
            }
        }
        OutputFormat::Table => {
            println!("{}", "Query History".bold().cyan());
            println!("{}", "=".repeat(72));
            println!(
                "  {:<20} {:<28} {:<14} {:>7}",
                "When", "Query", "Model", "ms"
            );
            println!("  {}", "-".repeat(70));
            for (i, e) in entries.iter().enumerate() {
                let when = e.timestamp.get(..19).unwrap_or(&e.timestamp);
                let model = e.model_used.as_deref().unwrap_or("—");
                let line = format!(
                    "  {:<20} {:<28} {:<14} {:>7}",
                    when,
                    truncate(&e.query, 28),
                    truncate(model, 14),
                    e.latency_ms,
                );
                let line = if e.ok { line.normal() } else { line.red() };
                if i % 2 == 0 {
                    println!("{line}");
                } else {
                    println!("{}", line.dimmed());
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// oxbow stats
// ---------------------------------------------------------------------------

/// Show aggregated history statistics.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let stats = stats::compute_stats(days);

    if stats.total_queries == 0 {
        println!(
            "{}",
            "No history yet. Run some queries to see stats.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_stats_json(&stats)?,
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print_stats_table(&stats),
    }

    Ok(())
}

fn print_stats_table(stats: &stats::Stats) {
    println!("{}", "oxbow Query Stats".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!("  {} {}", "Total queries:".bold(), stats.total_queries);
    println!(
        "  {} {} ({:.1}%)",
        "Answered:     ".bold(),
        stats.answered,
        stats.success_pct()
    );
    println!("  {} {}", "Failed:       ".bold(), stats.failed);
    println!(
        "  {} {}ms",
        "Avg latency:  ".bold(),
        format_number(stats.avg_latency_ms as usize)
    );
    println!();

    if !stats.model_stats.is_empty() {
        println!("{}", "Models by Usage".bold().cyan());
        println!(
            "  {:<24} {:>6} {:>10} {:>10}",
            "Model", "Count", "Avg ms", "Avg steps"
        );
        println!("  {}", "-".repeat(54));
        for (i, m) in stats.model_stats.iter().take(15).enumerate() {
            let line = format!(
                "  {:<24} {:>6} {:>10} {:>10.1}",
                truncate(&m.model, 24),
                m.count,
                format_number(m.avg_latency_ms as usize),
                m.avg_steps,
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

fn print_stats_json(stats: &stats::Stats) -> Result<()> {
    let value = serde_json::json!({
        "total_queries": stats.total_queries,
        "answered": stats.answered,
        "failed": stats.failed,
        "success_pct": stats.success_pct(),
        "avg_latency_ms": stats.avg_latency_ms,
        "models": stats.model_stats.iter().map(|m| serde_json::json!({
            "model": m.model,
            "count": m.count,
            "avg_latency_ms": m.avg_latency_ms,
            "avg_steps": m.avg_steps,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_stats_csv(stats: &stats::Stats) {
    println!("model,count,avg_latency_ms,avg_steps");
    for m in &stats.model_stats {
        println!(
            "{},{},{},{:.1}",
            m.model, m.count, m.avg_latency_ms, m.avg_steps,
        );
    }
}

// ---------------------------------------------------------------------------
// oxbow health
// ---------------------------------------------------------------------------

/// Check system health: config files, backend reachability, session, log.
pub fn run_health() -> Result<()> {
    println!("{}", "oxbow Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    // 0. Config file status
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.oxbow/config.toml found"
        } else {
            "not found (run `oxbow config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".oxbow.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item("Backend URL", true, &cfg.backend.base_url);

    // 1. Backend reachability (unauthenticated surface)
    let client = ApiClient::from_config(&cfg.backend);
    let ranges_ok = client.get_ranges().is_ok();
    print_health_item(
        "Backend",
        ranges_ok,
        if ranges_ok {
            "reachable"
        } else {
            "not reachable — check backend.base_url"
        },
    );

    // 2. Session cookie
    let has_cookie = !cfg.backend.session_cookie.is_empty();
    if has_cookie {
        let session_ok = client.wallet_balance().is_ok();
        print_health_item(
            "Session",
            session_ok,
            if session_ok {
                "cookie accepted"
            } else {
                "cookie rejected — refresh backend.session_cookie"
            },
        );
    } else {
        print_health_item(
            "Session",
            false,
            "no session cookie set (set backend.session_cookie)",
        );
    }

    // 3. History log
    let log_exists = history::query_log_path().map(|p| p.exists()).unwrap_or(false);
    let log_entries = if log_exists {
        history::read_all_entries().len()
    } else {
        0
    };
    print_health_item(
        "Query history",
        log_exists,
        &if log_exists {
            format!("{log_entries} entries")
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// oxbow config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective oxbow Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    // Show source info
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.oxbow/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.oxbow/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".oxbow.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".oxbow.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "OXBOW_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.oxbow/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Set backend.base_url and backend.session_cookie to get started.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn overrides_select_manual_mode() {
        let cfg = OxbowConfig::default();
        let overrides = ParamOverrides {
            model: Some("gpt-4o".to_string()),
            ..ParamOverrides::default()
        };
        assert_eq!(
            build_params(&cfg, &overrides),
            QueryParams::Manual {
                model_id: "gpt-4o".to_string()
            }
        );
    }

    #[test]
    fn auto_params_fall_back_to_config_defaults() {
        let mut cfg = OxbowConfig::default();
        cfg.defaults.cost_priority = 8.0;
        let overrides = ParamOverrides {
            latency_priority: Some(2.0),
            ..ParamOverrides::default()
        };
        match build_params(&cfg, &overrides) {
            QueryParams::Auto(auto) => {
                assert!((auto.cost_priority - 8.0).abs() < f64::EPSILON);
                assert!((auto.latency_priority - 2.0).abs() < f64::EPSILON);
                assert!((auto.accuracy_priority - 5.0).abs() < f64::EPSILON);
                assert!(auto.cost_max.is_none());
            }
            other => panic!("expected auto params, got {other:?}"),
        }
    }
}
