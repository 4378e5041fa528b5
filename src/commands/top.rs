use super::{compact_sql, format_ms};
use crate::error::Result;
use crate::selection::{SELECTED_STATEMENT_SLOT, SelectionCoordinator};
use crate::store::SqliteStore;
use crate::summary::{RankedStatement, TopSummary, summarize};
use crate::telemetry::load_records;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const BAR_WIDTH: usize = 20;
const QUERY_WIDTH: usize = 60;
const OTHERS_LABEL: &str = "Other statements";

pub fn run(
    file: &Path,
    top: Option<usize>,
    window: Option<Duration>,
    json: bool,
    csv: bool,
    state: Option<&Path>,
) -> Result<()> {
    let records = load_records(file)?;
    let summary = summarize(&records)?;

    // With a state database, the last persisted selection is restored
    // and resolved against this batch.
    let selected = match state {
        Some(path) => {
            let store = SqliteStore::open(path)?;
            let coordinator = SelectionCoordinator::new(store, SELECTED_STATEMENT_SLOT)?;
            coordinator.sync_statements(summary.ranked.clone());
            coordinator.selected_statement()
        }
        None => None,
    };

    if json {
        print_json(file, top, window, &summary, selected.as_ref());
    } else if csv {
        print_csv(&summary);
    } else {
        print_table(file, top, window, &summary, selected.as_ref());
    }

    Ok(())
}

fn print_table(
    file: &Path,
    top: Option<usize>,
    window: Option<Duration>,
    summary: &TopSummary,
    selected: Option<&RankedStatement>,
) {
    // Header comment
    println!("# {}", file.display());
    let mut context = format!(
        "# Statements: {} | Capacity: {}",
        summary.ranked.len(),
        format_ms(summary.capacity_ms)
    );
    if let Some(n) = top {
        context.push_str(&format!(" | Top-N: {n}"));
    }
    if let Some(w) = window {
        context.push_str(&format!(" | Window: {}", humantime::format_duration(w)));
    }
    println!("{context}");
    println!();

    if summary.ranked.is_empty() {
        println!("No statements with CPU time in this window.");
        return;
    }

    println!("  {:>10}  {:<width$}  QUERY", "CPU", "", width = BAR_WIDTH);
    println!("{}", "-".repeat(96));

    for stmt in &summary.ranked {
        let marker = if is_selected(stmt, selected) { '>' } else { ' ' };
        let query = match (&stmt.record.sql_text, stmt.record.is_other) {
            (_, true) => OTHERS_LABEL.to_string(),
            (Some(text), false) => compact_sql(text, QUERY_WIDTH),
            (None, false) => stmt.record.digest().unwrap_or("").to_string(),
        };
        println!(
            "{marker} {:>10}  {:<width$}  {}",
            format_ms(stmt.total_cpu_ms),
            bar(stmt.total_cpu_ms, summary.capacity_ms),
            query,
            width = BAR_WIDTH
        );
    }

    if let Some(stmt) = selected {
        println!();
        println!("Selected: {}", stmt.key());
        if let Some(text) = &stmt.record.sql_text {
            println!("  {}", compact_sql(text, 240));
        }
        println!("  Total CPU: {}", format_ms(stmt.total_cpu_ms));
        println!("  Plans: {}", stmt.record.plans.len());
    }
}

/// Proportional bar against the window capacity. A capacity of 0 means
/// "no data" and is never divided by.
fn bar(value_ms: u64, capacity_ms: u64) -> String {
    if capacity_ms == 0 {
        return String::new();
    }
    let width = ((value_ms as f64 / capacity_ms as f64) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.min(BAR_WIDTH))
}

fn print_json(
    file: &Path,
    top: Option<usize>,
    window: Option<Duration>,
    summary: &TopSummary,
    selected: Option<&RankedStatement>,
) {
    let statements: Vec<_> = summary
        .ranked
        .iter()
        .map(|stmt| {
            json!({
                "sql_digest": stmt.record.sql_digest,
                "sql_text": stmt.record.sql_text,
                "is_other": stmt.record.is_other,
                "total_cpu_ms": stmt.total_cpu_ms,
            })
        })
        .collect();

    let output = json!({
        "file": file.display().to_string(),
        "top_n": top,
        "window_sec": window.map(|w| w.as_secs()),
        "capacity_ms": summary.capacity_ms,
        "selected_digest": selected.and_then(|s| s.record.digest()),
        "statements": statements,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Failed to serialize summary: {e}"),
    }
}

fn print_csv(summary: &TopSummary) {
    println!("sql_digest,is_other,total_cpu_ms,sql_text");
    for stmt in &summary.ranked {
        println!(
            "{},{},{},\"{}\"",
            stmt.record.digest().unwrap_or(""),
            stmt.record.is_other,
            stmt.total_cpu_ms,
            stmt.record
                .sql_text
                .as_deref()
                .unwrap_or("")
                .replace('"', "\"\"")
        );
    }
}

fn is_selected(stmt: &RankedStatement, selected: Option<&RankedStatement>) -> bool {
    match selected {
        Some(sel) => sel.record.digest().is_some() && sel.record.digest() == stmt.record.digest(),
        None => false,
    }
}
