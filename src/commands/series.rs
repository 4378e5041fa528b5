use super::format_ms;
use crate::error::Result;
use crate::series::{ChartSeries, build_series, statement_labels};
use crate::telemetry::{StatementKey, load_records};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const LABEL_WIDTH: usize = 50;

pub fn run(file: &Path, window: Option<Duration>, json: bool, csv: bool) -> Result<()> {
    let records = load_records(file)?;
    let chart = build_series(&records)?;
    let labels = statement_labels(&records);

    if json {
        print_json(file, window, &chart, &labels);
    } else if csv {
        print_csv(&chart);
    } else {
        print_table(file, window, &chart, &labels);
    }

    Ok(())
}

fn print_table(
    file: &Path,
    window: Option<Duration>,
    chart: &ChartSeries,
    labels: &BTreeMap<StatementKey, String>,
) {
    // Header comment
    println!("# {}", file.display());
    if let Some(w) = window {
        println!("# Bucket width: {}", humantime::format_duration(w));
    }
    println!();

    if chart.order.is_empty() {
        println!("No series in this window.");
        return;
    }

    // Stacking order, largest consumer first
    for key in &chart.order {
        let label = labels
            .get(key)
            .map(|text| super::compact_sql(text, LABEL_WIDTH))
            .unwrap_or_else(|| key.to_string());
        println!("{label}");
        for point in chart.points(key) {
            println!(
                "  {}  {:>10}",
                format_timestamp(point.timestamp_sec),
                format_ms(point.cpu_time_ms)
            );
        }
        println!();
    }
}

fn print_json(
    file: &Path,
    window: Option<Duration>,
    chart: &ChartSeries,
    labels: &BTreeMap<StatementKey, String>,
) {
    let series: Vec<_> = chart
        .order
        .iter()
        .map(|key| {
            let points: Vec<_> = chart
                .points(key)
                .iter()
                .map(|p| json!([p.timestamp_sec, p.cpu_time_ms]))
                .collect();
            json!({
                "sql_digest": key.as_digest(),
                "sql_text": labels.get(key),
                "points": points,
            })
        })
        .collect();

    let output = json!({
        "file": file.display().to_string(),
        "window_sec": window.map(|w| w.as_secs()),
        "series": series,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Failed to serialize series: {e}"),
    }
}

fn print_csv(chart: &ChartSeries) {
    println!("sql_digest,timestamp_sec,cpu_time_ms");
    for key in &chart.order {
        for point in chart.points(key) {
            println!(
                "{},{},{}",
                key.as_digest().unwrap_or(""),
                point.timestamp_sec,
                point.cpu_time_ms
            );
        }
    }
}

/// Bucket boundary formatted the way the chart axis renders it.
fn format_timestamp(timestamp_sec: u64) -> String {
    match chrono::DateTime::from_timestamp(timestamp_sec as i64, 0) {
        Some(ts) => ts.format("%m-%d %H:%M:%S").to_string(),
        None => timestamp_sec.to_string(),
    }
}
