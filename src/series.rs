use crate::error::Result;
use crate::telemetry::{StatementKey, StatementRecord};
use std::collections::BTreeMap;

/// One bucket of a statement's stacked-chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPoint {
    pub timestamp_sec: u64,
    pub cpu_time_ms: u64,
}

/// Per-statement chart data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSeries {
    /// Bucketed points per statement, ordered by timestamp. A missing
    /// bucket means "no samples", not zero; gap handling belongs to the
    /// charting consumer.
    pub series: BTreeMap<StatementKey, Vec<SeriesPoint>>,
    /// Stacking/legend order: keys by accumulated total descending.
    /// Unlike the ranked list, the aggregate row gets no special slot
    /// here.
    pub order: Vec<StatementKey>,
}

impl ChartSeries {
    pub fn points(&self, key: &StatementKey) -> &[SeriesPoint] {
        self.series.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Collapses the batch into per-statement, per-bucket sums.
///
/// Values from every plan of a statement are summed at each shared
/// timestamp. Stateless; equal batches produce equal output no matter
/// how records or plans are ordered.
pub fn build_series(records: &[StatementRecord]) -> Result<ChartSeries> {
    let mut buckets: BTreeMap<StatementKey, BTreeMap<u64, u64>> = BTreeMap::new();
    let mut totals: BTreeMap<StatementKey, u64> = BTreeMap::new();

    for record in records {
        record.validate()?;
        let key = record.key();
        let per_bucket = buckets.entry(key.clone()).or_default();
        let mut sum = 0u64;
        for plan in &record.plans {
            for (&ts, &cpu) in plan.timestamp_sec.iter().zip(&plan.cpu_time_ms) {
                *per_bucket.entry(ts).or_insert(0) += cpu;
                sum += cpu;
            }
        }
        *totals.entry(key).or_insert(0) += sum;
    }

    let mut order: Vec<StatementKey> = totals.keys().cloned().collect();
    // Ties break on the key so the order is input-order independent.
    order.sort_by(|a, b| totals[b].cmp(&totals[a]).then_with(|| a.cmp(b)));

    let series = buckets
        .into_iter()
        .map(|(key, per_bucket)| {
            let points = per_bucket
                .into_iter()
                .map(|(timestamp_sec, cpu_time_ms)| SeriesPoint {
                    timestamp_sec,
                    cpu_time_ms,
                })
                .collect();
            (key, points)
        })
        .collect();

    Ok(ChartSeries { series, order })
}

/// Representative SQL text per statement, for legend labels. Statements
/// without text (the aggregate row) are absent; the consumer supplies
/// its own label for those.
pub fn statement_labels(records: &[StatementRecord]) -> BTreeMap<StatementKey, String> {
    records
        .iter()
        .filter_map(|r| r.sql_text.clone().map(|text| (r.key(), text)))
        .collect()
}
