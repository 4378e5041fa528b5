use crate::error::Result;
use crate::telemetry::{StatementKey, StatementRecord};
use tracing::debug;

/// A statement with its window total, ready for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedStatement {
    pub record: StatementRecord,
    pub total_cpu_ms: u64,
}

impl RankedStatement {
    pub fn key(&self) -> StatementKey {
        self.record.key()
    }
}

/// Ranked summary for the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopSummary {
    /// Statements with non-zero totals, highest consumer first; the
    /// synthetic aggregate row keeps a fixed slot at the front
    /// regardless of its value.
    pub ranked: Vec<RankedStatement>,
    /// Largest total in the window, the denominator for proportional
    /// bars. 0 means "no data"; consumers must not divide by it.
    pub capacity_ms: u64,
}

/// Collapses each statement's plans into one total and ranks the batch.
///
/// Statements whose total is exactly zero contributed nothing this
/// window and are dropped so they never render a zero-length bar.
pub fn summarize(records: &[StatementRecord]) -> Result<TopSummary> {
    let mut ranked = Vec::with_capacity(records.len());
    for record in records {
        record.validate()?;
        let total_cpu_ms = record_total(record);
        if total_cpu_ms == 0 {
            continue;
        }
        ranked.push(RankedStatement {
            record: record.clone(),
            total_cpu_ms,
        });
    }

    let capacity_ms = ranked.iter().map(|r| r.total_cpu_ms).max().unwrap_or(0);

    ranked.sort_by(|a, b| b.total_cpu_ms.cmp(&a.total_cpu_ms));
    // Second stable pass pins the aggregate row to the first slot even
    // when its value is small.
    ranked.sort_by_key(|r| !r.record.is_other);

    debug!(
        statements = ranked.len(),
        capacity_ms, "summarized statement batch"
    );
    Ok(TopSummary {
        ranked,
        capacity_ms,
    })
}

/// Total CPU time over every plan and bucket; bucket identity is
/// irrelevant here.
fn record_total(record: &StatementRecord) -> u64 {
    record
        .plans
        .iter()
        .map(|plan| plan.cpu_time_ms.iter().sum::<u64>())
        .sum()
}
