use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One monitored SQL statement as delivered by the telemetry endpoint.
///
/// A row with an absent/empty digest and `is_other == true` is the
/// synthetic aggregate of everything outside the top-N.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_text: Option<String>,
    #[serde(default)]
    pub is_other: bool,
    #[serde(default)]
    pub plans: Vec<PlanSample>,
}

/// Samples for one execution plan: index-aligned bucket/value arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSample {
    #[serde(default)]
    pub timestamp_sec: Vec<u64>,
    #[serde(default)]
    pub cpu_time_ms: Vec<u64>,
}

impl StatementRecord {
    pub fn key(&self) -> StatementKey {
        StatementKey::of(self)
    }

    /// Returns the digest when present and non-empty.
    pub fn digest(&self) -> Option<&str> {
        match self.sql_digest.as_deref() {
            Some(d) if !d.is_empty() => Some(d),
            _ => None,
        }
    }

    /// Checks the index-alignment invariant of every plan. Mismatched
    /// array lengths are a contract violation by the data source and
    /// fail fast rather than silently corrupting totals.
    pub fn validate(&self) -> Result<()> {
        for plan in &self.plans {
            if plan.timestamp_sec.len() != plan.cpu_time_ms.len() {
                return Err(Error::MisalignedPlan {
                    statement: self.key().to_string(),
                    timestamps: plan.timestamp_sec.len(),
                    values: plan.cpu_time_ms.len(),
                });
            }
        }
        Ok(())
    }
}

/// Identifies a statement in chart series and draw orders.
///
/// The synthetic aggregate row has no digest; giving it a dedicated
/// variant keeps it from ever colliding with a real digest value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKey {
    Other,
    Digest(String),
}

impl StatementKey {
    pub fn of(record: &StatementRecord) -> Self {
        match record.digest() {
            Some(d) => StatementKey::Digest(d.to_string()),
            None => StatementKey::Other,
        }
    }

    pub fn as_digest(&self) -> Option<&str> {
        match self {
            StatementKey::Digest(d) => Some(d),
            StatementKey::Other => None,
        }
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKey::Digest(d) => f.write_str(d),
            StatementKey::Other => f.write_str("(other)"),
        }
    }
}

/// A fetched batch: either a bare JSON array or the endpoint envelope
/// `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Batch<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
    },
}

/// Loads a batch of endpoint items from a JSON file.
pub fn load_batch<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let batch: Batch<T> = serde_json::from_reader(reader)?;
    Ok(match batch {
        Batch::Bare(items) => items,
        Batch::Wrapped { data } => data,
    })
}

/// Loads a statement batch from a JSON file.
pub fn load_records(path: &Path) -> Result<Vec<StatementRecord>> {
    load_batch(path)
}
