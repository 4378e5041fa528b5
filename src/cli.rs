use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sqltop")]
#[command(about = "Aggregates and ranks SQL statements by CPU time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// State database remembering the last selection
    #[arg(long, short = 's', global = true)]
    pub state: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank statements of a telemetry batch by total CPU time
    Top {
        /// Telemetry batch file (JSON)
        file: PathBuf,

        /// Top-N limit the upstream fetch was made with
        #[arg(long, short = 'n')]
        top: Option<usize>,

        /// Bucket width the batch was aggregated with
        #[arg(long, short = 'w', value_parser = parse_duration)]
        window: Option<Duration>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Print per-statement chart series in stacking order
    Series {
        /// Telemetry batch file (JSON)
        file: PathBuf,

        /// Bucket width the batch was aggregated with
        #[arg(long, short = 'w', value_parser = parse_duration)]
        window: Option<Duration>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Group monitored instances for the filter control
    Instances {
        /// Instance list file (JSON)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select a statement and persist it for the next session
    Select {
        /// Telemetry batch file (JSON)
        file: PathBuf,

        /// Digest of the statement to select
        digest: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    // Try humantime first
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    // Try bare number as seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    Err(format!("Invalid duration '{}'. Examples: 30s, 1m, 90", s))
}
