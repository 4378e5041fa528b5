use anyhow::Context;
use clap::Parser;
use sqltop::cli::{Cli, Command};
use sqltop::error::exit_code;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(sqltop_err) = e.downcast_ref::<sqltop::Error>() {
                ExitCode::from(sqltop_err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Top {
            file,
            top,
            window,
            json,
            csv,
        } => {
            sqltop::commands::top::run(&file, top, window, json, csv, cli.state.as_deref())?;
        }
        Command::Series {
            file,
            window,
            json,
            csv,
        } => {
            sqltop::commands::series::run(&file, window, json, csv)?;
        }
        Command::Instances { file, json } => {
            sqltop::commands::instances::run(&file, json)?;
        }
        Command::Select { file, digest } => {
            let state = cli
                .state
                .as_deref()
                .ok_or_else(|| {
                    sqltop::Error::InvalidArgument(
                        "--state is required to persist a selection".to_string(),
                    )
                })
                .context("Invalid arguments")?;
            sqltop::commands::select::run(&file, &digest, state)?;
        }
        Command::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sqltop", &mut std::io::stdout());
        }
    }

    Ok(())
}
