//! Command line interface built on clap.
//!
//! Defines [`Cli`] with its [`Command`] subcommands (run, ping, demo,
//! inspect) and the global flags (--api-url, --output-dir, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SmartTraffic: turn a traffic ticket into an appeal recommendation.
#[derive(Debug, Parser)]
#[command(name = "smarttraffic", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the analysis backend (overrides config and environment).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for exported reports.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a ticket and walk it through analysis and export.
    Run {
        /// Image or PDF of the ticket (JPG, PNG or PDF).
        file: PathBuf,

        /// Correct an extracted field, e.g. `--set fineAmount=500`. Repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Save the final workflow state as JSON.
        #[arg(long)]
        state_out: Option<PathBuf>,
    },

    /// Check that the backend is reachable.
    Ping,

    /// Walk through the workflow against a built-in offline backend.
    Demo {
        /// Value to fill in for the fine amount the demo OCR leaves blank.
        #[arg(long, default_value = "250")]
        fine: String,
    },

    /// Show a saved workflow state.
    Inspect {
        /// Path to a state file written by `run --state-out`.
        path: PathBuf,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err("field name must not be empty".to_string());
    }
    Ok((field.to_string(), value.to_string()))
}
