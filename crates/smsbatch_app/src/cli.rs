use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "smsbatch", version, about = "Send templated SMS in bulk, one item at a time")]
pub struct Cli {
    /// Config file (RON). Defaults to ./smsbatch.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// API base URL, overrides the config file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token for the API.
    #[arg(long, global = true, env = "SMSBATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an input file and send every record.
    Send(SendArgs),
    /// Parse an input file and print the records without sending.
    Check(CheckArgs),
    /// List the SMS templates available to a user.
    Templates(TemplatesArgs),
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Template id to send with.
    #[arg(long)]
    pub template: String,

    /// Bulk input file: `var:val,var:val;time;dest,dest;retries` per line.
    #[arg(long)]
    pub input: PathBuf,

    /// Skip items already sent by a previous run of the same input.
    #[arg(long)]
    pub resume: bool,

    /// Progress snapshot file, overrides the config file.
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    #[arg(long)]
    pub user_id: u64,
}
