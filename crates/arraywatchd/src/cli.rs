//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Object id prefix the status table is published under.
pub const OID_BASE: &str = ".1.3.6.1.4.1.341.49.1";

#[derive(Debug, Parser)]
#[command(name = "arraywatchd", version, about = "Storage subsystem health poller")]
pub struct Cli {
    /// Daemon settings file (TOML).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every configured subsystem on a fixed interval until Ctrl-C.
    Run(RunArgs),
    /// Run one round and exit with the worst severity.
    Check(CheckArgs),
    /// Print the stored status of one controller.
    Query(QueryArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Subsystem list, overriding the settings file.
    #[arg(long)]
    pub subsystems: Option<PathBuf>,

    /// Status store path, overriding the settings file.
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Comma-joined controller names; replaces the subsystem list.
    pub subsystems: Vec<String>,

    /// Checks to run (repeat or comma-separate). Default: all.
    #[arg(short = 'm', long = "check", value_delimiter = ',')]
    pub checks: Vec<String>,

    /// Multi-line output with every detail line.
    #[arg(short = 'x', long)]
    pub extended: bool,

    /// Maximum number of subsystems checked at once.
    #[arg(short = 'n', long)]
    pub workers: Option<usize>,

    /// Treat every subsystem as non-production.
    #[arg(long)]
    pub non_production: bool,

    #[arg(short = 'u', long)]
    pub user: Option<String>,

    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Controller host name; shortened to its first label.
    #[arg(long, required_unless_present = "oid", conflicts_with = "oid")]
    pub controller: Option<String>,

    /// Raw object id, e.g. `<base>.3.97.98.99.2`.
    #[arg(long)]
    pub oid: Option<String>,

    #[arg(long, default_value = OID_BASE)]
    pub base: String,

    /// Status store path, overriding the settings file.
    #[arg(long)]
    pub store: Option<PathBuf>,
}
