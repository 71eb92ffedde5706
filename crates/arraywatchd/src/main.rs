use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::error;
use tracing_subscriber::EnvFilter;

use arraywatch_core::Severity;
use arraywatchd::cli::{Cli, Command};
use arraywatchd::commands;

const DEFAULT_FILTER: &str = "info,arraywatchd=debug,arraywatch=debug";

/// Exit status for unusable arguments, matching the UNKNOWN plugin code.
const USAGE_EXIT: u8 = 3;

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(USAGE_EXIT),
            };
        }
    };

    init_tracing(cli.log_json);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(dispatch(cli));
    // A check stuck in the inspection library must not hold the exit.
    runtime.shutdown_timeout(Duration::from_secs(1));
    ExitCode::from(code)
}

async fn dispatch(cli: Cli) -> u8 {
    let settings = match commands::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = format!("{e:#}"), "invalid settings");
            return match cli.command {
                Command::Run(_) => 1,
                _ => USAGE_EXIT,
            };
        }
    };

    match cli.command {
        Command::Run(args) => match commands::run_daemon(args, settings).await {
            Ok(()) => 0,
            Err(e) => {
                error!(error = format!("{e:#}"), "daemon exited with error");
                1
            }
        },
        Command::Check(args) => severity_exit(commands::run_check(args, settings).await),
        Command::Query(args) => severity_exit(commands::run_query(args, settings)),
    }
}

fn severity_exit(result: anyhow::Result<Severity>) -> u8 {
    match result {
        Ok(severity) => severity.code() as u8,
        Err(e) => {
            println!("UNKNOWN: {e:#}");
            Severity::Unknown.code() as u8
        }
    }
}
