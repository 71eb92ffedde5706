//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::watch;
use tracing::{info, warn};

use arraywatch_core::{
    Credentials, DaemonSettings, OutputMode, Severity, Subsystem, short_controller_name, subsystems,
};
use arraywatch_health::{CheckOptions, CheckPlan, FileInspector, Report, overall_severity};
use arraywatch_scheduler::{HostResolver, RoundConfig, Scheduler};
use arraywatch_state::{FieldValue, StalenessMonitor, StatusStore};

use crate::cli::{CheckArgs, QueryArgs, RunArgs};
use crate::poller::{Poller, SubsystemSource, epoch_now};
use crate::supervisor::{Supervisor, SupervisorConfig};

/// Settings from `path`, or the built-in defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<DaemonSettings> {
    match path {
        Some(path) => DaemonSettings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(DaemonSettings::default()),
    }
}

fn build_scheduler(
    settings: &DaemonSettings,
    checks: &[String],
    options: CheckOptions,
    round: RoundConfig,
) -> anyhow::Result<Scheduler> {
    let plan = CheckPlan::from_names(checks, options)?;
    let inspector = Arc::new(FileInspector::new(&settings.inspector_dir));
    Ok(Scheduler::new(
        inspector,
        Arc::new(plan),
        HostResolver::system(),
        round,
    )?)
}

/// `arraywatchd run`
pub async fn run_daemon(args: RunArgs, mut settings: DaemonSettings) -> anyhow::Result<()> {
    if let Some(path) = args.subsystems {
        settings.subsystems = path;
    }
    if let Some(path) = args.store {
        settings.store_path = path;
    }

    let scheduler = build_scheduler(
        &settings,
        &settings.checks,
        CheckOptions {
            mode: OutputMode::Compact,
            detail_budget: settings.detail_budget,
        },
        RoundConfig::from_settings(&settings),
    )?;

    if let Some(parent) = settings.store_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = StatusStore::open(&settings.store_path)?;
    info!(path = ?settings.store_path, "status store opened");

    let poller = Arc::new(Poller::new(
        scheduler,
        store,
        StalenessMonitor::new(settings.staleness_interval()),
        SubsystemSource::File(settings.subsystems.clone()),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl-C handler");
                // Keep the sender alive so the supervisor is not shut down.
                std::future::pending::<()>().await;
            }
        }
    });

    info!(subsystems = ?settings.subsystems, "arraywatch daemon starting");
    Supervisor::new(SupervisorConfig::from_settings(&settings))
        .run(
            move || {
                let poller = Arc::clone(&poller);
                async move { poller.poll_once().await.map(|_| ()) }
            },
            shutdown_rx,
        )
        .await?;

    info!("arraywatch daemon stopped");
    Ok(())
}

/// `arraywatchd check`: one round, returns the overall severity.
pub async fn run_check(args: CheckArgs, settings: DaemonSettings) -> anyhow::Result<Severity> {
    let mode = if args.extended {
        OutputMode::Extended
    } else {
        OutputMode::Compact
    };
    let checks = if args.checks.is_empty() {
        &settings.checks
    } else {
        &args.checks
    };

    let mut round = RoundConfig::from_settings(&settings);
    if let Some(workers) = args.workers {
        round.max_workers = workers;
    }
    let scheduler = build_scheduler(
        &settings,
        checks,
        CheckOptions {
            mode,
            detail_budget: settings.detail_budget,
        },
        round,
    )?;

    let mut targets: Vec<Subsystem> = if args.subsystems.is_empty() {
        subsystems::load(&settings.subsystems)?
    } else {
        args.subsystems
            .iter()
            .enumerate()
            .map(|(i, controllers)| Subsystem::new((i + 1).to_string(), controllers, true))
            .collect()
    };

    let credentials = match (&args.user, &args.password) {
        (None, None) => None,
        (user, password) => {
            let fallback = Credentials::default();
            Some(Credentials::new(
                user.clone().unwrap_or(fallback.username),
                password.clone().unwrap_or(fallback.password),
            ))
        }
    };
    for subsystem in &mut targets {
        if args.non_production {
            subsystem.production = false;
        }
        if let Some(credentials) = &credentials {
            subsystem.credentials = credentials.clone();
        }
    }

    let reports = scheduler.run_round(&targets).await;
    for report in &reports {
        println!("{}", render(report, mode));
    }
    Ok(overall_severity(&reports))
}

fn render(report: &Report, mode: OutputMode) -> String {
    match mode {
        OutputMode::Compact => format!("{} {} - {}", report.label, report.severity, report.message),
        OutputMode::Extended => format!("{} {}\n{}\n", report.label, report.severity, report.message),
    }
}

/// `arraywatchd query`: returns the stored severity.
pub fn run_query(args: QueryArgs, settings: DaemonSettings) -> anyhow::Result<Severity> {
    let path = args.store.unwrap_or(settings.store_path.clone());
    if !path.exists() {
        bail!("no status store at {}", path.display());
    }
    let store = StatusStore::open(&path)?;
    let monitor = StalenessMonitor::new(settings.staleness_interval());
    let now = epoch_now();

    if let Some(oid) = args.oid {
        return Ok(match monitor.get_field(&store, &args.base, &oid, now)? {
            Some(FieldValue::Integer(value)) => {
                println!("{value}");
                Severity::Ok
            }
            Some(FieldValue::Text(value)) => {
                println!("{value}");
                Severity::Ok
            }
            None => {
                println!("No such object: {oid}");
                Severity::Unknown
            }
        });
    }

    let controller = args
        .controller
        .context("no controller to query was specified")?;
    let name = short_controller_name(&controller);
    let Some(entry) = store.get_controller(name)? else {
        println!("No status recorded for {name}");
        return Ok(Severity::Unknown);
    };

    let seen = monitor.view(&entry, now);
    println!("{}", seen.message);
    Ok(seen.severity())
}
