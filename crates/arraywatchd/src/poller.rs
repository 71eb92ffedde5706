//! One daemon round: staleness sweep, fan-out, publish.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use tracing::{debug, info};

use arraywatch_core::{ConfigResult, Subsystem, subsystems};
use arraywatch_health::{Report, overall_severity};
use arraywatch_scheduler::Scheduler;
use arraywatch_state::{StalenessMonitor, StatusStore, StoreEntry};

/// Where the subsystem list comes from.
#[derive(Debug, Clone)]
pub enum SubsystemSource {
    /// Re-read before every round, so edits apply without a restart.
    File(PathBuf),
    Fixed(Vec<Subsystem>),
}

impl SubsystemSource {
    pub fn load(&self) -> ConfigResult<Vec<Subsystem>> {
        match self {
            Self::File(path) => subsystems::load(path),
            Self::Fixed(list) => Ok(list.clone()),
        }
    }
}

/// Seconds since the Unix epoch.
pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub struct Poller {
    scheduler: Scheduler,
    store: StatusStore,
    monitor: StalenessMonitor,
    source: SubsystemSource,
    clock: fn() -> u64,
}

impl Poller {
    pub fn new(
        scheduler: Scheduler,
        store: StatusStore,
        monitor: StalenessMonitor,
        source: SubsystemSource,
    ) -> Self {
        Self {
            scheduler,
            store,
            monitor,
            source,
            clock: epoch_now,
        }
    }

    /// Replace the wall clock used for timestamps.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Run one round and publish every report.
    ///
    /// Entries left over from an earlier round are degraded first, so a
    /// subsystem that silently stops reporting turns stale instead of
    /// keeping its last status forever.
    pub async fn poll_once(&self) -> anyhow::Result<Vec<Report>> {
        let subsystems = self
            .source
            .load()
            .context("failed to load subsystem list")?;

        let controllers = subsystems.iter().flat_map(|s| s.controllers.iter());
        let degraded = self
            .monitor
            .sweep(&self.store, controllers, (self.clock)())
            .context("staleness sweep failed")?;
        if degraded > 0 {
            info!(degraded, "stale entries degraded before round");
        }

        let reports = self.scheduler.run_round(&subsystems).await;

        let now = (self.clock)();
        for report in &reports {
            let Some(subsystem) = subsystems.iter().find(|s| s.label() == report.label) else {
                debug!(target = %report.label, "report has no subsystem; not stored");
                continue;
            };
            let entry = StoreEntry::new(report.severity, report.message.clone(), now);
            self.store
                .write_report(&subsystem.controllers, &entry)
                .with_context(|| format!("failed to store status for {}", report.label))?;
        }

        info!(
            targets = reports.len(),
            overall = %overall_severity(&reports),
            "round published"
        );
        Ok(reports)
    }
}
