//! The fan-out round.
//!
//! Every resolved target gets one check task. Tasks run on the blocking
//! pool, at most `max_workers` at a time, under a single deadline for the
//! whole round. When the deadline passes, outstanding tasks are aborted
//! and reported as timed out; a blocking inspection that ignores the abort
//! is left behind and never holds the round open.
//!
//! Aborting cannot stop a blocking inspection, so a controller that hangs
//! would pin one blocking thread per round. The scheduler remembers which
//! controllers still have an inspection on the blocking pool and skips
//! them in later rounds, reporting `previous check still running`, until
//! the old inspection returns. At most one thread per controller is lost.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use arraywatch_core::{DaemonSettings, Subsystem, Target};
use arraywatch_health::{CheckPlan, Inspector, Report, TaskFailure, TaskResult, aggregate};

use crate::error::{SchedulerError, SchedulerResult};
use crate::resolver::HostResolver;

/// Limits applied to one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    /// Maximum number of targets checked at the same time.
    pub max_workers: usize,
    /// Wall-clock budget for the whole round.
    pub deadline: Duration,
    /// Interval between progress reports while tasks are outstanding.
    pub poll_tick: Duration,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            deadline: Duration::from_secs(300),
            poll_tick: Duration::from_secs(10),
        }
    }
}

impl RoundConfig {
    pub fn from_settings(settings: &DaemonSettings) -> Self {
        Self {
            max_workers: settings.max_workers,
            deadline: settings.round_deadline,
            poll_tick: settings.poll_tick,
        }
    }

    fn validate(&self) -> SchedulerResult<()> {
        if self.max_workers == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_workers must be at least 1".into(),
            ));
        }
        if self.deadline.is_zero() || self.poll_tick.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "deadline and poll_tick must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Controllers with an inspection on the blocking pool, with how many.
#[derive(Debug, Default)]
struct InFlight(Mutex<HashMap<String, usize>>);

impl InFlight {
    fn busy(&self) -> HashSet<String> {
        let held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        held.keys().cloned().collect()
    }

    fn claim(self: &Arc<Self>, controller: &str) -> InFlightGuard {
        let mut held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *held.entry(controller.to_string()).or_default() += 1;
        InFlightGuard {
            owner: Arc::clone(self),
            controller: controller.to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

/// Releases the claim when the inspection returns or never starts.
struct InFlightGuard {
    owner: Arc<InFlight>,
    controller: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut held = self.owner.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = held.get_mut(&self.controller) {
            *count -= 1;
            if *count == 0 {
                held.remove(&self.controller);
            }
        }
    }
}

/// Runs check rounds against a set of subsystems.
#[derive(Clone)]
pub struct Scheduler {
    inspector: Arc<dyn Inspector>,
    plan: Arc<CheckPlan>,
    resolver: HostResolver,
    config: RoundConfig,
    in_flight: Arc<InFlight>,
}

impl Scheduler {
    pub fn new(
        inspector: Arc<dyn Inspector>,
        plan: Arc<CheckPlan>,
        resolver: HostResolver,
        config: RoundConfig,
    ) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            inspector,
            plan,
            resolver,
            config,
            in_flight: Arc::default(),
        })
    }

    /// Run one round and return a report per subsystem, in input order.
    ///
    /// Subsystems whose controllers all fail to resolve report UNKNOWN.
    /// When nothing resolves at all, the round yields a single
    /// "no valid hosts" report and no task is started.
    pub async fn run_round(&self, subsystems: &[Subsystem]) -> Vec<Report> {
        let started = Instant::now();
        info!(subsystems = subsystems.len(), "check round starting");

        let mut resolved = Vec::with_capacity(subsystems.len());
        for subsystem in subsystems {
            resolved.push(self.resolver.resolve_target(subsystem).await);
        }

        let targets: Vec<Target> = resolved.iter().flatten().cloned().collect();
        if targets.is_empty() {
            warn!("no subsystem resolved; nothing to check");
            return vec![Report::no_valid_hosts()];
        }

        let mut results = self.fan_out(targets).await.into_iter();
        let mode = self.plan.options().mode;
        let reports: Vec<Report> = subsystems
            .iter()
            .zip(&resolved)
            .map(|(subsystem, target)| {
                let label = subsystem.label();
                let result = match target {
                    Some(_) => results
                        .next()
                        .unwrap_or(TaskResult::Failed(TaskFailure::TimedOut)),
                    None => TaskResult::Failed(TaskFailure::Unresolved),
                };
                let report = aggregate(&label, &result, subsystem.production, mode);
                debug!(target = %label, severity = %report.severity, "target reported");
                report
            })
            .collect();

        info!(
            reports = reports.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "check round finished"
        );
        reports
    }

    /// Check every target, returning results in target order.
    async fn fan_out(&self, targets: Vec<Target>) -> Vec<TaskResult> {
        let deadline = Instant::now() + self.config.deadline;
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.min(targets.len())));
        let mut set = JoinSet::new();
        let mut pending = HashMap::new();
        let mut results: Vec<Option<TaskResult>> = vec![None; targets.len()];
        let labels: Vec<String> = targets.iter().map(|t| t.label.clone()).collect();
        let busy = self.in_flight.busy();

        for (index, target) in targets.into_iter().enumerate() {
            if busy.contains(&target.controller) {
                warn!(target = %target.label, "previous check still running; skipped");
                results[index] = Some(TaskResult::Failed(TaskFailure::StillRunning));
                continue;
            }
            let guard = self.in_flight.claim(&target.controller);
            let semaphore = Arc::clone(&semaphore);
            let inspector = Arc::clone(&self.inspector);
            let plan = Arc::clone(&self.plan);
            let handle = set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return TaskResult::Failed(TaskFailure::Aborted("worker pool closed".into()));
                };
                tokio::task::spawn_blocking(move || {
                    let _guard = guard;
                    plan.run_checks(inspector.as_ref(), &target)
                })
                    .await
                    .unwrap_or_else(|e| TaskResult::Failed(TaskFailure::Aborted(e.to_string())))
            });
            pending.insert(handle.id(), index);
        }

        let mut tick = tokio::time::interval_at(
            Instant::now() + self.config.poll_tick,
            self.config.poll_tick,
        );
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                joined = set.join_next_with_id() => {
                    let (id, result) = match joined {
                        None => break,
                        Some(Ok((id, result))) => (id, result),
                        Some(Err(e)) => (e.id(), TaskResult::Failed(TaskFailure::Aborted(e.to_string()))),
                    };
                    if let Some(index) = pending.remove(&id) {
                        results[index] = Some(result);
                    }
                }
                _ = tick.tick() => {
                    debug!(outstanding = pending.len(), "waiting on check tasks");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    set.abort_all();
                    for index in pending.values() {
                        warn!(target = %labels[*index], "check task timed out");
                    }
                    break;
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or(TaskResult::Failed(TaskFailure::TimedOut)))
            .collect()
    }
}
