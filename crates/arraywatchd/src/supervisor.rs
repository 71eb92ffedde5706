//! The daemon supervisor.
//!
//! Runs one round per polling interval, forever. A round that fails or
//! panics is retried after `retry_delay`; failures are counted in a
//! sliding window and the supervisor gives up only when `max_retries`
//! failures happen without a quiet gap longer than `retry_window`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use arraywatch_core::DaemonSettings;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("round failed {failures} times without a {window:?} quiet period (last error: {last_error})")]
    RetryBudgetExhausted {
        failures: u32,
        window: Duration,
        last_error: String,
    },
}

/// What to do after a failed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { remaining: u32 },
    Exhausted,
}

/// Failure budget that refills after a quiet period.
#[derive(Debug, Clone)]
pub struct RetryWindow {
    max_retries: u32,
    remaining: u32,
    window: Duration,
    last_failure: Instant,
}

impl RetryWindow {
    /// `start` counts as the most recent failure, so a burst right after
    /// startup does not get a fresh budget.
    pub fn new(max_retries: u32, window: Duration, start: Instant) -> Self {
        Self {
            max_retries,
            remaining: max_retries,
            window,
            last_failure: start,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn record_failure(&mut self, now: Instant) -> RetryDecision {
        if now.saturating_duration_since(self.last_failure) > self.window {
            self.remaining = self.max_retries;
        }
        self.last_failure = now;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry {
                remaining: self.remaining,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub interval: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
    pub retry_window: Duration,
}

impl SupervisorConfig {
    pub fn from_settings(settings: &DaemonSettings) -> Self {
        Self {
            interval: settings.polling_interval,
            retry_delay: settings.retry_delay,
            max_retries: settings.max_retries,
            retry_window: settings.retry_window,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Run rounds until shutdown is signalled or the retry budget runs out.
    ///
    /// Each round is spawned as its own task and awaited before the next
    /// tick, so rounds never overlap.
    pub async fn run<F, Fut>(
        &self,
        mut round: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SupervisorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut retries = RetryWindow::new(
            self.config.max_retries,
            self.config.retry_window,
            Instant::now(),
        );
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.config.interval, "supervisor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("supervisor shutting down");
                    return Ok(());
                }
            }

            let mut handle = tokio::spawn(round());
            let joined = tokio::select! {
                joined = &mut handle => joined,
                _ = shutdown.changed() => {
                    handle.abort();
                    info!("supervisor shutting down; in-flight round aborted");
                    return Ok(());
                }
            };

            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{e:#}"),
                Err(e) => e.to_string(),
            };

            match retries.record_failure(Instant::now()) {
                RetryDecision::Retry { remaining } => {
                    warn!(
                        error = %failure,
                        remaining,
                        delay = ?self.config.retry_delay,
                        "round failed; restarting after delay"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                        _ = shutdown.changed() => {
                            info!("supervisor shutting down");
                            return Ok(());
                        }
                    }
                    ticker.reset_immediately();
                }
                RetryDecision::Exhausted => {
                    error!(
                        error = %failure,
                        failures = self.config.max_retries,
                        "retry budget exhausted; giving up"
                    );
                    return Err(SupervisorError::RetryBudgetExhausted {
                        failures: self.config.max_retries,
                        window: self.config.retry_window,
                        last_error: failure,
                    });
                }
            }
        }
    }
}
