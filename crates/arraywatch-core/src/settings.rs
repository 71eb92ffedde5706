//! arraywatchd.toml settings parser.
//!
//! Every key is optional. Durations are strings such as `"300s"`,
//! `"5m"` or `"500ms"`; a bare integer is read as seconds.
//!
//! ```toml
//! subsystems = "/usr/local/etc/arraywatch.conf"
//! store_path = "/var/lib/arraywatch/status.redb"
//! polling_interval = "300s"
//! max_workers = 8
//! checks = ["controller", "disk", "fan"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// On-disk shape of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    subsystems: Option<PathBuf>,
    store_path: Option<PathBuf>,
    inspector_dir: Option<PathBuf>,
    polling_interval: Option<String>,
    staleness_grace: Option<String>,
    max_retries: Option<u32>,
    retry_delay: Option<String>,
    retry_window: Option<String>,
    round_deadline: Option<String>,
    poll_tick: Option<String>,
    max_workers: Option<usize>,
    detail_budget: Option<usize>,
    checks: Option<Vec<String>>,
}

/// Resolved daemon settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonSettings {
    /// Path of the subsystem list.
    pub subsystems: PathBuf,
    /// Path of the status store database.
    pub store_path: PathBuf,
    /// Directory of JSON documents for the file-backed inspector.
    pub inspector_dir: PathBuf,
    /// Time between round starts.
    pub polling_interval: Duration,
    /// Slack added to the polling interval before an entry counts as stale.
    pub staleness_grace: Duration,
    /// Supervisor retry budget.
    pub max_retries: u32,
    /// Sleep before restarting a failed polling loop.
    pub retry_delay: Duration,
    /// Failures further apart than this reset the retry budget.
    pub retry_window: Duration,
    /// Wall-clock budget for one whole round.
    pub round_deadline: Duration,
    /// How often the scheduler reports on outstanding tasks.
    pub poll_tick: Duration,
    /// Upper bound on concurrently running check tasks.
    pub max_workers: usize,
    /// Detail lines surfaced per check in compact output.
    pub detail_budget: usize,
    /// Check names to run. Empty means every known check.
    pub checks: Vec<String>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            subsystems: PathBuf::from("/usr/local/etc/arraywatch.conf"),
            store_path: PathBuf::from("/var/lib/arraywatch/status.redb"),
            inspector_dir: PathBuf::from("/var/lib/arraywatch/inspect"),
            polling_interval: Duration::from_secs(300),
            staleness_grace: Duration::from_secs(5),
            max_retries: 10,
            retry_delay: Duration::from_secs(15),
            retry_window: Duration::from_secs(3600),
            round_deadline: Duration::from_secs(300),
            poll_tick: Duration::from_secs(10),
            max_workers: 8,
            detail_budget: 2,
            checks: Vec::new(),
        }
    }
}

impl DaemonSettings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text, filling unset keys with defaults.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: SettingsFile =
            toml::from_str(content).map_err(|e| ConfigError::Settings(e.to_string()))?;
        let defaults = Self::default();

        let settings = Self {
            subsystems: file.subsystems.unwrap_or(defaults.subsystems),
            store_path: file.store_path.unwrap_or(defaults.store_path),
            inspector_dir: file.inspector_dir.unwrap_or(defaults.inspector_dir),
            polling_interval: duration_or(file.polling_interval, "polling_interval", defaults.polling_interval)?,
            staleness_grace: duration_or(file.staleness_grace, "staleness_grace", defaults.staleness_grace)?,
            max_retries: file.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: duration_or(file.retry_delay, "retry_delay", defaults.retry_delay)?,
            retry_window: duration_or(file.retry_window, "retry_window", defaults.retry_window)?,
            round_deadline: duration_or(file.round_deadline, "round_deadline", defaults.round_deadline)?,
            poll_tick: duration_or(file.poll_tick, "poll_tick", defaults.poll_tick)?,
            max_workers: file.max_workers.unwrap_or(defaults.max_workers),
            detail_budget: file.detail_budget.unwrap_or(defaults.detail_budget),
            checks: file.checks.unwrap_or(defaults.checks),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Age after which a stored entry is considered stale.
    pub fn staleness_interval(&self) -> Duration {
        self.polling_interval.saturating_add(self.staleness_grace)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_workers == 0 {
            return Err(ConfigError::Settings("max_workers must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Settings("max_retries must be at least 1".into()));
        }
        if self.polling_interval.is_zero() || self.round_deadline.is_zero() || self.poll_tick.is_zero() {
            return Err(ConfigError::Settings(
                "polling_interval, round_deadline and poll_tick must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn duration_or(value: Option<String>, key: &str, default: Duration) -> ConfigResult<Duration> {
    match value {
        None => Ok(default),
        Some(s) => parse_duration(&s)
            .ok_or_else(|| ConfigError::Settings(format!("{key}: invalid duration {s:?}"))),
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok()?.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok()?.checked_mul(3600).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
