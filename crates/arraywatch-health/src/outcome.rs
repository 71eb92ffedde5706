//! Results produced by a check task.

use std::fmt;

use arraywatch_core::{Severity, SeverityCounts};

use crate::catalog::CheckKind;

/// Result of one component check against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub severity: Severity,
    pub counts: SeverityCounts,
    /// Optional one-line summary surfaced next to the counts.
    pub extra: Option<String>,
    pub details: Vec<String>,
}

impl CheckReport {
    /// Report for a check that raised an error or panicked.
    pub fn internal_failure(kind: CheckKind) -> Self {
        let mut counts = SeverityCounts::default();
        counts.record(Severity::Unknown);
        Self {
            kind,
            severity: Severity::Unknown,
            counts,
            extra: None,
            details: vec![format!("{kind}: UNKNOWN: internal exception")],
        }
    }
}

/// Combined result of every check run against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Name the subsystem reports for itself.
    pub system_name: String,
    pub severity: Severity,
    pub counts: SeverityCounts,
    pub checks: Vec<CheckReport>,
}

impl CheckOutcome {
    /// Fold per-check reports into a task outcome.
    ///
    /// The task severity combines check severities with
    /// [`Severity::escalate`], so a CRITICAL check is never masked by a
    /// later UNKNOWN one. An OK outcome carries no counts and no details.
    pub fn from_reports(system_name: impl Into<String>, checks: Vec<CheckReport>) -> Self {
        let mut severity = Severity::Ok;
        let mut counts = SeverityCounts::default();
        for check in &checks {
            severity = severity.escalate(check.severity);
            counts.add(&check.counts);
        }

        let checks = if severity == Severity::Ok {
            counts = SeverityCounts::default();
            Vec::new()
        } else {
            checks
        };

        Self {
            system_name: system_name.into(),
            severity,
            counts,
            checks,
        }
    }

    /// Every surfaced detail line, in check order.
    pub fn details(&self) -> impl Iterator<Item = &str> {
        self.checks
            .iter()
            .flat_map(|c| c.details.iter().map(String::as_str))
    }
}

/// Why a target produced no inspection outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// None of the subsystem's controller names resolved.
    Unresolved,
    /// The inspection endpoint refused or dropped the session.
    Connect(String),
    /// The round deadline passed before the task finished.
    TimedOut,
    /// An inspection of this controller from an earlier round has not
    /// returned yet.
    StillRunning,
    /// The task died without producing a result.
    Aborted(String),
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("could not resolve any controller"),
            Self::Connect(reason) => write!(f, "connection failed: {reason}"),
            Self::TimedOut => f.write_str("check timed out"),
            Self::StillRunning => f.write_str("previous check still running"),
            Self::Aborted(reason) => write!(f, "check task failed: {reason}"),
        }
    }
}

/// What a check task hands back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Checked(CheckOutcome),
    Failed(TaskFailure),
}

impl TaskResult {
    /// Severity before any production policy is applied.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Checked(outcome) => outcome.severity,
            Self::Failed(_) => Severity::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kind: CheckKind, severity: Severity) -> CheckReport {
        let mut counts = SeverityCounts::default();
        counts.record(severity);
        CheckReport {
            kind,
            severity,
            counts,
            extra: None,
            details: vec![format!("{kind} detail")],
        }
    }

    #[test]
    fn critical_survives_later_unknown() {
        let outcome = CheckOutcome::from_reports(
            "sys",
            vec![
                report(CheckKind::Disk, Severity::Critical),
                report(CheckKind::Fan, Severity::Unknown),
            ],
        );
        assert_eq!(outcome.severity, Severity::Critical);
        assert_eq!(outcome.counts.critical, 1);
        assert_eq!(outcome.counts.unknown, 1);
    }

    #[test]
    fn unknown_beats_warning() {
        let outcome = CheckOutcome::from_reports(
            "sys",
            vec![
                report(CheckKind::Fan, Severity::Warning),
                CheckReport::internal_failure(CheckKind::Pool),
            ],
        );
        assert_eq!(outcome.severity, Severity::Unknown);
        assert!(outcome.details().any(|d| d == "pool: UNKNOWN: internal exception"));
    }

    #[test]
    fn ok_outcome_is_empty() {
        let outcome = CheckOutcome::from_reports(
            "sys",
            vec![CheckReport {
                kind: CheckKind::Fan,
                severity: Severity::Ok,
                counts: SeverityCounts::default(),
                extra: None,
                details: vec!["stray".into()],
            }],
        );
        assert_eq!(outcome.severity, Severity::Ok);
        assert!(outcome.counts.is_clean());
        assert_eq!(outcome.details().count(), 0);
    }

    #[test]
    fn failed_task_is_unknown() {
        assert_eq!(
            TaskResult::Failed(TaskFailure::TimedOut).severity(),
            Severity::Unknown
        );
        assert_eq!(TaskFailure::TimedOut.to_string(), "check timed out");
    }
}
