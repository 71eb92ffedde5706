//! Turning task results into reportable messages.
//!
//! Production policy is applied here: a non-production target never
//! reports worse than WARNING. Task failures are exempt and always report
//! UNKNOWN, since nothing was inspected.

use arraywatch_core::{OutputMode, Severity, SeverityCounts};

use crate::outcome::{CheckOutcome, CheckReport, TaskResult};

/// Message published for every OK target.
pub const ALL_CHECKS_OK: &str = "All Checks OK";

const SUMMARY_ORDER: [Severity; 3] = [Severity::Critical, Severity::Unknown, Severity::Warning];

/// Final per-target report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Subsystem identity (comma-joined controller names).
    pub label: String,
    pub severity: Severity,
    pub message: String,
}

impl Report {
    /// The single report of a round where no target resolved.
    pub fn no_valid_hosts() -> Self {
        Self {
            label: "None".into(),
            severity: Severity::Unknown,
            message: "No valid hosts to check".into(),
        }
    }

    /// Controller names this report is published under.
    pub fn controllers(&self) -> impl Iterator<Item = &str> {
        self.label.split(',').filter(|c| !c.is_empty())
    }
}

/// Apply production policy to a task result and render its message.
pub fn aggregate(label: &str, result: &TaskResult, production: bool, mode: OutputMode) -> Report {
    let outcome = match result {
        TaskResult::Failed(failure) => {
            return Report {
                label: label.to_string(),
                severity: Severity::Unknown,
                message: format!("{label}: UNKNOWN: {failure}"),
            };
        }
        TaskResult::Checked(outcome) => outcome,
    };

    let severity = if production {
        outcome.severity
    } else {
        outcome.severity.cap_at_warning()
    };

    let message = if severity == Severity::Ok {
        ALL_CHECKS_OK.to_string()
    } else {
        match mode {
            OutputMode::Compact => render_compact(outcome, production),
            OutputMode::Extended => render_extended(outcome, production),
        }
    };

    Report {
        label: label.to_string(),
        severity,
        message,
    }
}

/// Numeric worst severity across a round. An empty round is UNKNOWN.
pub fn overall_severity(reports: &[Report]) -> Severity {
    Severity::worst(reports.iter().map(|r| r.severity))
}

/// `"2 Checks CRITICAL, 1 Check WARNING"`, ordered CRITICAL, UNKNOWN, WARNING.
fn summarize(counts: &SeverityCounts) -> String {
    SUMMARY_ORDER
        .iter()
        .filter_map(|&severity| match counts.get(severity) {
            0 => None,
            1 => Some(format!("1 Check {severity}")),
            n => Some(format!("{n} Checks {severity}")),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_lines(check: &CheckReport) -> impl Iterator<Item = String> + '_ {
    let mut head = format!("{}: {}", check.kind.description(), summarize(&check.counts));
    if let Some(extra) = &check.extra {
        head.push_str(" - ");
        head.push_str(extra);
    }
    std::iter::once(head).chain(check.details.iter().cloned())
}

fn failing_checks(outcome: &CheckOutcome) -> impl Iterator<Item = &CheckReport> {
    outcome.checks.iter().filter(|c| c.severity != Severity::Ok)
}

fn render_compact(outcome: &CheckOutcome, production: bool) -> String {
    let mut parts = vec![summarize(&outcome.counts)];
    parts.extend(failing_checks(outcome).flat_map(check_lines));
    let body = parts.join(" ;; ");
    if production {
        body
    } else {
        format!("NON-PROD - {body}")
    }
}

fn render_extended(outcome: &CheckOutcome, production: bool) -> String {
    let mut message = String::new();
    if !production {
        message.push_str(&format!("{} is NON-PRODUCTION\n", outcome.system_name));
    }
    message.push_str(&format!(
        "\n{} Check Summary:\n-------------------------",
        outcome.system_name
    ));
    message.push('\n');
    message.push_str(&summarize(&outcome.counts));
    for line in failing_checks(outcome).flat_map(check_lines) {
        message.push('\n');
        message.push_str(&line);
    }
    message
}
