//! Component checks.
//!
//! Every check kind is judged the same way:
//!
//! 1. The primary indicator `HealthState` is read for each object.
//!    `NON_CRITICAL` raises WARNING, `CRITICAL` raises CRITICAL, and any
//!    other value (or none) raises UNKNOWN.
//! 2. Each expectation from the kind's [`ComponentRule`] is compared
//!    independently; a mismatch raises WARNING and adds a detail line.
//!    Flags are looser: they only fire when the attribute is present and
//!    true, so a component that does not report one stays clean.
//! 3. In extended mode a non-OK `ChildHealthState` raises WARNING.
//!
//! Severities combine with [`Severity::escalate`]: CRITICAL is sticky.

use tracing::debug;

use arraywatch_core::{OutputMode, Severity, SeverityCounts};

use crate::catalog::{CheckKind, ComponentRule};
use crate::error::InspectResult;
use crate::inspect::{AttrValue, InspectedObject, Session};
use crate::outcome::CheckReport;

const HEALTH_STATE: &str = "HealthState";
const CHILD_HEALTH_STATE: &str = "ChildHealthState";

/// Output options shared by every check in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    pub mode: OutputMode,
    /// Detail lines kept per check in compact mode.
    pub detail_budget: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::Compact,
            detail_budget: 2,
        }
    }
}

/// One component check. Implementations must not mutate external state.
pub trait ComponentCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    fn run(&self, session: &mut dyn Session, options: &CheckOptions) -> InspectResult<CheckReport>;
}

/// Accumulates classifications for one check.
#[derive(Debug)]
struct Classifier {
    severity: Severity,
    counts: SeverityCounts,
    details: Vec<String>,
    room: Option<usize>,
    extra: Option<String>,
}

impl Classifier {
    fn new(options: &CheckOptions) -> Self {
        Self {
            severity: Severity::Ok,
            counts: SeverityCounts::default(),
            details: Vec::new(),
            room: options.mode.is_compact().then_some(options.detail_budget),
            extra: None,
        }
    }

    fn raise(&mut self, severity: Severity) {
        self.severity = self.severity.escalate(severity);
        self.counts.record(severity);
    }

    fn detail(&mut self, line: String) {
        match &mut self.room {
            Some(0) => {}
            Some(room) => {
                *room -= 1;
                self.details.push(line);
            }
            None => self.details.push(line),
        }
    }

    fn finish(self, kind: CheckKind) -> CheckReport {
        CheckReport {
            kind,
            severity: self.severity,
            counts: self.counts,
            extra: self.extra,
            details: self.details,
        }
    }
}

/// The generic health-state check, driven by a [`ComponentRule`].
#[derive(Debug, Clone, Copy)]
pub struct HealthStateCheck {
    kind: CheckKind,
    rule: ComponentRule,
}

impl HealthStateCheck {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            rule: kind.rule(),
        }
    }

    fn classify(&self, object: &InspectedObject, options: &CheckOptions, acc: &mut Classifier) {
        let health = object.display(HEALTH_STATE);
        match health.as_str() {
            "OK" => {}
            "NON_CRITICAL" => acc.raise(Severity::Warning),
            "CRITICAL" => acc.raise(Severity::Critical),
            _ => acc.raise(Severity::Unknown),
        }

        let mut messages = Vec::new();
        for (attribute, expected) in self.rule.expectations {
            let actual = object.display(attribute);
            if actual != *expected {
                messages.push(format!("{attribute}: {actual}"));
                acc.raise(Severity::Warning);
            }
        }

        for (attribute, message) in self.rule.flags {
            if object.get(attribute).is_some_and(AttrValue::is_true) {
                messages.push((*message).to_string());
                acc.raise(Severity::Warning);
            }
        }

        if options.mode == OutputMode::Extended && !self.rule.ignore_child_health {
            if let Some(child) = object.get(CHILD_HEALTH_STATE) {
                let child = child.to_string();
                if child != "OK" {
                    messages.push(format!("Child Health: {child}"));
                    acc.raise(Severity::Warning);
                }
            }
        }

        if acc.extra.is_none() {
            acc.extra = messages.first().cloned();
        }

        if health != "OK" || !messages.is_empty() {
            let identifiers: String = self
                .rule
                .identifiers
                .iter()
                .map(|id| format!(" {id}: {}", object.display(id)))
                .collect();
            let mut line = format!(
                "{} Health: {health}{identifiers} Index: {}",
                self.rule.description, object.index
            );
            if !messages.is_empty() {
                line.push_str("; ");
                line.push_str(&messages.join("; "));
            }
            acc.detail(line);
        }
    }
}

impl ComponentCheck for HealthStateCheck {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    fn run(&self, session: &mut dyn Session, options: &CheckOptions) -> InspectResult<CheckReport> {
        let objects = session.list_objects(self.kind)?;
        let mut acc = Classifier::new(options);
        for object in &objects {
            self.classify(object, options, &mut acc);
        }
        debug!(
            check = %self.kind,
            objects = objects.len(),
            severity = %acc.severity,
            "check finished"
        );
        Ok(acc.finish(self.kind))
    }
}

impl CheckKind {
    /// The handler that implements this check.
    pub fn handler(self) -> Box<dyn ComponentCheck> {
        Box::new(HealthStateCheck::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectError;

    struct Fixed(Vec<InspectedObject>);

    impl Session for Fixed {
        fn system_name(&self) -> String {
            "test-sys".into()
        }

        fn list_objects(&mut self, _kind: CheckKind) -> InspectResult<Vec<InspectedObject>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Session for Broken {
        fn system_name(&self) -> String {
            "broken".into()
        }

        fn list_objects(&mut self, kind: CheckKind) -> InspectResult<Vec<InspectedObject>> {
            Err(InspectError::Query {
                kind: kind.to_string(),
                reason: "boom".into(),
            })
        }
    }

    fn disk(index: u32, health: &str, state: &str) -> InspectedObject {
        InspectedObject::new(index)
            .with("HealthState", health)
            .with("State", state)
            .with("EnclosureIndex", 1i64)
            .with("DiskSlotNumber", index as i64)
            .with("SerialNumber", "SN")
    }

    fn run(kind: CheckKind, objects: Vec<InspectedObject>, options: CheckOptions) -> CheckReport {
        HealthStateCheck::new(kind)
            .run(&mut Fixed(objects), &options)
            .unwrap()
    }

    #[test]
    fn healthy_objects_report_ok() {
        let report = run(
            CheckKind::Disk,
            vec![disk(0, "OK", "READY"), disk(1, "OK", "READY")],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Ok);
        assert!(report.counts.is_clean());
        assert!(report.details.is_empty());
        assert!(report.extra.is_none());
    }

    #[test]
    fn soft_and_hard_degradation() {
        let report = run(
            CheckKind::Fan,
            vec![
                InspectedObject::new(0).with("HealthState", "NON_CRITICAL"),
                InspectedObject::new(1).with("HealthState", "CRITICAL"),
            ],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Critical);
        assert_eq!(report.counts.warning, 1);
        assert_eq!(report.counts.critical, 1);
    }

    #[test]
    fn unknown_never_downgrades_critical() {
        let report = run(
            CheckKind::Fan,
            vec![
                InspectedObject::new(0).with("HealthState", "CRITICAL"),
                InspectedObject::new(1).with("HealthState", "NA"),
                InspectedObject::new(2),
            ],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Critical);
        assert_eq!(report.counts.unknown, 2);
    }

    #[test]
    fn unrecognized_health_is_unknown() {
        let report = run(
            CheckKind::Fan,
            vec![InspectedObject::new(0).with("HealthState", "NA")],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Unknown);
    }

    #[test]
    fn expectation_mismatch_is_warning_even_when_healthy() {
        let report = run(
            CheckKind::Disk,
            vec![disk(4, "OK", "STOPPED")],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Warning);
        assert_eq!(report.extra.as_deref(), Some("State: STOPPED"));
        assert_eq!(
            report.details,
            vec![
                "DISK DRIVE Health: OK EnclosureIndex: 1 DiskSlotNumber: 4 SerialNumber: SN Index: 4; State: STOPPED"
            ]
        );
    }

    #[test]
    fn expectation_mismatch_never_exceeds_warning() {
        let report = run(
            CheckKind::Controller,
            vec![InspectedObject::new(0)
                .with("HealthState", "OK")
                .with("State", "OFFLINE")
                .with("RestartPending", true)],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Warning);
        assert_eq!(report.counts.warning, 2);
    }

    #[test]
    fn controller_without_restart_pending_is_clean() {
        let report = run(
            CheckKind::Controller,
            vec![InspectedObject::new(0)
                .with("HealthState", "OK")
                .with("State", "RUNNING")
                .with("Name", "c0")],
            CheckOptions::default(),
        );
        assert_eq!(report.severity, Severity::Ok);
        assert!(report.details.is_empty());
    }

    #[test]
    fn restart_pending_is_flagged_only_when_true() {
        let controller = |pending: bool| {
            InspectedObject::new(0)
                .with("HealthState", "OK")
                .with("State", "RUNNING")
                .with("Name", "c0")
                .with("RestartPending", pending)
        };

        let idle = run(CheckKind::Controller, vec![controller(false)], CheckOptions::default());
        assert_eq!(idle.severity, Severity::Ok);

        let pending = run(CheckKind::Controller, vec![controller(true)], CheckOptions::default());
        assert_eq!(pending.severity, Severity::Warning);
        assert_eq!(
            pending.details,
            vec!["CONTROLLER Health: OK Name: c0 Index: 0; Restart Pending"]
        );
    }

    #[test]
    fn compact_mode_caps_detail_lines() {
        let objects: Vec<_> = (0..5).map(|i| disk(i, "CRITICAL", "READY")).collect();

        let compact = run(CheckKind::Disk, objects.clone(), CheckOptions::default());
        assert_eq!(compact.details.len(), 2);
        assert_eq!(compact.counts.critical, 5);

        let extended = run(
            CheckKind::Disk,
            objects,
            CheckOptions {
                mode: OutputMode::Extended,
                detail_budget: 2,
            },
        );
        assert_eq!(extended.details.len(), 5);
    }

    #[test]
    fn child_health_only_in_extended_mode() {
        let objects = vec![InspectedObject::new(0)
            .with("HealthState", "OK")
            .with("ChildHealthState", "NON_CRITICAL")];

        let compact = run(CheckKind::Fan, objects.clone(), CheckOptions::default());
        assert_eq!(compact.severity, Severity::Ok);

        let extended = run(
            CheckKind::Fan,
            objects.clone(),
            CheckOptions {
                mode: OutputMode::Extended,
                detail_budget: 2,
            },
        );
        assert_eq!(extended.severity, Severity::Warning);
        assert!(extended.details[0].ends_with("Child Health: NON_CRITICAL"));

        let host_chan = run(
            CheckKind::HostChannel,
            objects,
            CheckOptions {
                mode: OutputMode::Extended,
                detail_budget: 2,
            },
        );
        assert_eq!(host_chan.severity, Severity::Ok);
    }

    #[test]
    fn query_errors_propagate() {
        let result = CheckKind::Fan
            .handler()
            .run(&mut Broken, &CheckOptions::default());
        assert!(matches!(result, Err(InspectError::Query { .. })));
    }
}
