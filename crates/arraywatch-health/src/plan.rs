//! The validated set of checks to run against every target.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use arraywatch_core::Target;

use crate::catalog::CheckKind;
use crate::check::{CheckOptions, ComponentCheck};
use crate::error::InspectResult;
use crate::inspect::{Inspector, Session};
use crate::outcome::{CheckOutcome, CheckReport, TaskFailure, TaskResult};

/// Checks to run, built once per process and shared by every task.
pub struct CheckPlan {
    handlers: Vec<Box<dyn ComponentCheck>>,
    options: CheckOptions,
}

impl CheckPlan {
    pub fn new(kinds: &[CheckKind], options: CheckOptions) -> Self {
        Self {
            handlers: kinds.iter().map(|k| k.handler()).collect(),
            options,
        }
    }

    /// Build a plan from check names. An empty list selects every check;
    /// any unrecognized name fails the whole plan.
    pub fn from_names<S: AsRef<str>>(names: &[S], options: CheckOptions) -> InspectResult<Self> {
        let kinds = CheckKind::parse_list(names)?;
        Ok(Self::new(&kinds, options))
    }

    pub fn kinds(&self) -> Vec<CheckKind> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Connect to `target` and run every check in order.
    ///
    /// Blocking: call from a blocking-capable context.
    pub fn run_checks(&self, inspector: &dyn Inspector, target: &Target) -> TaskResult {
        let mut session = match inspector.connect(target) {
            Ok(session) => session,
            Err(e) => {
                warn!(target = %target.label, address = %target.address, error = %e, "inspection connect failed");
                return TaskResult::Failed(TaskFailure::Connect(e.to_string()));
            }
        };

        let system_name = session.system_name();
        let reports = self
            .handlers
            .iter()
            .map(|handler| self.run_one(handler.as_ref(), session.as_mut(), target))
            .collect();

        let outcome = CheckOutcome::from_reports(system_name, reports);
        debug!(
            target = %target.label,
            system = %outcome.system_name,
            severity = %outcome.severity,
            "target checked"
        );
        TaskResult::Checked(outcome)
    }

    fn run_one(
        &self,
        handler: &dyn ComponentCheck,
        session: &mut dyn Session,
        target: &Target,
    ) -> CheckReport {
        let kind = handler.kind();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.run(session, &self.options))) {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(target = %target.label, check = %kind, error = %e, "check failed");
                CheckReport::internal_failure(kind)
            }
            Err(_) => {
                warn!(target = %target.label, check = %kind, "check panicked");
                CheckReport::internal_failure(kind)
            }
        }
    }
}

impl std::fmt::Debug for CheckPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckPlan")
            .field("kinds", &self.kinds())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use arraywatch_core::{Credentials, Severity};

    use super::*;
    use crate::error::InspectError;
    use crate::inspect::InspectedObject;

    struct Scripted;

    struct ScriptedSession;

    impl Inspector for Scripted {
        fn connect(&self, target: &Target) -> InspectResult<Box<dyn Session>> {
            if target.controller == "down" {
                return Err(InspectError::Connect {
                    endpoint: target.address.to_string(),
                    reason: "refused".into(),
                });
            }
            Ok(Box::new(ScriptedSession))
        }
    }

    impl Session for ScriptedSession {
        fn system_name(&self) -> String {
            "sys-1".into()
        }

        fn list_objects(&mut self, kind: CheckKind) -> InspectResult<Vec<InspectedObject>> {
            match kind {
                CheckKind::Fan => panic!("driver bug"),
                CheckKind::Pool => Err(InspectError::Query {
                    kind: kind.to_string(),
                    reason: "timeout".into(),
                }),
                CheckKind::Disk => Ok(vec![InspectedObject::new(0)
                    .with("HealthState", "CRITICAL")
                    .with("State", "READY")]),
                _ => Ok(vec![InspectedObject::new(0).with("HealthState", "OK")]),
            }
        }
    }

    fn target(controller: &str) -> Target {
        Target {
            label: controller.into(),
            controller: controller.into(),
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            production: true,
            credentials: Credentials::default(),
        }
    }

    #[test]
    fn from_names_rejects_unknown_checks() {
        let err = CheckPlan::from_names(&["fan", "bogus"], CheckOptions::default()).unwrap_err();
        assert!(matches!(err, InspectError::UnknownCheck(_)));
    }

    #[test]
    fn empty_names_select_everything() {
        let plan = CheckPlan::from_names::<&str>(&[], CheckOptions::default()).unwrap();
        assert_eq!(plan.kinds(), CheckKind::ALL.to_vec());
    }

    #[test]
    fn connect_failure_is_a_task_failure() {
        let plan = CheckPlan::new(&[CheckKind::Ioc], CheckOptions::default());
        let result = plan.run_checks(&Scripted, &target("down"));
        assert!(matches!(result, TaskResult::Failed(TaskFailure::Connect(_))));
    }

    #[test]
    fn panicking_check_is_isolated() {
        let plan = CheckPlan::new(&[CheckKind::Fan, CheckKind::Ioc], CheckOptions::default());
        let TaskResult::Checked(outcome) = plan.run_checks(&Scripted, &target("up")) else {
            panic!("expected a checked outcome");
        };
        assert_eq!(outcome.system_name, "sys-1");
        assert_eq!(outcome.severity, Severity::Unknown);
        assert_eq!(outcome.checks.len(), 2);
        assert_eq!(outcome.checks[1].severity, Severity::Ok);
    }

    #[test]
    fn failing_check_does_not_mask_critical() {
        let plan = CheckPlan::new(&[CheckKind::Disk, CheckKind::Pool], CheckOptions::default());
        let result = plan.run_checks(&Scripted, &target("up"));
        assert_eq!(result.severity(), Severity::Critical);
    }
}
