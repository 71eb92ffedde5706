//! The closed set of component checks and their static rules.

use std::fmt;
use std::str::FromStr;

use crate::error::{InspectError, InspectResult};

/// A component kind that can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    Controller,
    InternalDisk,
    VirtualDisk,
    Pool,
    Disk,
    Expander,
    Ioc,
    Channel,
    Fan,
    Power,
    Sep,
    Temperature,
    Ups,
    Voltage,
    IclChannel,
    IclIoc,
    Raid,
    HostChannel,
}

/// Static description of how one component kind is judged.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRule {
    /// Upper-case label used in reports, e.g. `DISK DRIVE`.
    pub description: &'static str,
    /// Attributes appended to detail lines to identify the object.
    pub identifiers: &'static [&'static str],
    /// `(attribute, expected value)` pairs; a mismatch raises WARNING.
    pub expectations: &'static [(&'static str, &'static str)],
    /// `(attribute, message)` pairs raised as WARNING only when the
    /// attribute is present and true.
    pub flags: &'static [(&'static str, &'static str)],
    /// Skip the child-health comparison in extended mode.
    pub ignore_child_health: bool,
}

const LOCATED: &[&str] = &["EnclosureIndex", "Position", "Location"];

const fn rule(
    description: &'static str,
    identifiers: &'static [&'static str],
    expectations: &'static [(&'static str, &'static str)],
) -> ComponentRule {
    ComponentRule {
        description,
        identifiers,
        expectations,
        flags: &[],
        ignore_child_health: false,
    }
}

impl CheckKind {
    pub const ALL: [CheckKind; 18] = [
        Self::Controller,
        Self::InternalDisk,
        Self::VirtualDisk,
        Self::Pool,
        Self::Disk,
        Self::Expander,
        Self::Ioc,
        Self::Channel,
        Self::Fan,
        Self::Power,
        Self::Sep,
        Self::Temperature,
        Self::Ups,
        Self::Voltage,
        Self::IclChannel,
        Self::IclIoc,
        Self::Raid,
        Self::HostChannel,
    ];

    /// Name accepted on the command line and in settings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::InternalDisk => "internaldisk",
            Self::VirtualDisk => "virtualdisk",
            Self::Pool => "pool",
            Self::Disk => "disk",
            Self::Expander => "expander",
            Self::Ioc => "ioc",
            Self::Channel => "channel",
            Self::Fan => "fan",
            Self::Power => "power",
            Self::Sep => "sep",
            Self::Temperature => "temperature",
            Self::Ups => "ups",
            Self::Voltage => "voltage",
            Self::IclChannel => "icl_chan",
            Self::IclIoc => "icl_ioc",
            Self::Raid => "raid",
            Self::HostChannel => "host_chan",
        }
    }

    pub fn rule(self) -> ComponentRule {
        match self {
            Self::Controller => ComponentRule {
                flags: &[("RestartPending", "Restart Pending")],
                ..rule("CONTROLLER", &["Name"], &[("State", "RUNNING")])
            },
            Self::InternalDisk => rule("INTERNAL DISK", &["EnclosureIndex", "Name"], &[]),
            Self::VirtualDisk => rule("VIRTUAL DISK", &[], &[("State", "READY")]),
            Self::Pool => rule("POOL", &[], &[("PoolState", "NORMAL")]),
            Self::Disk => rule(
                "DISK DRIVE",
                &["EnclosureIndex", "DiskSlotNumber", "SerialNumber"],
                &[("State", "READY")],
            ),
            Self::Expander => rule("EXPANDER", LOCATED, &[]),
            Self::Ioc => rule("IOC", &["ControllerIndex", "RPIndexOnController", "Slot"], &[]),
            Self::Channel => rule(
                "DISK CHANNEL",
                &["ControllerIndex", "PortLocation"],
                &[("LinkState", "UP")],
            ),
            Self::Fan => rule("FAN", LOCATED, &[]),
            Self::Power => rule("POWER SUPPLY", &["EnclosureIndex", "Location"], &[]),
            Self::Sep => rule("SEP", LOCATED, &[]),
            Self::Temperature => rule("TEMPERATURE", LOCATED, &[]),
            Self::Ups => rule("UPS", &["EnclosureIndex"], &[("WarningStatus", "NONE")]),
            Self::Voltage => rule("VOLTAGE", LOCATED, &[]),
            Self::IclChannel => rule("ICL CHANNEL", &["ControllerIndex"], &[]),
            Self::IclIoc => rule("ICL IOC", &["ControllerIndex"], &[]),
            Self::Raid => rule("RAID PROCS", &["ControllerIndex", "IndexOnController"], &[]),
            Self::HostChannel => ComponentRule {
                ignore_child_health: true,
                ..rule("HOST CHANNEL", &["ControllerIndex", "PortLocation"], &[])
            },
        }
    }

    pub fn description(self) -> &'static str {
        self.rule().description
    }

    /// Validate a list of check names. An empty list selects every check.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> InspectResult<Vec<CheckKind>> {
        if names.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            let kind: CheckKind = name.as_ref().parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    /// Comma-joined list of every check name.
    pub fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for CheckKind {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| InspectError::UnknownCheck(s.to_string()))
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in CheckKind::ALL {
            assert_eq!(kind.as_str().parse::<CheckKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_names_are_rejected_eagerly() {
        let err = CheckKind::parse_list(&["fan", "flux_capacitor", "disk"]).unwrap_err();
        assert!(matches!(err, InspectError::UnknownCheck(ref n) if n == "flux_capacitor"));
        assert!(err.to_string().contains("host_chan"));
    }

    #[test]
    fn empty_list_selects_everything() {
        let all = CheckKind::parse_list::<&str>(&[]).unwrap();
        assert_eq!(all.len(), CheckKind::ALL.len());
    }

    #[test]
    fn duplicates_are_dropped() {
        let kinds = CheckKind::parse_list(&["fan", "disk", "fan"]).unwrap();
        assert_eq!(kinds, vec![CheckKind::Fan, CheckKind::Disk]);
    }

    #[test]
    fn rules_have_descriptions() {
        assert_eq!(CheckKind::Disk.description(), "DISK DRIVE");
        assert!(CheckKind::HostChannel.rule().ignore_child_health);
        assert!(!CheckKind::Fan.rule().ignore_child_health);
    }
}
