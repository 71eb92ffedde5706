//! The four-level status scale shared by checks, reports, and the store.
//!
//! Codes match the exit-status convention of monitoring plugins:
//! `0 = OK`, `1 = WARNING`, `2 = CRITICAL`, `3 = UNKNOWN`.

use std::fmt;

/// Reportable severity of a check, a target, or a whole round.
///
/// `Ord` follows the numeric code. Combining outcomes inside a single
/// check task uses [`Severity::escalate`] instead, where CRITICAL is sticky
/// and is never replaced by a later UNKNOWN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl Severity {
    /// Numeric status code.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Parse a stored status code. Returns `None` for codes outside `0..=3`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Warning),
            2 => Some(Self::Critical),
            3 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Combine two severities observed within the same check task.
    ///
    /// WARNING only replaces OK, CRITICAL always wins, and UNKNOWN replaces
    /// everything except CRITICAL.
    pub fn escalate(self, other: Severity) -> Severity {
        match (self, other) {
            (Self::Critical, _) | (_, Self::Critical) => Self::Critical,
            (a, b) => a.max(b),
        }
    }

    /// Numeric maximum across a round. An empty round is UNKNOWN.
    pub fn worst<I>(iter: I) -> Severity
    where
        I: IntoIterator<Item = Severity>,
    {
        iter.into_iter().max().unwrap_or(Self::Unknown)
    }

    /// Cap at WARNING. Never raises a severity.
    pub fn cap_at_warning(self) -> Severity {
        self.min(Self::Warning)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of individual classifications at each non-OK level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    pub warning: u32,
    pub critical: u32,
    pub unknown: u32,
}

impl SeverityCounts {
    /// Count one classification. OK is not counted.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Ok => {}
            Severity::Warning => self.warning += 1,
            Severity::Critical => self.critical += 1,
            Severity::Unknown => self.unknown += 1,
        }
    }

    pub fn add(&mut self, other: &SeverityCounts) {
        self.warning += other.warning;
        self.critical += other.critical;
        self.unknown += other.unknown;
    }

    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Ok => 0,
            Severity::Warning => self.warning,
            Severity::Critical => self.critical,
            Severity::Unknown => self.unknown,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warning == 0 && self.critical == 0 && self.unknown == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for s in [
            Severity::Ok,
            Severity::Warning,
            Severity::Critical,
            Severity::Unknown,
        ] {
            assert_eq!(Severity::from_code(s.code()), Some(s));
        }
        assert_eq!(Severity::from_code(-1), None);
        assert_eq!(Severity::from_code(4), None);
    }

    #[test]
    fn critical_is_sticky_against_unknown() {
        assert_eq!(
            Severity::Critical.escalate(Severity::Unknown),
            Severity::Critical
        );
        assert_eq!(
            Severity::Unknown.escalate(Severity::Critical),
            Severity::Critical
        );
        assert_eq!(
            Severity::Warning.escalate(Severity::Unknown),
            Severity::Unknown
        );
        assert_eq!(Severity::Unknown.escalate(Severity::Warning), Severity::Unknown);
        assert_eq!(Severity::Ok.escalate(Severity::Warning), Severity::Warning);
    }

    #[test]
    fn worst_uses_numeric_order() {
        let worst = Severity::worst([Severity::Critical, Severity::Unknown, Severity::Ok]);
        assert_eq!(worst, Severity::Unknown);
        assert_eq!(Severity::worst([Severity::Ok, Severity::Ok]), Severity::Ok);
        assert_eq!(Severity::worst(std::iter::empty()), Severity::Unknown);
    }

    #[test]
    fn cap_at_warning_never_raises() {
        assert_eq!(Severity::Ok.cap_at_warning(), Severity::Ok);
        assert_eq!(Severity::Warning.cap_at_warning(), Severity::Warning);
        assert_eq!(Severity::Critical.cap_at_warning(), Severity::Warning);
        assert_eq!(Severity::Unknown.cap_at_warning(), Severity::Warning);
        // Idempotent.
        assert_eq!(
            Severity::Unknown.cap_at_warning().cap_at_warning(),
            Severity::Warning
        );
    }

    #[test]
    fn counts_track_non_ok_only() {
        let mut counts = SeverityCounts::default();
        counts.record(Severity::Ok);
        assert!(counts.is_clean());

        counts.record(Severity::Critical);
        counts.record(Severity::Warning);
        counts.record(Severity::Warning);
        assert_eq!(counts.get(Severity::Critical), 1);
        assert_eq!(counts.get(Severity::Warning), 2);

        let mut total = SeverityCounts::default();
        total.add(&counts);
        total.add(&counts);
        assert_eq!(total.warning, 4);
        assert_eq!(total.unknown, 0);
    }
}
