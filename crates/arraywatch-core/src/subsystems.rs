//! Subsystem list parser.
//!
//! One record per line:
//!
//! ```text
//! # key : controllers : production : user,password
//! 1 : ctl1a,ctl1b : 1
//! 2 : ctl2a,ctl2b : 0 : admin,secret   # lab unit
//! ```
//!
//! Blank lines and `#` comment lines are ignored, and trailing `#`
//! comments are stripped. Records whose controller field contains
//! whitespace or empty comma segments are skipped with a warning.

use std::path::Path;

use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Credentials, Subsystem};

/// Read and parse a subsystem list from disk.
pub fn load(path: &Path) -> ConfigResult<Vec<Subsystem>> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse subsystem records from a string.
pub fn parse(content: &str) -> ConfigResult<Vec<Subsystem>> {
    let mut subsystems = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw.split_once('#') {
            Some((before, _)) => before,
            None => raw,
        };
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 3 {
            return Err(ConfigError::Parse {
                line: line_no,
                reason: format!("expected at least 3 ':'-separated fields, found {}", fields.len()),
            });
        }

        let key = fields[0].trim();
        let controllers = fields[1].trim();
        let production = fields[2]
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::Parse {
                line: line_no,
                reason: format!("invalid production flag {:?}: {e}", fields[2].trim()),
            })?
            == 1;

        if !valid_controller_field(controllers) {
            warn!(line = line_no, %controllers, "bad controller pair, skipping record");
            continue;
        }

        let credentials = fields
            .get(3)
            .and_then(|auth| auth.trim().split_once(','))
            .map(|(user, pass)| Credentials::new(user.trim(), pass.trim()))
            .unwrap_or_default();

        subsystems.push(Subsystem::new(key, controllers, production).with_credentials(credentials));
    }

    Ok(subsystems)
}

fn valid_controller_field(controllers: &str) -> bool {
    !controllers.is_empty()
        && !controllers.chars().any(char::is_whitespace)
        && !controllers.contains(",,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_and_skips_comments() {
        let content = "\
# full-line comment
   # indented comment

1 : ctl1a,ctl1b : 1
2 : ctl2a : 0 : admin,secret   # lab unit
";
        let subs = parse(content).unwrap();
        assert_eq!(subs.len(), 2);

        assert_eq!(subs[0].key, "1");
        assert_eq!(subs[0].controllers, vec!["ctl1a", "ctl1b"]);
        assert!(subs[0].production);
        assert_eq!(subs[0].credentials, Credentials::default());

        assert_eq!(subs[1].label(), "ctl2a");
        assert!(!subs[1].production);
        assert_eq!(subs[1].credentials, Credentials::new("admin", "secret"));
    }

    #[test]
    fn credentials_without_comma_fall_back_to_default() {
        let subs = parse("1:ctl:1:adminonly\n").unwrap();
        assert_eq!(subs[0].credentials, Credentials::default());
    }

    #[test]
    fn bad_controller_pairs_are_skipped() {
        let content = "1 : ctl1a,,ctl1b : 1\n2 : ctl 2 : 1\n3 : ok-ctl : 1\n";
        let subs = parse(content).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].key, "3");
    }

    #[test]
    fn non_integer_production_flag_is_an_error() {
        let err = parse("1 : ctl : yes\n").unwrap_err();
        match err {
            ConfigError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_record_is_an_error() {
        assert!(matches!(
            parse("\n\n1 : ctl\n"),
            Err(ConfigError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arraywatch.conf");
        std::fs::write(&path, "7 : a,b : 1\n").unwrap();
        let subs = load(&path).unwrap();
        assert_eq!(subs[0].label(), "a,b");
    }
}
