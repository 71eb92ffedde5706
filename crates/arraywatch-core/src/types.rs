//! Domain types shared across the workspace.

use std::fmt;
use std::net::IpAddr;

/// Username/password pair handed to the inspection endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("user", "user")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One configured hardware subsystem.
///
/// A subsystem is reached through one or two redundant controllers. The
/// comma-joined controller list is the subsystem's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsystem {
    /// Free-form record key from the subsystem list.
    pub key: String,
    /// Controller host names, in preference order.
    pub controllers: Vec<String>,
    /// Non-production subsystems never report worse than WARNING.
    pub production: bool,
    pub credentials: Credentials,
}

impl Subsystem {
    /// Build a subsystem from a comma-joined controller string.
    pub fn new(key: impl Into<String>, controllers: &str, production: bool) -> Self {
        Self {
            key: key.into(),
            controllers: split_controllers(controllers),
            production,
            credentials: Credentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Comma-joined controller names, used as the subsystem identity.
    pub fn label(&self) -> String {
        self.controllers.join(",")
    }
}

/// Split a comma-joined controller string, dropping empty segments.
pub fn split_controllers(controllers: &str) -> Vec<String> {
    controllers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A subsystem with one controller resolved to an address, ready to poll.
///
/// Created at the start of each round and dropped when the round ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Subsystem identity (comma-joined controller names).
    pub label: String,
    /// Controller that resolved.
    pub controller: String,
    pub address: IpAddr,
    pub production: bool,
    pub credentials: Credentials,
}

/// How much detail reports carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Single-line output with a bounded number of detail lines per check.
    #[default]
    Compact,
    /// Multi-line console output with every detail line.
    Extended,
}

impl OutputMode {
    pub fn is_compact(self) -> bool {
        self == Self::Compact
    }
}

/// Shorten a controller host name to its first label.
///
/// Dotted-quad addresses are returned unchanged.
pub fn short_controller_name(name: &str) -> &str {
    if name.parse::<std::net::Ipv4Addr>().is_ok() {
        return name;
    }
    name.split('.').next().unwrap_or(name)
}
