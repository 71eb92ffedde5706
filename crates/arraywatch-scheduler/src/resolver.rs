//! Controller name resolution.
//!
//! Names are resolved through a two-step chain:
//! 1. **Static table**: injected `HashMap<String, Vec<IpAddr>>`
//! 2. **System DNS**: `tokio::net::lookup_host`, when enabled
//!
//! Address literals resolve to themselves. A subsystem resolves to the
//! first of its controllers that yields an address.

use std::collections::HashMap;
use std::net::IpAddr;

use tracing::{debug, warn};

use arraywatch_core::{Subsystem, Target};

use crate::error::{SchedulerError, SchedulerResult};

#[derive(Debug, Clone)]
pub struct HostResolver {
    static_hosts: HashMap<String, Vec<IpAddr>>,
    system_fallback: bool,
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::system()
    }
}

impl HostResolver {
    /// Resolver that only consults the system resolver.
    pub fn system() -> Self {
        Self {
            static_hosts: HashMap::new(),
            system_fallback: true,
        }
    }

    /// Resolver restricted to the given table.
    pub fn with_static(static_hosts: HashMap<String, Vec<IpAddr>>) -> Self {
        Self {
            static_hosts,
            system_fallback: false,
        }
    }

    pub fn add_host(&mut self, name: impl Into<String>, addrs: Vec<IpAddr>) {
        self.static_hosts.insert(name.into().to_lowercase(), addrs);
    }

    /// Resolve one name to its first address.
    pub async fn resolve(&self, name: &str) -> SchedulerResult<IpAddr> {
        if let Ok(addr) = name.parse::<IpAddr>() {
            return Ok(addr);
        }

        if let Some(addr) = self
            .static_hosts
            .get(&name.to_lowercase())
            .and_then(|addrs| addrs.first())
        {
            debug!(name, %addr, "resolved from static table");
            return Ok(*addr);
        }

        if !self.system_fallback {
            return Err(SchedulerError::NoAddresses(name.to_string()));
        }

        let mut addrs = tokio::net::lookup_host((name, 0))
            .await
            .map_err(|source| SchedulerError::Resolve {
                name: name.to_string(),
                source,
            })?;
        let addr = addrs
            .next()
            .map(|sock| sock.ip())
            .ok_or_else(|| SchedulerError::NoAddresses(name.to_string()))?;
        debug!(name, %addr, "resolved via system DNS");
        Ok(addr)
    }

    /// Resolve a subsystem to a target using its first reachable controller.
    ///
    /// Returns `None` when no controller resolves.
    pub async fn resolve_target(&self, subsystem: &Subsystem) -> Option<Target> {
        for controller in &subsystem.controllers {
            match self.resolve(controller).await {
                Ok(address) => {
                    return Some(Target {
                        label: subsystem.label(),
                        controller: controller.clone(),
                        address,
                        production: subsystem.production,
                        credentials: subsystem.credentials.clone(),
                    });
                }
                Err(e) => warn!(controller = %controller, error = %e, "controller did not resolve"),
            }
        }
        warn!(subsystem = %subsystem.label(), "no controller resolved; skipping subsystem");
        None
    }
}
