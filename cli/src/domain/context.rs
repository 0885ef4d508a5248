//! Docker context types and SSH endpoint helpers.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use crate::domain::error::ProvisionError;

/// Default SSH port used in context endpoints.
pub const DEFAULT_SSH_PORT: u16 = 22;

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static CONTEXT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.+-]*$").expect("valid context name regex")
});

/// A Docker context as reported by `docker context ls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerContext {
    /// Context name.
    pub name: String,
    /// Docker endpoint, e.g. `ssh://ubuntu@1.2.3.4:22` or `unix:///var/run/docker.sock`.
    pub host: String,
}

impl DockerContext {
    /// Host part of the endpoint when it is an SSH endpoint.
    #[must_use]
    pub fn ssh_host(&self) -> Option<String> {
        SshTarget::parse(&self.host).map(|t| t.host)
    }
}

/// Build the SSH endpoint a context points at.
#[must_use]
pub fn ssh_endpoint(user: &str, host: &str, port: u16) -> String {
    format!("ssh://{user}@{host}:{port}")
}

/// The parts of an `ssh://[user@]host[:port]` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl SshTarget {
    /// Parse an SSH endpoint. Returns `None` for non-SSH endpoints.
    #[must_use]
    pub fn parse(endpoint: &str) -> Option<Self> {
        let rest = endpoint.strip_prefix("ssh://")?;
        let (user, host_port) = match rest.rsplit_once('@') {
            Some((user, host_port)) => (Some(user.to_string()), host_port),
            None => (None, rest),
        };
        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (host, port.parse().ok()),
            None => (host_port, None),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self {
            user,
            host: host.to_string(),
            port,
        })
    }
}

/// Validate a machine/context name.
///
/// Names share Docker's context name grammar. This also guarantees they never
/// contain `@` or `/`, which keeps marker file names parseable.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidName`] if the name does not match.
pub fn validate_context_name(name: &str) -> Result<()> {
    if !CONTEXT_NAME.is_match(name) {
        return Err(ProvisionError::InvalidName(name.to_string()).into());
    }
    Ok(())
}
