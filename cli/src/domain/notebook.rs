//! Notebook server types: image references, token parsing, and tunnels.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::Serialize;

use crate::domain::error::NotebookError;

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?token=([a-f0-9]+)").expect("valid token regex"));

/// A container image reference split into repository name and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    /// Parse `name[:tag]`. A missing tag means `latest`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidImage`] for empty names or tags.
    pub fn parse(reference: &str) -> Result<Self> {
        let (name, tag) = reference.split_once(':').unwrap_or((reference, "latest"));
        if name.is_empty() || tag.is_empty() || tag.contains(':') {
            return Err(NotebookError::InvalidImage(reference.to_string()).into());
        }
        Ok(Self {
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Fully qualified reference inside `registry`.
    #[must_use]
    pub fn qualified(&self, registry: &str) -> String {
        format!("{registry}/{}:{}", self.name, self.tag)
    }
}

/// Private ECR registry host for an account and region.
#[must_use]
pub fn ecr_registry(account: &str, region: &str) -> String {
    format!("{account}.dkr.ecr.{region}.amazonaws.com")
}

/// Extract the access token the notebook server prints on startup.
#[must_use]
pub fn extract_token(logs: &str) -> Option<String> {
    TOKEN
        .captures(logs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Ports published by the notebook container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotebookPorts {
    pub jupyter: u16,
    pub dask: u16,
}

impl Default for NotebookPorts {
    fn default() -> Self {
        Self {
            jupyter: 8888,
            dask: 8889,
        }
    }
}

/// Local URL of the notebook server, including the token.
#[must_use]
pub fn notebook_url(port: u16, token: &str) -> String {
    format!("http://localhost:{port}/?token={token}")
}

/// Command line the notebook container runs.
#[must_use]
pub fn jupyter_command(port: u16) -> Vec<String> {
    vec![
        "jupyter-lab".to_string(),
        "--port".to_string(),
        port.to_string(),
        "--no-browser".to_string(),
        "--ip=0.0.0.0".to_string(),
        "--allow-root".to_string(),
    ]
}

/// An SSH port-forward from localhost to the same ports on a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSpec {
    pub user: String,
    pub host: String,
    pub ports: NotebookPorts,
}

impl TunnelSpec {
    /// `ssh` arguments opening the forward in the background.
    #[must_use]
    pub fn ssh_args(&self) -> Vec<String> {
        let forward = |p: u16| format!("{p}:localhost:{p}");
        vec![
            "-f".to_string(),
            "-N".to_string(),
            "-L".to_string(),
            forward(self.ports.jupyter),
            "-L".to_string(),
            forward(self.ports.dask),
            format!("{}@{}", self.user, self.host),
        ]
    }

    /// Reconnect command the user can paste into a shell.
    #[must_use]
    pub fn command(&self) -> String {
        format!("ssh {}", self.ssh_args().join(" "))
    }
}
