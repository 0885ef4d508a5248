//! JSON output.
//!
//! Every `--json` code path prints exactly one pretty-printed JSON document to
//! stdout. Failures print the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::application::services::notebook::NotebookSession;
use crate::application::services::provision::Provisioned;
use crate::application::services::terminate::TerminateOutcome;
use crate::domain::config::DevMachineConfig;
use crate::domain::instance::InstanceSummary;
use crate::domain::marker::Marker;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders results as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization")?
        );
        Ok(())
    }

    pub fn render_version(&self, version: &str) -> Result<()> {
        Self::print(&json!({ "version": version }))
    }

    pub fn render_instances(&self, instances: &[InstanceSummary]) -> Result<()> {
        Self::print(&json!({ "instances": instances }))
    }

    pub fn render_provisioned(&self, provisioned: &Provisioned) -> Result<()> {
        Self::print(&json!({
            "instance": provisioned.instance,
            "context": provisioned.marker.name,
            "marker": provisioned.marker_path,
        }))
    }

    pub fn render_notebook(&self, session: &NotebookSession) -> Result<()> {
        Self::print(&json!({
            "instance": session.instance,
            "context": session.marker.name,
            "container_id": session.container_id,
            "image": session.image,
            "url": session.url,
            "token": session.token,
            "tunnel_command": session.tunnel_command,
            "tunnel_open": session.tunnel_open,
        }))
    }

    pub fn render_cleaned(&self, cleaned: &[Marker]) -> Result<()> {
        Self::print(&json!({ "cleaned": cleaned }))
    }

    pub fn render_terminated(&self, outcome: &TerminateOutcome) -> Result<()> {
        let value = match outcome {
            TerminateOutcome::NotFound => json!({ "terminated": false }),
            TerminateOutcome::Terminated {
                instance_id,
                public_ip,
                context,
                markers_removed,
            } => json!({
                "terminated": true,
                "instance_id": instance_id,
                "public_ip": public_ip,
                "context": context,
                "markers_removed": markers_removed,
            }),
        };
        Self::print(&value)
    }

    pub fn render_tunnel(&self, name: &str, command: &str) -> Result<()> {
        Self::print(&json!({ "name": name, "tunnel_command": command }))
    }

    pub fn render_config(&self, config: &DevMachineConfig, path: &Path) -> Result<()> {
        Self::print(&json!({ "path": path, "config": config }))
    }

    pub fn render_key_created(&self, key_name: &str, path: &Path) -> Result<()> {
        Self::print(&json!({ "key_name": key_name, "path": path }))
    }

    pub fn render_written(&self, path: &Path) -> Result<()> {
        Self::print(&json!({ "written": path }))
    }
}
