//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::notebook::NotebookSession;
use crate::application::services::provision::Provisioned;
use crate::application::services::terminate::TerminateOutcome;
use crate::domain::config::DevMachineConfig;
use crate::domain::instance::{InstanceState, InstanceSummary, TAG_PROJECT, TAG_USER};
use crate::domain::marker::Marker;
use crate::output::OutputContext;

const NOT_SET: &str = "(not set)";

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("dev-machine v{version}"));
    }

    fn styled_state(&self, state: InstanceState) -> String {
        let style = match state {
            InstanceState::Running => self.ctx.styles.running,
            InstanceState::Pending => self.ctx.styles.warning,
            InstanceState::Unknown => self.ctx.styles.dim,
            _ => self.ctx.styles.stopped,
        };
        state.as_str().style(style).to_string()
    }

    /// Render every instance as a block of key/value lines.
    pub fn render_instances(&self, instances: &[InstanceSummary]) {
        if instances.is_empty() {
            if !self.ctx.quiet {
                println!("No instances to display.");
            }
            return;
        }
        for (i, instance) in instances.iter().enumerate() {
            if i > 0 {
                println!();
            }
            self.ctx.header(&format!(
                "Instance {}: {}",
                i + 1,
                instance.name().unwrap_or("(unnamed)")
            ));
            self.ctx.kv("ID:           ", &instance.id);
            self.ctx.kv("State:        ", &self.styled_state(instance.state));
            self.ctx.kv("Image ID:     ", &instance.image_id);
            self.ctx.kv("Instance type:", &instance.instance_type);
            self.ctx
                .kv("Key name:     ", instance.key_name.as_deref().unwrap_or(NOT_SET));
            self.ctx
                .kv("VPC ID:       ", instance.vpc_id.as_deref().unwrap_or(NOT_SET));
            self.ctx
                .kv("Public IP:    ", instance.public_ip.as_deref().unwrap_or(NOT_SET));
            if let Some(launched) = instance.launch_time {
                self.ctx
                    .kv("Launched:     ", &launched.format("%Y-%m-%d %H:%M UTC").to_string());
            }
            if let Some(project) = instance.tag(TAG_PROJECT) {
                self.ctx.kv("Project:      ", project);
            }
            if let Some(user) = instance.tag(TAG_USER) {
                self.ctx.kv("User:         ", user);
            }
        }
    }

    /// Render a freshly provisioned machine.
    pub fn render_provisioned(&self, provisioned: &Provisioned) {
        self.ctx.success(&format!(
            "{} is running ({})",
            provisioned.marker.name, provisioned.instance.id
        ));
        self.ctx.kv("Public IP:", provisioned.public_ip());
        self.ctx.kv("Context:  ", &provisioned.marker.name);
        self.ctx.info(&format!(
            "Use it with: docker --context {} ps",
            provisioned.marker.name
        ));
    }

    /// Render a running notebook session and how to reach it.
    pub fn render_notebook(&self, session: &NotebookSession) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.success("JupyterLab is running");
        self.ctx.kv("URL:     ", &session.url);
        self.ctx.kv("Token:   ", &session.token);
        self.ctx.kv("Instance:", &session.instance.id);
        self.ctx.kv("Context: ", &session.marker.name);
        println!();
        if !session.tunnel_open {
            self.ctx.warn("The tunnel is not open yet.");
        }
        println!("  To reconnect to the notebook server use the following command:");
        println!();
        println!("      {}", session.tunnel_command.style(self.ctx.styles.bold));
        println!();
    }

    /// Render the outcome of context reconciliation.
    pub fn render_cleaned(&self, cleaned: &[Marker]) {
        if cleaned.is_empty() {
            self.ctx.success("No dangling contexts");
            return;
        }
        for marker in cleaned {
            self.ctx.success(&format!(
                "Removed context {} ({} is gone)",
                marker.name, marker.ip
            ));
        }
    }

    /// Render the outcome of a terminate request.
    pub fn render_terminated(&self, outcome: &TerminateOutcome) {
        match outcome {
            TerminateOutcome::NotFound => {
                self.ctx
                    .warn("Instance not found among running instances. Nothing terminated.");
            }
            TerminateOutcome::Terminated {
                instance_id,
                context,
                ..
            } => {
                self.ctx.success(&format!("Instance {instance_id} is terminating"));
                match context {
                    Some(name) => self.ctx.success(&format!("Context {name} removed")),
                    None => self.ctx.info("No docker context pointed at this instance"),
                }
            }
        }
    }

    /// Render a reopened tunnel.
    pub fn render_tunnel(&self, name: &str, command: &str) {
        self.ctx.success(&format!("Tunnel to {name} is open"));
        self.ctx.kv("Reconnect:", command);
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &DevMachineConfig, path: &Path) {
        if self.ctx.quiet {
            return;
        }
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for (key, value) in config.entries() {
            println!("  {:<30} {value}", format!("{key}:"));
        }
        println!();
    }

    /// Render a created key pair and the SSH config hint.
    pub fn render_key_created(&self, key_name: &str, path: &Path) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.success(&format!("Key pair {key_name} created"));
        self.ctx.kv("Private key:", &path.display().to_string());
        println!();
        println!("  Add the key to ~/.ssh/config so docker can reach your machines:");
        println!();
        println!("      Host *");
        println!("          IdentityFile {}", path.display());
        println!();
    }

    /// Render a written file.
    pub fn render_written(&self, path: &Path) {
        self.ctx.success(&format!("Wrote {}", path.display()));
    }
}
