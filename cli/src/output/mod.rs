//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::notebook::NotebookSession;
use crate::application::services::provision::Provisioned;
use crate::application::services::terminate::TerminateOutcome;
use crate::domain::config::DevMachineConfig;
use crate::domain::instance::InstanceSummary;
use crate::domain::marker::Marker;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Human or JSON rendering, chosen once per invocation.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_version(version),
            Self::Json(r) => r.render_version(version)?,
        }
        Ok(())
    }

    /// Render an instance listing.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_instances(&self, instances: &[InstanceSummary]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_instances(instances),
            Self::Json(r) => r.render_instances(instances)?,
        }
        Ok(())
    }

    /// Render a provisioned machine.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_provisioned(&self, provisioned: &Provisioned) -> Result<()> {
        match self {
            Self::Human(r) => r.render_provisioned(provisioned),
            Self::Json(r) => r.render_provisioned(provisioned)?,
        }
        Ok(())
    }

    /// Render a notebook session.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_notebook(&self, session: &NotebookSession) -> Result<()> {
        match self {
            Self::Human(r) => r.render_notebook(session),
            Self::Json(r) => r.render_notebook(session)?,
        }
        Ok(())
    }

    /// Render cleaned markers.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_cleaned(&self, cleaned: &[Marker]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_cleaned(cleaned),
            Self::Json(r) => r.render_cleaned(cleaned)?,
        }
        Ok(())
    }

    /// Render a terminate outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_terminated(&self, outcome: &TerminateOutcome) -> Result<()> {
        match self {
            Self::Human(r) => r.render_terminated(outcome),
            Self::Json(r) => r.render_terminated(outcome)?,
        }
        Ok(())
    }

    /// Render a reopened tunnel.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_tunnel(&self, name: &str, command: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_tunnel(name, command),
            Self::Json(r) => r.render_tunnel(name, command)?,
        }
        Ok(())
    }

    /// Render the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &DevMachineConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config(config, path),
            Self::Json(r) => r.render_config(config, path)?,
        }
        Ok(())
    }

    /// Render a created key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_key_created(&self, key_name: &str, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_key_created(key_name, path),
            Self::Json(r) => r.render_key_created(key_name, path)?,
        }
        Ok(())
    }

    /// Render a written file.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_written(&self, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_written(path),
            Self::Json(r) => r.render_written(path)?,
        }
        Ok(())
    }
}
