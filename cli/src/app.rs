//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the output settings and the local stores, and builds the
//! CLI adapters once the user configuration is known.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::DevMachineConfig;
use crate::infra::aws::AwsCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::docker::DockerCli;
use crate::infra::markers::MarkerDir;
use crate::infra::ssh::SshCli;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Environment variable that behaves like `--yes`.
pub const YES_ENV: &str = "DEV_MACHINE_YES";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip confirmation prompts (also set by `DEV_MACHINE_YES`).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    ///
    /// Always quiet in JSON mode so stdout carries only the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// User configuration file.
    pub config_store: YamlConfigStore,
    /// Marker directory.
    pub markers: MarkerDir,
    /// When `true`, confirmation prompts are answered with yes.
    pub assume_yes: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker directory cannot be resolved (home
    /// directory not found).
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let assume_yes = flags.behaviour.yes || std::env::var(YES_ENV).is_ok();
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Ok(Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            config_store: YamlConfigStore::default(),
            markers: MarkerDir::new()?,
            assume_yes,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for application services.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Load the user configuration (defaults when no file exists).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<DevMachineConfig> {
        self.config_store.load()
    }

    /// `aws` CLI adapter for the configured region and profile.
    #[must_use]
    pub fn aws(&self, config: &DevMachineConfig) -> AwsCli<TokioCommandRunner> {
        AwsCli::new(TokioCommandRunner::default(), config)
    }

    /// `docker` CLI adapter.
    #[must_use]
    pub fn docker(&self) -> DockerCli<TokioCommandRunner> {
        DockerCli::new(TokioCommandRunner::default())
    }

    /// `ssh` CLI adapter using the configured identity file.
    #[must_use]
    pub fn ssh(&self, config: &DevMachineConfig) -> SshCli<TokioCommandRunner> {
        SshCli::new(TokioCommandRunner::default(), config.ssh.identity_file.clone())
    }

    /// Ask the user for confirmation. Defaults to no.
    ///
    /// Returns `true` without prompting when `--yes` or `DEV_MACHINE_YES` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when no terminal is attached to answer the prompt, or
    /// if the prompt itself fails.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !console::user_attended() {
            anyhow::bail!("{prompt} Re-run with --yes to confirm without a terminal.");
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
