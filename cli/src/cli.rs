//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Ephemeral EC2 development machines paired with local Docker contexts
#[derive(Parser)]
#[command(
    name = "dev-machine",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log diagnostics to stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a blank instance paired with a Docker context
    Create(commands::create::CreateArgs),

    /// Create an instance running JupyterLab and tunnel it to localhost
    Notebook(commands::notebook::NotebookArgs),

    /// List instances
    List,

    /// Terminate an instance and remove its context
    Remove(commands::remove::RemoveArgs),

    /// Remove contexts whose instance no longer exists
    Clean,

    /// Reopen the notebook tunnel of a machine
    Tunnel(commands::tunnel::TunnelArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Write a Makefile for building and pushing an image to the registry
    Makefile(commands::makefile::MakefileArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let flags = AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags { yes: self.yes },
        };
        let app = AppContext::new(&flags)?;

        match self.command {
            Command::Create(args) => commands::create::run(&app, &args).await,
            Command::Notebook(args) => commands::notebook::run(&app, &args).await,
            Command::List => commands::list::run(&app).await,
            Command::Remove(args) => commands::remove::run(&app, &args).await,
            Command::Clean => commands::clean::run(&app).await,
            Command::Tunnel(args) => commands::tunnel::run(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd).await,
            Command::Makefile(args) => commands::makefile::run(&app, &args),
            Command::Version => commands::version::run(&app),
        }
    }
}
