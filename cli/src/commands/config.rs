//! `dev-machine config`: show, set, and initialise configuration; create key pairs.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::domain::config::{DevMachineConfig, validate_config_value};
use crate::infra::fs::KeyFileWriter;

/// Settings asked for by `config init`, in prompt order.
const INIT_KEYS: &[&str] = &[
    "aws.region",
    "instance.image_id",
    "instance.instance_type",
    "instance.key_name",
    "ssh.user",
    "notebook.image",
];

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Create an EC2 key pair, save it under ~/.ssh, and make it the default
    CreateKey {
        /// Key pair name
        name: String,
    },
    /// Interactively fill in the essential settings
    Init,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be read, validated, or written.
pub async fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
        ConfigCommand::CreateKey { name } => create_key(app, &name).await,
        ConfigCommand::Init => init_config(app).await,
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    app.renderer().render_config(&config, &path)?;
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_value(&app.config_store, key, value)?;
    app.output.success(&format!("Set {key} = {value}"));
    if app.is_json() {
        let config = config_service::load_config(&app.config_store)?;
        app.renderer()
            .render_config(&config, &app.config_store.path()?)?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn create_key(app: &AppContext, name: &str) -> Result<ExitCode> {
    let config = app.load_config()?;
    let ssh_dir = KeyFileWriter::ssh_dir()?;
    let reporter = app.terminal_reporter();
    let path = config_service::create_key_pair(
        name,
        &ssh_dir,
        &app.aws(&config),
        &KeyFileWriter,
        &app.config_store,
        &reporter,
    )
    .await?;
    reporter.finish();
    app.renderer().render_key_created(name, &path)?;
    Ok(ExitCode::SUCCESS)
}

async fn init_config(app: &AppContext) -> Result<ExitCode> {
    anyhow::ensure!(
        console::user_attended(),
        "config init needs a terminal. Use 'dev-machine config set <key> <value>' instead."
    );

    let mut config = config_service::load_config(&app.config_store)?;
    for key in INIT_KEYS {
        let current = current_value(&config, key);
        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(*key)
            .validate_with(|v: &String| validate_config_value(key, v).map_err(|e| e.to_string()));
        if let Some(current) = current {
            input = input.default(current);
        }
        let value = input.interact_text().with_context(|| format!("reading {key}"))?;
        config.set(key, &value)?;
    }
    config_service::save_config(&app.config_store, &config)?;
    app.output.success(&format!(
        "Configuration saved to {}",
        app.config_store.path()?.display()
    ));

    if app.confirm("Create a new key pair for your machines?")? {
        let name = dialoguer::Input::<String>::new()
            .with_prompt("Key pair name")
            .default(config.instance.key_name.clone())
            .interact_text()?;
        return create_key(app, &name).await;
    }
    Ok(ExitCode::SUCCESS)
}

fn current_value(config: &DevMachineConfig, key: &str) -> Option<String> {
    config
        .entries()
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .filter(|v| v != "(not set)")
}
