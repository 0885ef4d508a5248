//! Application service: configuration and key pair use-cases.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{ComputeApi, ConfigStore, KeyWriter, ProgressReporter};
use crate::domain::config::DevMachineConfig;
use crate::domain::context::validate_context_name;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<DevMachineConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &DevMachineConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist one `key=value` setting, returning the new config.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<DevMachineConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}

/// Create a key pair in the cloud, store the private key under `ssh_dir`,
/// and make it the default launch key. Returns the private key path.
///
/// # Errors
///
/// Returns an error if the name is invalid, the key pair already exists, or
/// the key or config cannot be written.
pub async fn create_key_pair(
    name: &str,
    ssh_dir: &Path,
    compute: &impl ComputeApi,
    keys: &impl KeyWriter,
    store: &impl ConfigStore,
    reporter: &impl ProgressReporter,
) -> Result<PathBuf> {
    validate_context_name(name).context("invalid key pair name")?;

    reporter.step(&format!("creating key pair {name}..."));
    let material = compute
        .create_key_pair(name)
        .await
        .with_context(|| format!("creating key pair {name}"))?;
    let path = keys.write_private_key(ssh_dir, name, &material)?;
    reporter.success(&format!("private key written to {}", path.display()));

    let mut config = store.load()?;
    config.instance.key_name = name.to_string();
    store.save(&config)?;
    Ok(path)
}
