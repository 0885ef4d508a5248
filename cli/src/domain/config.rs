//! Domain types and validators for dev-machine configuration.
//!
//! Pure functions only. No I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, ProvisionError};
use crate::domain::instance::{LaunchRequest, Tag};
use crate::domain::notebook::{ImageRef, NotebookPorts};

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "aws.region",
    "aws.profile",
    "instance.image_id",
    "instance.instance_type",
    "instance.key_name",
    "instance.subnet_id",
    "instance.iam_instance_profile",
    "ssh.user",
    "ssh.port",
    "ssh.identity_file",
    "notebook.image",
    "notebook.jupyter_port",
    "notebook.dask_port",
    "notebook.volume",
    "notebook.instance_profile",
    "tags.bucket",
    "tags.key",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.dev_machine/config`.
///
/// Every section carries serde defaults, so a partial user file is merged
/// over the built-in defaults on load.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DevMachineConfig {
    pub aws: AwsConfig,
    pub instance: InstanceConfig,
    pub ssh: SshConfig,
    pub notebook: NotebookConfig,
    pub tags: TagCatalogConfig,
}

/// AWS CLI selection. Unset values fall back to the CLI's own resolution.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AwsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Shape of the instances to launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub instance_type: String,
    pub key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<String>,
    /// Extra tags applied to every instance.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            image_id: None,
            instance_type: "t2.micro".to_string(),
            key_name: "id_rsa".to_string(),
            subnet_id: None,
            security_group_ids: Vec::new(),
            iam_instance_profile: None,
            tags: BTreeMap::new(),
        }
    }
}

/// How to reach instances over SSH.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
    pub user: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: "ubuntu".to_string(),
            port: 22,
            identity_file: None,
        }
    }
}

/// Notebook server defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotebookConfig {
    pub image: String,
    pub jupyter_port: u16,
    pub dask_port: u16,
    /// Bind mount `host:container` handed to `docker run -v`.
    pub volume: String,
    /// Instance profile granting the instance pull access to the registry.
    pub instance_profile: String,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        let ports = NotebookPorts::default();
        Self {
            image: "data_explorer:prod".to_string(),
            jupyter_port: ports.jupyter,
            dask_port: ports.dask,
            volume: "/home/ubuntu/efs:/home/eki/efs".to_string(),
            instance_profile: "AccessECR".to_string(),
        }
    }
}

/// Where the project tag allow-list lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TagCatalogConfig {
    pub bucket: String,
    pub key: String,
}

impl Default for TagCatalogConfig {
    fn default() -> Self {
        Self {
            bucket: "eki-dev-machine-config".to_string(),
            key: "project_tags.txt".to_string(),
        }
    }
}

impl DevMachineConfig {
    /// Build a launch request from the instance section.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingImageId`] if no image is configured.
    pub fn launch_request(&self, instance_type: Option<&str>) -> Result<LaunchRequest> {
        let image_id = self
            .instance
            .image_id
            .clone()
            .ok_or(ProvisionError::MissingImageId)?;
        Ok(LaunchRequest {
            image_id,
            instance_type: instance_type
                .unwrap_or(&self.instance.instance_type)
                .to_string(),
            key_name: self.instance.key_name.clone(),
            subnet_id: self.instance.subnet_id.clone(),
            security_group_ids: self.instance.security_group_ids.clone(),
            iam_instance_profile: self.instance.iam_instance_profile.clone(),
            tags: self
                .instance
                .tags
                .iter()
                .map(|(k, v)| Tag::new(k, v))
                .collect(),
        })
    }

    /// Notebook ports from the notebook section.
    #[must_use]
    pub fn notebook_ports(&self) -> NotebookPorts {
        NotebookPorts {
            jupyter: self.notebook.jupyter_port,
            dask: self.notebook.dask_port,
        }
    }

    /// Validate and apply `key = value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let owned = value.to_string();
        match key {
            "aws.region" => self.aws.region = Some(owned),
            "aws.profile" => self.aws.profile = Some(owned),
            "instance.image_id" => self.instance.image_id = Some(owned),
            "instance.instance_type" => self.instance.instance_type = owned,
            "instance.key_name" => self.instance.key_name = owned,
            "instance.subnet_id" => self.instance.subnet_id = Some(owned),
            "instance.iam_instance_profile" => self.instance.iam_instance_profile = Some(owned),
            "ssh.user" => self.ssh.user = owned,
            "ssh.port" => self.ssh.port = parse_port(key, value)?,
            "ssh.identity_file" => self.ssh.identity_file = Some(PathBuf::from(owned)),
            "notebook.image" => self.notebook.image = owned,
            "notebook.jupyter_port" => self.notebook.jupyter_port = parse_port(key, value)?,
            "notebook.dask_port" => self.notebook.dask_port = parse_port(key, value)?,
            "notebook.volume" => self.notebook.volume = owned,
            "notebook.instance_profile" => self.notebook.instance_profile = owned,
            "tags.bucket" => self.tags.bucket = owned,
            "tags.key" => self.tags.key = owned,
            _ => unreachable_key(key)?,
        }
        Ok(())
    }

    /// Flattened `(key, value)` view used by `config show`.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
        vec![
            ("aws.region", opt(&self.aws.region)),
            ("aws.profile", opt(&self.aws.profile)),
            ("instance.image_id", opt(&self.instance.image_id)),
            ("instance.instance_type", self.instance.instance_type.clone()),
            ("instance.key_name", self.instance.key_name.clone()),
            ("instance.subnet_id", opt(&self.instance.subnet_id)),
            (
                "instance.iam_instance_profile",
                opt(&self.instance.iam_instance_profile),
            ),
            ("ssh.user", self.ssh.user.clone()),
            ("ssh.port", self.ssh.port.to_string()),
            (
                "ssh.identity_file",
                self.ssh
                    .identity_file
                    .as_ref()
                    .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string()),
            ),
            ("notebook.image", self.notebook.image.clone()),
            ("notebook.jupyter_port", self.notebook.jupyter_port.to_string()),
            ("notebook.dask_port", self.notebook.dask_port.to_string()),
            ("notebook.volume", self.notebook.volume.clone()),
            ("notebook.instance_profile", self.notebook.instance_profile.clone()),
            ("tags.bucket", self.tags.bucket.clone()),
            ("tags.key", self.tags.key.clone()),
        ]
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |expected: &str| -> Result<()> {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
        .into())
    };

    if value.trim().is_empty() {
        return invalid("a non-empty value");
    }
    match key {
        "ssh.port" | "notebook.jupyter_port" | "notebook.dask_port" => {
            parse_port(key, value).map(|_| ())
        }
        "instance.image_id" if !value.starts_with("ami-") => invalid("an AMI id (ami-...)"),
        "instance.instance_type" if !is_instance_type(value) => {
            invalid("an instance type such as t2.micro")
        }
        "notebook.image" if ImageRef::parse(value).is_err() => invalid("<name>[:<tag>]"),
        "notebook.volume" if !value.contains(':') => invalid("<host-path>:<container-path>"),
        _ => Ok(()),
    }
}

fn is_instance_type(value: &str) -> bool {
    let Some((family, size)) = value.split_once('.') else {
        return false;
    };
    let ok = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };
    ok(family) && ok(size)
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "a port between 1 and 65535".to_string(),
        }
        .into()),
    }
}

fn unreachable_key(key: &str) -> Result<()> {
    Err(ConfigError::UnknownKey {
        key: key.to_string(),
        valid: VALID_CONFIG_KEYS.join(", "),
    }
    .into())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
