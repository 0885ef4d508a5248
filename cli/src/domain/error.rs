//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors raised while creating an instance and pairing it with a context.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Project tag '{tag}' must be one of: {}", allowed.join(", "))]
    InvalidProjectTag { tag: String, allowed: Vec<String> },

    #[error("Context '{0}' already exists. Pick another name or run 'dev-machine clean'.")]
    ContextAlreadyExists(String),

    #[error("Invalid machine name '{0}': must match ^[a-zA-Z0-9][a-zA-Z0-9_.+-]*$")]
    InvalidName(String),

    #[error("No image id configured. Run: dev-machine config set instance.image_id <ami-id>")]
    MissingImageId,

    #[error("Instance {0} is running but has no public IP address")]
    NoPublicIp(String),

    #[error("Provisioning of instance {0} was interrupted")]
    Interrupted(String),

    #[error("No registered machine named '{0}'. Run 'dev-machine list' to see instances.")]
    UnknownMachine(String),

    #[error("Several machines are registered as '{name}' ({}). Run 'dev-machine clean' first.", ips.join(", "))]
    AmbiguousMachine { name: String, ips: Vec<String> },
}

// ── Notebook errors ───────────────────────────────────────────────────────────

/// Errors raised while bootstrapping the notebook server on an instance.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("Docker did not become available on {host} after {attempts} attempts")]
    DockerUnavailable { host: String, attempts: u32 },

    #[error("Could not log into {registry} after {attempts} attempts")]
    LoginFailed { registry: String, attempts: u32 },

    #[error("Timeout: failed to find token in container logs after {attempts} attempts")]
    TokenTimeout { attempts: u32 },

    #[error("Invalid image reference '{0}': expected <name>[:<tag>]")]
    InvalidImage(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
