//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod context;
pub mod error;
pub mod instance;
pub mod makefile;
pub mod marker;
pub mod notebook;

pub use config::{DevMachineConfig, validate_config_key, validate_config_value};
pub use context::{DockerContext, SshTarget, ssh_endpoint, validate_context_name};
pub use error::{ConfigError, NotebookError, ProvisionError};
pub use instance::{IamUser, InstanceState, InstanceSummary, LaunchRequest, Tag};
pub use marker::Marker;
pub use notebook::{ImageRef, NotebookPorts, TunnelSpec};
