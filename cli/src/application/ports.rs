//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::config::DevMachineConfig;
use crate::domain::{DockerContext, IamUser, InstanceSummary, LaunchRequest, Marker};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Which instances a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFilter {
    /// Every instance the account can see, in any state.
    All,
    /// Only instances in the `running` state.
    Running,
    /// Everything except `terminated` instances.
    Live,
}

/// Container launch parameters for `ContainerEngine::run_detached`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Fully qualified image reference.
    pub image: String,
    /// Command and arguments run in the container.
    pub command: Vec<String>,
    /// `--user` value.
    pub user: String,
    /// `host:container` bind mounts.
    pub volumes: Vec<String>,
    /// Ports published as `port:port`.
    pub ports: Vec<u16>,
}

/// Bounded polling: how many attempts and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Sleep between two attempts (no-op for a zero interval).
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

// ── Cloud Ports ───────────────────────────────────────────────────────────────

/// Instance lifecycle operations against the cloud compute API.
#[allow(async_fn_in_trait)]
pub trait ComputeApi {
    /// Launch exactly one instance and return its id.
    async fn launch(&self, request: &LaunchRequest) -> Result<String>;
    /// Block until the instance reports `running`.
    async fn wait_until_running(&self, instance_id: &str) -> Result<()>;
    /// Describe one instance, `None` if the id is unknown.
    async fn describe(&self, instance_id: &str) -> Result<Option<InstanceSummary>>;
    /// List instances matching `filter`.
    async fn list(&self, filter: InstanceFilter) -> Result<Vec<InstanceSummary>>;
    /// Request termination. Does not wait for `terminated`.
    async fn terminate(&self, instance_id: &str) -> Result<()>;
    /// Create an RSA key pair and return the PEM private key material.
    async fn create_key_pair(&self, name: &str) -> Result<String>;
}

/// Caller identity and registry credentials.
#[allow(async_fn_in_trait)]
pub trait AccountApi {
    /// Account id of the caller.
    async fn account_id(&self) -> Result<String>;
    /// Region the compute API is talking to.
    async fn region(&self) -> Result<String>;
    /// IAM user behind the current credentials.
    async fn current_user(&self) -> Result<IamUser>;
    /// Password for `docker login --username AWS` against the private registry.
    async fn registry_password(&self) -> Result<String>;
}

/// The external allow-list of project tags.
#[allow(async_fn_in_trait)]
pub trait TagCatalog {
    async fn project_tags(&self) -> Result<Vec<String>>;
}

// ── Container Engine Ports ────────────────────────────────────────────────────

/// Local Docker context bookkeeping.
#[allow(async_fn_in_trait)]
pub trait ContextManager {
    /// Create context `name` pointing at `endpoint`.
    async fn create_context(&self, name: &str, endpoint: &str) -> Result<()>;
    /// Remove context `name`. Returns `false` if it did not exist.
    async fn remove_context(&self, name: &str) -> Result<bool>;
    /// All contexts known to the local client.
    async fn list_contexts(&self) -> Result<Vec<DockerContext>>;
}

/// Remote container operations routed through a named context.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Log into `registry`. Returns `false` when the registry rejected the login.
    async fn login(&self, context: &str, registry: &str, password: &str) -> Result<bool>;
    async fn pull(&self, context: &str, image: &str) -> Result<()>;
    /// Start a detached container and return its id.
    async fn run_detached(&self, context: &str, spec: &ContainerSpec) -> Result<String>;
    /// Combined stdout/stderr log of a container.
    async fn logs(&self, context: &str, container_id: &str) -> Result<String>;
}

// ── SSH Port ──────────────────────────────────────────────────────────────────

/// Shell-level SSH operations against an instance.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// `true` once `docker --version` succeeds on the remote host.
    async fn docker_ready(&self, user: &str, host: &str) -> Result<bool>;
    /// Open a background port-forward described by `ssh_args`.
    async fn open_tunnel(&self, ssh_args: &[String]) -> Result<()>;
}

// ── Local Persistence Ports ───────────────────────────────────────────────────

/// The `<name>@<ip>` marker directory.
#[allow(async_fn_in_trait)]
pub trait MarkerStore {
    /// Create the marker file and return its path.
    async fn register(&self, marker: &Marker) -> Result<PathBuf>;
    /// Remove the marker file. Returns `false` if it did not exist.
    async fn deregister(&self, marker: &Marker) -> Result<bool>;
    /// All parseable markers. Other files in the directory are ignored.
    async fn list(&self) -> Result<Vec<Marker>>;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<DevMachineConfig>;
    /// Persist the configuration.
    fn save(&self, config: &DevMachineConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

/// Writes private key material to the local filesystem.
pub trait KeyWriter {
    /// Write `material` as `<dir>/<name>.pem` with owner-only permissions.
    fn write_private_key(&self, dir: &Path, name: &str, material: &str) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
