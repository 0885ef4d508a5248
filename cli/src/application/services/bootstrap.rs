//! Application service: bring a notebook server up on a fresh instance.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{
    AccountApi, ContainerEngine, ContainerSpec, ProgressReporter, RemoteShell, RetryPolicy,
};
use crate::domain::error::NotebookError;
use crate::domain::notebook::{ImageRef, NotebookPorts, ecr_registry, extract_token, jupyter_command};

/// Polling bounds for each bootstrap phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapPolicy {
    /// Waiting for the remote Docker daemon.
    pub docker: RetryPolicy,
    /// Registry login attempts.
    pub login: RetryPolicy,
    /// Waiting for the server to print its token.
    pub token: RetryPolicy,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            docker: RetryPolicy::new(60, Duration::from_secs(5)),
            login: RetryPolicy::new(3, Duration::from_secs(2)),
            token: RetryPolicy::new(10, Duration::from_secs(5)),
        }
    }
}

/// What the container needs to know.
#[derive(Debug, Clone)]
pub struct NotebookSettings<'a> {
    pub image: &'a ImageRef,
    pub ports: NotebookPorts,
    /// `host:container` bind mount for the shared volume.
    pub volume: &'a str,
    /// Login user on the instance.
    pub ssh_user: &'a str,
}

/// A started notebook container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookServer {
    pub container_id: String,
    /// Fully qualified image the container runs.
    pub image: String,
    pub token: String,
}

/// Poll until `docker --version` succeeds over SSH.
///
/// # Errors
///
/// Returns [`NotebookError::DockerUnavailable`] once the attempts are exhausted.
pub async fn wait_for_docker(
    shell: &impl RemoteShell,
    user: &str,
    host: &str,
    policy: RetryPolicy,
) -> Result<()> {
    for attempt in 1..=policy.attempts {
        match shell.docker_ready(user, host).await {
            Ok(true) => return Ok(()),
            Ok(false) => tracing::debug!(host, attempt, "docker not ready yet"),
            Err(e) => tracing::debug!(host, attempt, error = %e, "docker probe failed"),
        }
        if attempt < policy.attempts {
            policy.pause().await;
        }
    }
    Err(NotebookError::DockerUnavailable {
        host: host.to_string(),
        attempts: policy.attempts,
    }
    .into())
}

/// Log the context's daemon into the account's private registry.
///
/// Returns the registry host.
///
/// # Errors
///
/// Returns [`NotebookError::LoginFailed`] if every attempt is rejected, or an
/// error if the account or the password cannot be resolved.
pub async fn login_to_registry(
    account: &impl AccountApi,
    engine: &impl ContainerEngine,
    context: &str,
    policy: RetryPolicy,
    reporter: &impl ProgressReporter,
) -> Result<String> {
    let account_id = account.account_id().await.context("resolving account id")?;
    let region = account.region().await.context("resolving region")?;
    let registry = ecr_registry(&account_id, &region);
    let password = account
        .registry_password()
        .await
        .context("fetching registry password")?;

    for attempt in 1..=policy.attempts {
        match engine.login(context, &registry, &password).await {
            Ok(true) => return Ok(registry),
            Ok(false) => reporter.warn(&format!(
                "registry login attempt {attempt}/{} rejected",
                policy.attempts
            )),
            Err(e) => reporter.warn(&format!(
                "registry login attempt {attempt}/{} failed: {e:#}",
                policy.attempts
            )),
        }
        if attempt < policy.attempts {
            policy.pause().await;
        }
    }
    Err(NotebookError::LoginFailed {
        registry,
        attempts: policy.attempts,
    }
    .into())
}

/// Poll the container log until the server prints its token.
///
/// # Errors
///
/// Returns [`NotebookError::TokenTimeout`] once the attempts are exhausted, or
/// an error if the log cannot be read.
pub async fn wait_for_token(
    engine: &impl ContainerEngine,
    context: &str,
    container_id: &str,
    policy: RetryPolicy,
) -> Result<String> {
    for attempt in 1..=policy.attempts {
        let logs = engine
            .logs(context, container_id)
            .await
            .context("reading notebook logs")?;
        if let Some(token) = extract_token(&logs) {
            return Ok(token);
        }
        tracing::debug!(container_id, attempt, "no token in notebook logs yet");
        if attempt < policy.attempts {
            policy.pause().await;
        }
    }
    Err(NotebookError::TokenTimeout {
        attempts: policy.attempts,
    }
    .into())
}

/// Wait for Docker, log in, pull the image, start the server, and read its token.
///
/// # Errors
///
/// Returns an error if any phase fails or exhausts its attempts.
#[allow(clippy::too_many_arguments)]
pub async fn bootstrap_notebook(
    context: &str,
    host: &str,
    settings: &NotebookSettings<'_>,
    account: &impl AccountApi,
    engine: &impl ContainerEngine,
    shell: &impl RemoteShell,
    policy: BootstrapPolicy,
    reporter: &impl ProgressReporter,
) -> Result<NotebookServer> {
    reporter.step(&format!("waiting for docker on {host}..."));
    wait_for_docker(shell, settings.ssh_user, host, policy.docker).await?;
    reporter.success("docker is ready");

    reporter.step("logging into the image registry...");
    let registry = login_to_registry(account, engine, context, policy.login, reporter).await?;

    let image = settings.image.qualified(&registry);
    reporter.step(&format!("pulling {image}..."));
    engine
        .pull(context, &image)
        .await
        .with_context(|| format!("pulling {image}"))?;

    let spec = ContainerSpec {
        image: image.clone(),
        command: jupyter_command(settings.ports.jupyter),
        user: "0".to_string(),
        volumes: vec![settings.volume.to_string()],
        ports: vec![settings.ports.jupyter, settings.ports.dask],
    };
    reporter.step("starting notebook server...");
    let container_id = engine
        .run_detached(context, &spec)
        .await
        .context("starting notebook container")?;
    tracing::info!(%container_id, %image, "notebook container started");

    reporter.step("waiting for notebook token...");
    let token = wait_for_token(engine, context, &container_id, policy.token).await?;
    reporter.success("notebook server is up");

    Ok(NotebookServer {
        container_id,
        image,
        token,
    })
}
