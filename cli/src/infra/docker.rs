//! Infrastructure implementation of the container ports on top of the `docker` CLI.
//!
//! Remote daemons are addressed with `docker --context <name>`, so no process
//! environment is mutated.

use std::process::Output;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ContainerEngine, ContainerSpec, ContextManager};
use crate::domain::context::DockerContext;
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, IMAGE_PULL_TIMEOUT};

/// One line of `docker context ls --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct ContextLine {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "DockerEndpoint", default)]
    endpoint: String,
}

/// Infrastructure adapter that routes all docker CLI calls through a `CommandRunner`.
pub struct DockerCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> DockerCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn checked(&self, args: &[&str], what: &str) -> Result<Output> {
        let output = self
            .runner
            .run("docker", args)
            .await
            .with_context(|| what.to_string())?;
        if !output.status.success() {
            anyhow::bail!("{what} failed: {}", stderr_of(&output));
        }
        Ok(output)
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Parse the JSON-lines output of `docker context ls`.
fn parse_context_lines(stdout: &str) -> Result<Vec<DockerContext>> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let parsed: ContextLine =
                serde_json::from_str(line).with_context(|| format!("parsing context line {line}"))?;
            Ok(DockerContext {
                name: parsed.name,
                host: parsed.endpoint,
            })
        })
        .collect()
}

/// `docker run` arguments for a detached container.
fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--detach".to_string(),
        "--user".to_string(),
        spec.user.clone(),
    ];
    for volume in &spec.volumes {
        args.push("--volume".to_string());
        args.push(volume.clone());
    }
    for port in &spec.ports {
        args.push("--publish".to_string());
        args.push(format!("{port}:{port}"));
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

impl<R: CommandRunner> ContextManager for DockerCli<R> {
    async fn create_context(&self, name: &str, endpoint: &str) -> Result<()> {
        let docker_arg = format!("host={endpoint}");
        self.checked(
            &["context", "create", name, "--docker", &docker_arg],
            "docker context create",
        )
        .await?;
        Ok(())
    }

    async fn remove_context(&self, name: &str) -> Result<bool> {
        let output = self
            .runner
            .run("docker", &["context", "rm", "--force", name])
            .await
            .context("docker context rm")?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = stderr_of(&output);
        let lower = stderr.to_lowercase();
        if lower.contains("not found") || lower.contains("does not exist") {
            return Ok(false);
        }
        anyhow::bail!("docker context rm failed: {stderr}")
    }

    async fn list_contexts(&self) -> Result<Vec<DockerContext>> {
        let output = self
            .checked(
                &["context", "ls", "--format", "{{json .}}"],
                "docker context ls",
            )
            .await?;
        parse_context_lines(&String::from_utf8_lossy(&output.stdout))
    }
}

impl<R: CommandRunner> ContainerEngine for DockerCli<R> {
    async fn login(&self, context: &str, registry: &str, password: &str) -> Result<bool> {
        let output = self
            .runner
            .run_with_stdin(
                "docker",
                &[
                    "--context",
                    context,
                    "login",
                    "--username",
                    "AWS",
                    "--password-stdin",
                    registry,
                ],
                password.as_bytes(),
            )
            .await
            .context("docker login")?;
        if !output.status.success() {
            tracing::debug!(registry, stderr = %stderr_of(&output), "docker login rejected");
        }
        Ok(output.status.success())
    }

    async fn pull(&self, context: &str, image: &str) -> Result<()> {
        let output = self
            .runner
            .run_with_timeout(
                "docker",
                &["--context", context, "pull", "--quiet", image],
                IMAGE_PULL_TIMEOUT,
            )
            .await
            .context("docker pull")?;
        if !output.status.success() {
            anyhow::bail!("docker pull failed: {}", stderr_of(&output));
        }
        Ok(())
    }

    async fn run_detached(&self, context: &str, spec: &ContainerSpec) -> Result<String> {
        let run = run_args(spec);
        let mut args = vec!["--context", context];
        args.extend(run.iter().map(String::as_str));
        let output = self
            .runner
            .run_with_timeout("docker", &args, DEFAULT_CMD_TIMEOUT)
            .await
            .context("docker run")?;
        if !output.status.success() {
            anyhow::bail!("docker run failed: {}", stderr_of(&output));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        anyhow::ensure!(!id.is_empty(), "docker run printed no container id");
        Ok(id)
    }

    async fn logs(&self, context: &str, container_id: &str) -> Result<String> {
        let output = self
            .checked(&["--context", context, "logs", container_id], "docker logs")
            .await?;
        // The notebook server logs to stderr.
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }
}
