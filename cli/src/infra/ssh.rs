//! Infrastructure implementation of the `RemoteShell` port on top of `ssh`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, RemoteShell};

/// Upper bound for a single `docker --version` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Infrastructure adapter that routes all ssh calls through a `CommandRunner`.
pub struct SshCli<R: CommandRunner> {
    runner: R,
    identity_file: Option<PathBuf>,
}

impl<R: CommandRunner> SshCli<R> {
    /// `identity_file`, when set, is passed as `-i` on every connection.
    pub fn new(runner: R, identity_file: Option<PathBuf>) -> Self {
        Self {
            runner,
            identity_file,
        }
    }

    /// Options shared by every connection. Fresh instances have unknown host keys.
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }
}

impl<R: CommandRunner> RemoteShell for SshCli<R> {
    async fn docker_ready(&self, user: &str, host: &str) -> Result<bool> {
        let mut args = self.base_args();
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            format!("{user}@{host}"),
            "docker".to_string(),
            "--version".to_string(),
        ]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout("ssh", &args, PROBE_TIMEOUT)
            .await
            .context("ssh docker probe")?;
        Ok(output.status.success())
    }

    async fn open_tunnel(&self, ssh_args: &[String]) -> Result<()> {
        let mut args = self.base_args();
        args.extend(ssh_args.iter().cloned());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        // `-f` forks a child that keeps any captured pipes open, so stdio is inherited.
        let status = self
            .runner
            .run_status("ssh", &args)
            .await
            .context("ssh tunnel")?;
        if !status.success() {
            anyhow::bail!("ssh exited with {status}");
        }
        Ok(())
    }
}
