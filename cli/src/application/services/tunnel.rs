//! Application service: SSH port-forwards to notebook servers.

use anyhow::{Context, Result};

use crate::application::ports::{MarkerStore, RemoteShell};
use crate::domain::error::ProvisionError;
use crate::domain::notebook::{NotebookPorts, TunnelSpec};

/// Open the tunnel and return the command that reopens it.
///
/// # Errors
///
/// Returns an error if `ssh` fails to establish the forward.
pub async fn open_tunnel(spec: &TunnelSpec, shell: &impl RemoteShell) -> Result<String> {
    shell
        .open_tunnel(&spec.ssh_args())
        .await
        .with_context(|| format!("opening tunnel to {}", spec.host))?;
    Ok(spec.command())
}

/// Reopen the tunnel to a registered machine, looked up by name.
///
/// # Errors
///
/// Returns [`ProvisionError::UnknownMachine`] if no marker has that name,
/// [`ProvisionError::AmbiguousMachine`] if several do, or an error if the
/// tunnel cannot be opened.
pub async fn reopen_tunnel(
    name: &str,
    user: &str,
    ports: NotebookPorts,
    markers: &impl MarkerStore,
    shell: &impl RemoteShell,
) -> Result<String> {
    let mut matching: Vec<_> = markers
        .list()
        .await
        .context("listing registered machines")?
        .into_iter()
        .filter(|m| m.name == name)
        .collect();
    let marker = match matching.len() {
        0 => return Err(ProvisionError::UnknownMachine(name.to_string()).into()),
        1 => matching.remove(0),
        _ => {
            return Err(ProvisionError::AmbiguousMachine {
                name: name.to_string(),
                ips: matching.into_iter().map(|m| m.ip).collect(),
            }
            .into());
        }
    };
    let spec = TunnelSpec {
        user: user.to_string(),
        host: marker.ip,
        ports,
    };
    open_tunnel(&spec, shell).await
}
