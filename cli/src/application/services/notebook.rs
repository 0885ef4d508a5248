//! Application service: the full notebook machine workflow.
//!
//! Provision, bootstrap the container, then tunnel the ports to localhost.

use std::future::Future;

use anyhow::Result;

use crate::application::ports::{
    AccountApi, ComputeApi, ContainerEngine, ContextManager, MarkerStore, ProgressReporter,
    RemoteShell, TagCatalog,
};
use crate::application::services::bootstrap::{BootstrapPolicy, NotebookSettings, bootstrap_notebook};
use crate::application::services::provision::{
    ProvisionRequest, Provisioned, ensure_context_free, provision_instance,
};
use crate::application::services::tunnel::open_tunnel;
use crate::domain::context::validate_context_name;
use crate::domain::instance::InstanceSummary;
use crate::domain::marker::Marker;
use crate::domain::notebook::{ImageRef, NotebookPorts, TunnelSpec, notebook_url};

/// A notebook machine to create.
#[derive(Debug, Clone)]
pub struct NotebookRequest<'a> {
    pub provision: ProvisionRequest<'a>,
    pub image: ImageRef,
    pub ports: NotebookPorts,
    pub volume: &'a str,
    /// Instance profile granting the instance registry pull access.
    pub instance_profile: &'a str,
}

/// A running notebook server reachable from this machine.
#[derive(Debug, Clone)]
pub struct NotebookSession {
    pub instance: InstanceSummary,
    pub marker: Marker,
    pub container_id: String,
    pub image: String,
    pub token: String,
    pub url: String,
    /// Command that reopens the tunnel.
    pub tunnel_command: String,
    /// `false` when the tunnel could not be opened automatically.
    pub tunnel_open: bool,
}

/// Create a machine and start a notebook server on it.
///
/// Provisioning failures roll back the instance. Once the instance is up,
/// bootstrap failures leave it running and the error names the instance id;
/// a tunnel failure is only a warning.
///
/// # Errors
///
/// Returns an error if provisioning or bootstrapping fails.
#[allow(clippy::too_many_arguments)]
pub async fn launch_notebook(
    request: NotebookRequest<'_>,
    cloud: &(impl ComputeApi + AccountApi + TagCatalog),
    docker: &(impl ContextManager + ContainerEngine),
    shell: &impl RemoteShell,
    markers: &impl MarkerStore,
    policy: BootstrapPolicy,
    reporter: &impl ProgressReporter,
    interrupt: impl Future<Output = ()>,
) -> Result<NotebookSession> {
    let name = request.provision.name;
    let ssh_user = request.provision.ssh_user;
    validate_context_name(name)?;
    ensure_context_free(docker, name).await?;

    let mut provision = request.provision.clone();
    provision.launch.iam_instance_profile = Some(request.instance_profile.to_string());
    let Provisioned { instance, marker, .. } =
        provision_instance(provision, cloud, docker, markers, reporter, interrupt).await?;

    let settings = NotebookSettings {
        image: &request.image,
        ports: request.ports,
        volume: request.volume,
        ssh_user,
    };
    let server = bootstrap_notebook(
        name, &marker.ip, &settings, cloud, docker, shell, policy, reporter,
    )
    .await
    .map_err(|e| {
        e.context(format!(
            "instance {id} is still running; remove it with: dev-machine remove {id}",
            id = instance.id
        ))
    })?;

    let spec = TunnelSpec {
        user: ssh_user.to_string(),
        host: marker.ip.clone(),
        ports: request.ports,
    };
    reporter.step("opening tunnel...");
    let (tunnel_command, tunnel_open) = match open_tunnel(&spec, shell).await {
        Ok(command) => (command, true),
        Err(e) => {
            reporter.warn(&format!("could not open tunnel: {e:#}"));
            (spec.command(), false)
        }
    };

    Ok(NotebookSession {
        url: notebook_url(request.ports.jupyter, &server.token),
        instance,
        marker,
        container_id: server.container_id,
        image: server.image,
        token: server.token,
        tunnel_command,
        tunnel_open,
    })
}
