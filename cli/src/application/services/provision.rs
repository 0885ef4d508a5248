//! Application service: instance provisioning and context registration.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{
    AccountApi, ComputeApi, ContextManager, MarkerStore, ProgressReporter, TagCatalog,
};
use crate::domain::context::{ssh_endpoint, validate_context_name};
use crate::domain::error::ProvisionError;
use crate::domain::instance::{
    InstanceSummary, LaunchRequest, TAG_NAME, Tag, apply_instance_tags, ensure_project_tag,
};
use crate::domain::marker::Marker;

/// Everything needed to create one machine.
#[derive(Debug, Clone)]
pub struct ProvisionRequest<'a> {
    /// Machine name, used for the context, the marker, and the `Name` tag.
    pub name: &'a str,
    /// Project tag, checked against the allow-list.
    pub project: &'a str,
    pub launch: LaunchRequest,
    pub ssh_user: &'a str,
    pub ssh_port: u16,
}

/// A running instance paired with its context and marker.
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub instance: InstanceSummary,
    pub marker: Marker,
    pub marker_path: PathBuf,
}

impl Provisioned {
    /// Public IP of the instance (always present once provisioned).
    #[must_use]
    pub fn public_ip(&self) -> &str {
        &self.marker.ip
    }
}

/// Fail if a context named `name` already exists.
///
/// # Errors
///
/// Returns [`ProvisionError::ContextAlreadyExists`] on a clash, or an error if
/// the contexts cannot be listed.
pub async fn ensure_context_free(contexts: &impl ContextManager, name: &str) -> Result<()> {
    let existing = contexts
        .list_contexts()
        .await
        .context("listing docker contexts")?;
    if existing.iter().any(|c| c.name == name) {
        return Err(ProvisionError::ContextAlreadyExists(name.to_string()).into());
    }
    Ok(())
}

/// Create an instance, wait for it, pair it with a context, and register it.
///
/// Once the launch call has returned an instance id, any later failure, or
/// `interrupt` resolving, terminates the instance before the error is returned.
///
/// # Errors
///
/// Returns an error if validation fails, any cloud or docker call fails, or
/// provisioning is interrupted.
pub async fn provision_instance(
    request: ProvisionRequest<'_>,
    cloud: &(impl ComputeApi + AccountApi + TagCatalog),
    contexts: &impl ContextManager,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
    interrupt: impl Future<Output = ()>,
) -> Result<Provisioned> {
    validate_context_name(request.name)?;

    let allowed = cloud
        .project_tags()
        .await
        .context("fetching project tags")?;
    ensure_project_tag(request.project, &allowed)?;
    ensure_context_free(contexts, request.name).await?;

    let user = cloud.current_user().await.context("resolving IAM user")?;
    let mut launch = request.launch.clone();
    launch.tags.retain(|t| t.key != TAG_NAME);
    launch.tags.push(Tag::new(TAG_NAME, request.name));
    apply_instance_tags(&mut launch.tags, request.project, &user);

    reporter.step(&format!(
        "creating {} instance using key {}...",
        launch.instance_type, launch.key_name
    ));
    let instance_id = cloud.launch(&launch).await.context("launching instance")?;
    tracing::info!(%instance_id, name = request.name, "instance launched");

    let outcome = tokio::select! {
        result = finish_provisioning(&instance_id, &request, cloud, contexts, markers, reporter) => result,
        () = interrupt => Err(ProvisionError::Interrupted(instance_id.clone()).into()),
    };

    match outcome {
        Ok(provisioned) => Ok(provisioned),
        Err(err) => {
            reporter.warn(&format!("provisioning failed: {err:#}"));
            if roll_back(&instance_id, request.name, cloud, contexts, reporter).await {
                return Err(err);
            }
            Err(err.context(format!(
                "instance {instance_id} may still be running; remove it with: dev-machine remove {instance_id}"
            )))
        }
    }
}

async fn finish_provisioning(
    instance_id: &str,
    request: &ProvisionRequest<'_>,
    compute: &impl ComputeApi,
    contexts: &impl ContextManager,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
) -> Result<Provisioned> {
    reporter.step(&format!("waiting for {instance_id} to reach running state..."));
    compute
        .wait_until_running(instance_id)
        .await
        .with_context(|| format!("waiting for {instance_id}"))?;

    // The launch response predates the public IP assignment.
    let instance = compute
        .describe(instance_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("instance {instance_id} disappeared after launch"))?;
    let ip = instance
        .public_ip
        .clone()
        .ok_or_else(|| ProvisionError::NoPublicIp(instance_id.to_string()))?;
    reporter.success(&format!("public ip {ip} assigned"));

    let endpoint = ssh_endpoint(request.ssh_user, &ip, request.ssh_port);
    reporter.step(&format!("creating docker context for {endpoint}..."));
    contexts
        .create_context(request.name, &endpoint)
        .await
        .with_context(|| format!("creating docker context {}", request.name))?;

    let marker = Marker::new(request.name, &ip);
    let marker_path = markers
        .register(&marker)
        .await
        .with_context(|| format!("registering {marker}"))?;

    Ok(Provisioned {
        instance,
        marker,
        marker_path,
    })
}

/// Terminate the instance and drop its context. Returns `false` when the
/// instance may have been left running.
async fn roll_back(
    instance_id: &str,
    name: &str,
    compute: &impl ComputeApi,
    contexts: &impl ContextManager,
    reporter: &impl ProgressReporter,
) -> bool {
    let state = compute
        .describe(instance_id)
        .await
        .ok()
        .flatten()
        .map(|i| i.state);
    let mut terminated = true;
    if state.is_some_and(|s| s.is_gone()) {
        tracing::debug!(%instance_id, "instance already going away, no rollback needed");
    } else {
        reporter.step(&format!("terminating instance {instance_id}..."));
        if let Err(e) = compute.terminate(instance_id).await {
            reporter.warn(&format!(
                "could not terminate {instance_id}: {e:#}. Remove it with: dev-machine remove {instance_id}"
            ));
            terminated = false;
        }
    }

    // The name was free before launch, so a context by this name is ours.
    if let Err(e) = contexts.remove_context(name).await {
        tracing::warn!(context = name, error = %e, "could not remove context during rollback");
    }
    terminated
}
