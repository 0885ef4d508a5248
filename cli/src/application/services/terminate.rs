//! Application service: terminate a machine and forget its context.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{
    ComputeApi, ContextManager, InstanceFilter, MarkerStore, ProgressReporter,
};
use crate::domain::marker::Marker;

/// Result of a terminate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// No running instance has that id.
    NotFound,
    Terminated {
        instance_id: String,
        public_ip: Option<String>,
        /// Context removed alongside the instance, if one pointed at it.
        context: Option<String>,
        markers_removed: Vec<Marker>,
    },
}

/// Name of the first context whose SSH host is `ip`.
///
/// # Errors
///
/// Returns an error if the contexts cannot be listed.
pub async fn find_context_by_ip(contexts: &impl ContextManager, ip: &str) -> Result<Option<String>> {
    let all = contexts
        .list_contexts()
        .await
        .context("listing docker contexts")?;
    Ok(all
        .into_iter()
        .find(|c| c.ssh_host().as_deref() == Some(ip))
        .map(|c| c.name))
}

/// Terminate a running instance by id and remove its context and markers.
///
/// # Errors
///
/// Returns an error if the instances cannot be listed or termination fails.
pub async fn terminate_instance(
    instance_id: &str,
    compute: &impl ComputeApi,
    contexts: &impl ContextManager,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
) -> Result<TerminateOutcome> {
    // 1. Find the instance among the running ones
    let running = compute
        .list(InstanceFilter::Running)
        .await
        .context("listing running instances")?;
    let Some(instance) = running.into_iter().find(|i| i.id == instance_id) else {
        return Ok(TerminateOutcome::NotFound);
    };

    // 2. Resolve its context before the IP is released
    let public_ip = instance.public_ip.clone();
    let context = match &public_ip {
        Some(ip) => find_context_by_ip(contexts, ip).await?,
        None => None,
    };

    // 3. Terminate
    reporter.step(&format!("terminating instance {instance_id}..."));
    compute
        .terminate(instance_id)
        .await
        .with_context(|| format!("terminating {instance_id}"))?;

    // 4. Local cleanup
    if let Some(name) = &context {
        if let Err(e) = contexts.remove_context(name).await {
            reporter.warn(&format!("could not remove context {name}: {e:#}"));
        }
    }
    let mut markers_removed = Vec::new();
    if let Some(ip) = &public_ip {
        for marker in markers.list().await.context("listing registered machines")? {
            if &marker.ip != ip {
                continue;
            }
            match markers.deregister(&marker).await {
                Ok(true) => markers_removed.push(marker),
                Ok(false) => {}
                Err(e) => reporter.warn(&format!("could not remove marker {marker}: {e:#}")),
            }
        }
    }

    reporter.success(&format!("instance {instance_id} terminated"));
    Ok(TerminateOutcome::Terminated {
        instance_id: instance_id.to_string(),
        public_ip,
        context,
        markers_removed,
    })
}
