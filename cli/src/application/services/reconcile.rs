//! Application service: drop contexts whose instance no longer exists.

use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::application::ports::{
    ComputeApi, ContextManager, InstanceFilter, MarkerStore, ProgressReporter,
};
use crate::domain::marker::Marker;

/// Remove the context and marker of every registered machine whose IP no
/// longer belongs to a live instance. Returns the markers cleaned up.
///
/// Failures on individual contexts or markers are reported and skipped.
///
/// # Errors
///
/// Returns an error if the instances or the markers cannot be listed.
pub async fn clean_dangling_contexts(
    compute: &impl ComputeApi,
    contexts: &impl ContextManager,
    markers: &impl MarkerStore,
    reporter: &impl ProgressReporter,
) -> Result<Vec<Marker>> {
    reporter.step("cleaning dangling contexts...");
    let live: HashSet<String> = compute
        .list(InstanceFilter::Live)
        .await
        .context("listing instances")?
        .into_iter()
        .filter_map(|i| i.public_ip)
        .collect();

    let mut cleaned = Vec::new();
    for marker in markers.list().await.context("listing registered machines")? {
        if live.contains(&marker.ip) {
            continue;
        }
        match contexts.remove_context(&marker.name).await {
            Ok(true) => tracing::info!(context = %marker.name, "removed dangling context"),
            Ok(false) => tracing::debug!(context = %marker.name, "context already gone"),
            Err(e) => reporter.warn(&format!("could not remove context {}: {e:#}", marker.name)),
        }
        if let Err(e) = markers.deregister(&marker).await {
            reporter.warn(&format!("could not remove marker {marker}: {e:#}"));
        }
        cleaned.push(marker);
    }
    Ok(cleaned)
}
