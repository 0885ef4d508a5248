//! Application service: instance listing.

use anyhow::{Context, Result};

use crate::application::ports::{ComputeApi, InstanceFilter};
use crate::domain::instance::InstanceSummary;

/// All instances visible to the account, oldest launch first.
///
/// # Errors
///
/// Returns an error if the compute API call fails.
pub async fn list_instances(compute: &impl ComputeApi) -> Result<Vec<InstanceSummary>> {
    let mut instances = compute
        .list(InstanceFilter::All)
        .await
        .context("listing instances")?;
    instances.sort_by(|a, b| a.launch_time.cmp(&b.launch_time).then_with(|| a.id.cmp(&b.id)));
    Ok(instances)
}
