//! `dev-machine list`: every instance visible to the account.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::inventory::list_instances;

/// Run `dev-machine list`.
///
/// # Errors
///
/// Returns an error if the instances cannot be listed.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let instances = list_instances(&app.aws(&config)).await?;
    app.renderer().render_instances(&instances)?;
    Ok(ExitCode::SUCCESS)
}
