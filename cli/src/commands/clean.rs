//! `dev-machine clean`: remove contexts whose instance is gone.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::reconcile::clean_dangling_contexts;

/// Run `dev-machine clean`.
///
/// # Errors
///
/// Returns an error if the instances or the registered machines cannot be listed.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let reporter = app.terminal_reporter();
    let cleaned =
        clean_dangling_contexts(&app.aws(&config), &app.docker(), &app.markers, &reporter).await?;
    reporter.finish();

    app.renderer().render_cleaned(&cleaned)?;
    Ok(ExitCode::SUCCESS)
}
