//! `dev-machine remove`: terminate an instance and forget its context.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::terminate::{TerminateOutcome, terminate_instance};

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Instance id, e.g. i-0123456789abcdef0
    pub instance_id: String,
}

/// Run `dev-machine remove`.
///
/// Exits with code 2 when no running instance has the given id.
///
/// # Errors
///
/// Returns an error if the prompt, the lookup, or the termination fails.
pub async fn run(app: &AppContext, args: &RemoveArgs) -> Result<ExitCode> {
    if !app.confirm(&format!("Terminate instance {}?", args.instance_id))? {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let config = app.load_config()?;
    let reporter = app.terminal_reporter();
    let outcome = terminate_instance(
        &args.instance_id,
        &app.aws(&config),
        &app.docker(),
        &app.markers,
        &reporter,
    )
    .await?;
    reporter.finish();

    app.renderer().render_terminated(&outcome)?;
    Ok(match outcome {
        TerminateOutcome::NotFound => ExitCode::from(2),
        TerminateOutcome::Terminated { .. } => ExitCode::SUCCESS,
    })
}
