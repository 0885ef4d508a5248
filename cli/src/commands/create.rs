//! `dev-machine create`: a blank instance paired with a Docker context.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::provision::{ProvisionRequest, provision_instance};
use crate::commands::interrupted;

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Machine name, also used as the Docker context name
    pub name: String,

    /// Project tag (must be in the project allow-list)
    #[arg(short, long)]
    pub project: String,

    /// Instance type (defaults to instance.instance_type)
    #[arg(short, long)]
    pub instance_type: Option<String>,
}

/// Run `dev-machine create`.
///
/// # Errors
///
/// Returns an error if provisioning fails. A launched instance is terminated
/// before the error is returned.
pub async fn run(app: &AppContext, args: &CreateArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let request = ProvisionRequest {
        name: &args.name,
        project: &args.project,
        launch: config.launch_request(args.instance_type.as_deref())?,
        ssh_user: &config.ssh.user,
        ssh_port: config.ssh.port,
    };

    let aws = app.aws(&config);
    let reporter = app.terminal_reporter();
    let provisioned = provision_instance(
        request,
        &aws,
        &app.docker(),
        &app.markers,
        &reporter,
        interrupted(),
    )
    .await?;
    reporter.finish();

    app.renderer().render_provisioned(&provisioned)?;
    Ok(ExitCode::SUCCESS)
}
