//! `dev-machine notebook`: an instance running JupyterLab, tunnelled to localhost.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::bootstrap::BootstrapPolicy;
use crate::application::services::notebook::{NotebookRequest, launch_notebook};
use crate::application::services::provision::ProvisionRequest;
use crate::commands::interrupted;
use crate::domain::notebook::{ImageRef, NotebookPorts};

/// Arguments for the notebook command.
#[derive(Args)]
pub struct NotebookArgs {
    /// Machine name, also used as the Docker context name
    pub name: String,

    /// Project tag (must be in the project allow-list)
    #[arg(short, long)]
    pub project: String,

    /// Instance type (defaults to instance.instance_type)
    #[arg(short, long)]
    pub instance_type: Option<String>,

    /// Image in the private registry, `name[:tag]` (defaults to notebook.image)
    #[arg(long)]
    pub image: Option<String>,

    /// JupyterLab port (defaults to notebook.jupyter_port)
    #[arg(long)]
    pub jupyter_port: Option<u16>,

    /// Dask dashboard port (defaults to notebook.dask_port)
    #[arg(long)]
    pub dask_port: Option<u16>,
}

/// Run `dev-machine notebook`.
///
/// # Errors
///
/// Returns an error if provisioning or the notebook bootstrap fails.
pub async fn run(app: &AppContext, args: &NotebookArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let image = ImageRef::parse(args.image.as_deref().unwrap_or(&config.notebook.image))?;
    let defaults = config.notebook_ports();
    let ports = NotebookPorts {
        jupyter: args.jupyter_port.unwrap_or(defaults.jupyter),
        dask: args.dask_port.unwrap_or(defaults.dask),
    };
    anyhow::ensure!(
        ports.jupyter != ports.dask,
        "jupyter and dask ports must differ (both are {})",
        ports.jupyter
    );

    let request = NotebookRequest {
        provision: ProvisionRequest {
            name: &args.name,
            project: &args.project,
            launch: config.launch_request(args.instance_type.as_deref())?,
            ssh_user: &config.ssh.user,
            ssh_port: config.ssh.port,
        },
        image,
        ports,
        volume: &config.notebook.volume,
        instance_profile: &config.notebook.instance_profile,
    };

    let reporter = app.terminal_reporter();
    let session = launch_notebook(
        request,
        &app.aws(&config),
        &app.docker(),
        &app.ssh(&config),
        &app.markers,
        BootstrapPolicy::default(),
        &reporter,
        interrupted(),
    )
    .await?;
    reporter.finish();

    app.renderer().render_notebook(&session)?;
    Ok(ExitCode::SUCCESS)
}
