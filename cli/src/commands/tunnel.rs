//! `dev-machine tunnel`: reopen the notebook port-forward of a machine.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::tunnel::reopen_tunnel;
use crate::domain::notebook::NotebookPorts;

/// Arguments for the tunnel command.
#[derive(Args)]
pub struct TunnelArgs {
    /// Machine name given at creation
    pub name: String,

    /// JupyterLab port (defaults to notebook.jupyter_port)
    #[arg(long)]
    pub jupyter_port: Option<u16>,

    /// Dask dashboard port (defaults to notebook.dask_port)
    #[arg(long)]
    pub dask_port: Option<u16>,
}

/// Run `dev-machine tunnel`.
///
/// # Errors
///
/// Returns an error if the machine is not registered or ssh fails.
pub async fn run(app: &AppContext, args: &TunnelArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let defaults = config.notebook_ports();
    let ports = NotebookPorts {
        jupyter: args.jupyter_port.unwrap_or(defaults.jupyter),
        dask: args.dask_port.unwrap_or(defaults.dask),
    };
    let command = reopen_tunnel(
        &args.name,
        &config.ssh.user,
        ports,
        &app.markers,
        &app.ssh(&config),
    )
    .await?;
    app.renderer().render_tunnel(&args.name, &command)?;
    Ok(ExitCode::SUCCESS)
}
