//! `dev-machine makefile`: write a Makefile for building and shipping an image.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::domain::makefile::render_makefile;

/// Arguments for the makefile command.
#[derive(Args)]
pub struct MakefileArgs {
    /// Local image name
    pub image: String,

    /// Registry repository the image is pushed to
    pub repo: String,

    /// Output path
    #[arg(short, long, default_value = "Makefile")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Run `dev-machine makefile`.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
pub fn run(app: &AppContext, args: &MakefileArgs) -> Result<ExitCode> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            args.output.display()
        );
    }
    std::fs::write(&args.output, render_makefile(&args.image, &args.repo))
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    app.renderer().render_written(&args.output)?;
    Ok(ExitCode::SUCCESS)
}
