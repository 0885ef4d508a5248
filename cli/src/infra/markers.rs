//! Infrastructure implementation of the `MarkerStore` port.
//!
//! Markers are zero-byte files named `<name>@<ip>` in one directory. Blocking
//! filesystem calls run on `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::MarkerStore;
use crate::domain::marker::Marker;

/// Environment variable overriding the marker directory.
pub const HOME_ENV: &str = "DEV_MACHINE_HOME";

/// Marker directory manager. Also holds the user config file.
#[derive(Debug, Clone)]
pub struct MarkerDir {
    dir: PathBuf,
}

impl MarkerDir {
    /// Marker directory from `DEV_MACHINE_HOME`, else `~/.dev_machine`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var(HOME_ENV) {
            return Ok(Self::with_path(PathBuf::from(dir)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".dev_machine")))
    }

    /// Marker directory at an explicit path (used in tests).
    #[must_use]
    pub fn with_path(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn register_sync(dir: &Path, marker: &Marker) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let path = dir.join(marker.file_name());
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(path)
    }

    fn deregister_sync(dir: &Path, marker: &Marker) -> Result<bool> {
        let path = dir.join(marker.file_name());
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }

    fn list_sync(dir: &Path) -> Result<Vec<Marker>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", dir.display())),
        };
        let mut markers = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            if let Some(marker) = entry.file_name().to_str().and_then(Marker::parse) {
                markers.push(marker);
            }
        }
        markers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.ip.cmp(&b.ip)));
        Ok(markers)
    }
}

impl MarkerStore for MarkerDir {
    async fn register(&self, marker: &Marker) -> Result<PathBuf> {
        let dir = self.dir.clone();
        let marker = marker.clone();
        tokio::task::spawn_blocking(move || Self::register_sync(&dir, &marker))
            .await
            .context("marker register task panicked")?
    }

    async fn deregister(&self, marker: &Marker) -> Result<bool> {
        let dir = self.dir.clone();
        let marker = marker.clone();
        tokio::task::spawn_blocking(move || Self::deregister_sync(&dir, &marker))
            .await
            .context("marker deregister task panicked")?
    }

    async fn list(&self) -> Result<Vec<Marker>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || Self::list_sync(&dir))
            .await
            .context("marker list task panicked")?
    }
}
