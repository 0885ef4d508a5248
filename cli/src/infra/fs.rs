//! Filesystem infrastructure: private key files.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::KeyWriter;

/// Writes private keys with owner-only permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFileWriter;

impl KeyFileWriter {
    /// The user's `~/.ssh` directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn ssh_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
            .map(|h| h.join(".ssh"))
    }
}

impl KeyWriter for KeyFileWriter {
    fn write_private_key(&self, dir: &Path, name: &str, material: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let path = dir.join(format!("{name}.pem"));

        let mut options = std::fs::OpenOptions::new();
        // Never overwrite an existing key.
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        file.write_all(material.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        if !material.ends_with('\n') {
            file.write_all(b"\n")
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(path)
    }
}
