//! Marker files: the local record of provisioned context/instance pairs.
//!
//! A marker is a zero-byte file named `<name>@<ip>` in the dev-machine home
//! directory. The name is the Docker context name, the IP the public address
//! of the paired instance.

use std::fmt;

use serde::Serialize;

/// A registered `<name>@<ip>` pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Marker {
    /// Docker context name (also the machine name).
    pub name: String,
    /// Public IP address of the paired instance.
    pub ip: String,
}

impl Marker {
    #[must_use]
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
        }
    }

    /// File name under which the marker is stored.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}@{}", self.name, self.ip)
    }

    /// Parse a marker file name.
    ///
    /// Returns `None` for anything that is not exactly two non-empty parts
    /// separated by a single `@`. Such files are not markers and are left alone.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let mut parts = file_name.split('@');
        let name = parts.next()?;
        let ip = parts.next()?;
        if parts.next().is_some() || name.is_empty() || ip.is_empty() {
            return None;
        }
        Some(Self::new(name, ip))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.ip)
    }
}
