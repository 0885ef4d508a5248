//! Instance domain types, tagging rules, and the project allow-list.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::ProvisionError;

/// Tag key carrying the IAM user name of the owner.
pub const TAG_USER: &str = "user";
/// Tag key carrying the IAM user id of the owner.
pub const TAG_USER_ID: &str = "user_id";
/// Tag key carrying the project the instance is billed to.
pub const TAG_PROJECT: &str = "project";
/// Tag key EC2 uses for the display name.
pub const TAG_NAME: &str = "Name";

/// EC2 instance lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown,
}

impl InstanceState {
    /// Map the EC2 state name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// EC2 state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }

    /// `true` once the instance is on its way out and must not be terminated again.
    #[must_use]
    pub fn is_gone(self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Terminated)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key/value resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Snapshot of one instance as reported by the compute API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub id: String,
    pub image_id: String,
    pub instance_type: String,
    pub key_name: Option<String>,
    pub vpc_id: Option<String>,
    pub public_ip: Option<String>,
    pub state: InstanceState,
    pub launch_time: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

impl InstanceSummary {
    /// Value of the given tag, if present.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Display name from the `Name` tag.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tag(TAG_NAME)
    }
}

/// IAM identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamUser {
    pub user_name: String,
    pub user_id: String,
}

/// Parameters for launching exactly one instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchRequest {
    pub image_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub subnet_id: Option<String>,
    pub security_group_ids: Vec<String>,
    pub iam_instance_profile: Option<String>,
    pub tags: Vec<Tag>,
}

/// Parse the comma-separated project allow-list.
#[must_use]
pub fn parse_project_tags(text: &str) -> Vec<String> {
    text.trim()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Check a project tag against the allow-list.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidProjectTag`] if `tag` is not allowed.
pub fn ensure_project_tag(tag: &str, allowed: &[String]) -> Result<()> {
    if !allowed.iter().any(|t| t == tag) {
        return Err(ProvisionError::InvalidProjectTag {
            tag: tag.to_string(),
            allowed: allowed.to_vec(),
        }
        .into());
    }
    Ok(())
}

/// Apply owner and project tags.
///
/// Any pre-existing `user` tag is replaced; `user_id` and `project` are appended.
pub fn apply_instance_tags(tags: &mut Vec<Tag>, project: &str, user: &IamUser) {
    tags.retain(|t| t.key != TAG_USER);
    tags.push(Tag::new(TAG_USER, &user.user_name));
    tags.push(Tag::new(TAG_USER_ID, &user.user_id));
    tags.push(Tag::new(TAG_PROJECT, project));
}
