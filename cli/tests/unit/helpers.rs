//! Shared test helpers: output constructors and canned domain values.

#![allow(dead_code)]

use std::process::{ExitStatus, Output};

use dev_machine_cli::domain::instance::{InstanceState, InstanceSummary, Tag};

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Domain fixtures ──────────────────────────────────────────────────────────

pub fn instance(id: &str, ip: Option<&str>, state: InstanceState) -> InstanceSummary {
    InstanceSummary {
        id: id.to_string(),
        image_id: "ami-0123".to_string(),
        instance_type: "t2.micro".to_string(),
        key_name: Some("id_rsa".to_string()),
        vpc_id: Some("vpc-1".to_string()),
        public_ip: ip.map(String::from),
        state,
        launch_time: None,
        tags: vec![Tag::new("Name", id)],
    }
}
