//! Unit tests for notebook bootstrap: bounded polling, registry login, token
//! discovery, and the full notebook workflow.

#![allow(clippy::expect_used)]

use std::sync::atomic::Ordering;
use std::time::Duration;

use dev_machine_cli::application::ports::RetryPolicy;
use dev_machine_cli::application::services::bootstrap::{
    BootstrapPolicy, NotebookSettings, bootstrap_notebook, login_to_registry, wait_for_docker,
    wait_for_token,
};
use dev_machine_cli::application::services::notebook::{NotebookRequest, launch_notebook};
use dev_machine_cli::application::services::provision::ProvisionRequest;
use dev_machine_cli::domain::error::NotebookError;
use dev_machine_cli::domain::notebook::jupyter_command;
use dev_machine_cli::domain::{ImageRef, LaunchRequest, NotebookPorts};

use crate::mocks::{
    CONTAINER_ID, FakeCloud, FakeDocker, FakeMarkers, FakeShell, REGISTRY_PASSWORD,
    RecordingReporter,
};

const TOKEN_LINE: &str = "[I ServerApp] http://127.0.0.1:8888/lab?token=9f8e7d6c5b4a\n";
const REGISTRY: &str = "123456789012.dkr.ecr.us-west-1.amazonaws.com";

fn quick(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::ZERO)
}

fn quick_policy() -> BootstrapPolicy {
    BootstrapPolicy {
        docker: quick(5),
        login: quick(3),
        token: quick(5),
    }
}

// ── Polling ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wait_for_docker_polls_until_ready() {
    let shell = FakeShell {
        ready_after: 3,
        ..FakeShell::default()
    };
    wait_for_docker(&shell, "ubuntu", "10.0.0.5", quick(5))
        .await
        .expect("ready");
    assert_eq!(shell.probes(), 3);
}

#[tokio::test]
async fn test_wait_for_docker_gives_up_after_attempts() {
    let shell = FakeShell::never_ready();
    let err = wait_for_docker(&shell, "ubuntu", "10.0.0.5", quick(4))
        .await
        .expect_err("never ready");
    assert!(matches!(
        err.downcast_ref::<NotebookError>(),
        Some(NotebookError::DockerUnavailable { attempts: 4, .. })
    ));
    assert_eq!(shell.probes(), 4);
}

#[tokio::test]
async fn test_login_retries_rejected_attempts() {
    let docker = FakeDocker::default();
    docker
        .login_results
        .lock()
        .expect("lock")
        .extend([false, false]);
    let reporter = RecordingReporter::default();

    let registry = login_to_registry(&FakeCloud::default(), &docker, "box", quick(3), &reporter)
        .await
        .expect("third attempt succeeds");

    assert_eq!(registry, REGISTRY);
    let logins = docker.logins.lock().expect("lock").clone();
    assert_eq!(logins.len(), 3);
    assert_eq!(logins[0].0, "box");
    assert_eq!(logins[0].2, REGISTRY_PASSWORD);
    assert_eq!(reporter.warnings().len(), 2);
}

#[tokio::test]
async fn test_login_fails_after_attempts() {
    let docker = FakeDocker::default();
    docker
        .login_results
        .lock()
        .expect("lock")
        .extend([false, false, false]);

    let err = login_to_registry(
        &FakeCloud::default(),
        &docker,
        "box",
        quick(3),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("rejected");

    assert!(matches!(
        err.downcast_ref::<NotebookError>(),
        Some(NotebookError::LoginFailed { attempts: 3, .. })
    ));
}

#[tokio::test]
async fn test_wait_for_token_reads_logs_until_token_appears() {
    let docker = FakeDocker::with_logs(&["starting\n", "starting\n", TOKEN_LINE]);
    let token = wait_for_token(&docker, "box", CONTAINER_ID, quick(5))
        .await
        .expect("token");
    assert_eq!(token, "9f8e7d6c5b4a");
    assert_eq!(docker.log_reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_for_token_times_out() {
    let docker = FakeDocker::with_logs(&["starting\n"]);
    let err = wait_for_token(&docker, "box", CONTAINER_ID, quick(3))
        .await
        .expect_err("no token");
    assert!(matches!(
        err.downcast_ref::<NotebookError>(),
        Some(NotebookError::TokenTimeout { attempts: 3 })
    ));
    assert_eq!(docker.log_reads.load(Ordering::SeqCst), 3);
}

// ── Bootstrap ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bootstrap_pulls_and_starts_notebook() {
    let docker = FakeDocker::with_logs(&[TOKEN_LINE]);
    let image = ImageRef::parse("data_explorer:prod").expect("image");
    let settings = NotebookSettings {
        image: &image,
        ports: NotebookPorts::default(),
        volume: "/home/ubuntu/efs:/home/eki/efs",
        ssh_user: "ubuntu",
    };

    let server = bootstrap_notebook(
        "box",
        "10.0.0.5",
        &settings,
        &FakeCloud::default(),
        &docker,
        &FakeShell::default(),
        quick_policy(),
        &RecordingReporter::default(),
    )
    .await
    .expect("bootstrapped");

    let qualified = format!("{REGISTRY}/data_explorer:prod");
    assert_eq!(server.image, qualified);
    assert_eq!(server.container_id, CONTAINER_ID);
    assert_eq!(server.token, "9f8e7d6c5b4a");
    assert_eq!(docker.pulled.lock().expect("lock").clone(), vec![qualified.clone()]);

    let runs = docker.runs.lock().expect("lock").clone();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].image, qualified);
    assert_eq!(runs[0].user, "0");
    assert_eq!(runs[0].ports, vec![8888, 8889]);
    assert_eq!(runs[0].volumes, vec!["/home/ubuntu/efs:/home/eki/efs"]);
    assert_eq!(runs[0].command, jupyter_command(8888));
}

#[tokio::test]
async fn test_bootstrap_stops_when_docker_never_answers() {
    let docker = FakeDocker::default();
    let image = ImageRef::parse("data_explorer").expect("image");
    let settings = NotebookSettings {
        image: &image,
        ports: NotebookPorts::default(),
        volume: "/a:/b",
        ssh_user: "ubuntu",
    };

    bootstrap_notebook(
        "box",
        "10.0.0.5",
        &settings,
        &FakeCloud::default(),
        &docker,
        &FakeShell::never_ready(),
        quick_policy(),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("docker unavailable");

    assert!(docker.logins.lock().expect("lock").is_empty());
    assert!(docker.runs.lock().expect("lock").is_empty());
}

// ── Full workflow ─────────────────────────────────────────────────────────────

fn notebook_request(name: &str) -> NotebookRequest<'_> {
    NotebookRequest {
        provision: ProvisionRequest {
            name,
            project: "dev",
            launch: LaunchRequest {
                image_id: "ami-0123".to_string(),
                instance_type: "t2.medium".to_string(),
                key_name: "id_rsa".to_string(),
                ..LaunchRequest::default()
            },
            ssh_user: "ubuntu",
            ssh_port: 22,
        },
        image: ImageRef::parse("data_explorer:prod").expect("image"),
        ports: NotebookPorts::default(),
        volume: "/home/ubuntu/efs:/home/eki/efs",
        instance_profile: "AccessECR",
    }
}

#[tokio::test]
async fn test_launch_notebook_opens_tunnel() {
    let cloud = FakeCloud::default();
    let docker = FakeDocker::with_logs(&[TOKEN_LINE]);
    let shell = FakeShell::default();
    let markers = FakeMarkers::default();

    let session = launch_notebook(
        notebook_request("nb"),
        &cloud,
        &docker,
        &shell,
        &markers,
        quick_policy(),
        &RecordingReporter::default(),
        std::future::pending(),
    )
    .await
    .expect("session");

    assert!(session.tunnel_open);
    assert_eq!(session.url, "http://localhost:8888/?token=9f8e7d6c5b4a");
    assert_eq!(
        session.tunnel_command,
        "ssh -f -N -L 8888:localhost:8888 -L 8889:localhost:8889 ubuntu@10.0.0.5"
    );
    assert_eq!(session.marker.file_name(), "nb@10.0.0.5");
    assert_eq!(shell.tunnels().len(), 1);
    assert_eq!(
        cloud.launched()[0].iam_instance_profile.as_deref(),
        Some("AccessECR")
    );
}

#[tokio::test]
async fn test_tunnel_failure_is_only_a_warning() {
    let shell = FakeShell {
        fail_tunnel: true,
        ..FakeShell::default()
    };
    let reporter = RecordingReporter::default();

    let session = launch_notebook(
        notebook_request("nb"),
        &FakeCloud::default(),
        &FakeDocker::with_logs(&[TOKEN_LINE]),
        &shell,
        &FakeMarkers::default(),
        quick_policy(),
        &reporter,
        std::future::pending(),
    )
    .await
    .expect("session despite tunnel failure");

    assert!(!session.tunnel_open);
    assert!(session.tunnel_command.starts_with("ssh -f -N"));
    assert!(reporter.warnings().iter().any(|w| w.contains("tunnel")));
}

#[tokio::test]
async fn test_bootstrap_failure_keeps_instance_and_explains_removal() {
    let cloud = FakeCloud::default();
    let docker = FakeDocker::with_logs(&["starting\n"]);
    let markers = FakeMarkers::default();

    let err = launch_notebook(
        notebook_request("nb"),
        &cloud,
        &docker,
        &FakeShell::default(),
        &markers,
        quick_policy(),
        &RecordingReporter::default(),
        std::future::pending(),
    )
    .await
    .expect_err("no token");

    let message = format!("{err:#}");
    assert!(message.contains("dev-machine remove i-0001"), "got: {message}");
    assert!(cloud.terminated().is_empty());
    assert_eq!(docker.context_names(), vec!["nb"]);
    assert_eq!(markers.all().len(), 1);
}

#[tokio::test]
async fn test_existing_context_blocks_notebook_launch() {
    let cloud = FakeCloud::default();

    launch_notebook(
        notebook_request("nb"),
        &cloud,
        &FakeDocker::with_context("nb", "ssh://ubuntu@10.1.1.1:22"),
        &FakeShell::default(),
        &FakeMarkers::default(),
        quick_policy(),
        &RecordingReporter::default(),
        std::future::pending(),
    )
    .await
    .expect_err("context exists");

    assert!(cloud.launched().is_empty());
}
