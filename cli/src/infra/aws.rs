//! Infrastructure implementation of the cloud ports on top of the `aws` CLI.
//!
//! `AwsCli<R>` routes every call through a `CommandRunner` and parses the
//! CLI's JSON output with serde.

use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{AccountApi, CommandRunner, ComputeApi, InstanceFilter, TagCatalog};
use crate::domain::config::DevMachineConfig;
use crate::domain::instance::{
    IamUser, InstanceState, InstanceSummary, LaunchRequest, Tag, parse_project_tags,
};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, INSTANCE_WAIT_TIMEOUT};

/// States other than `terminated`.
const LIVE_STATES: &str = "pending,running,shutting-down,stopping,stopped";

// ── CLI response shapes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunInstancesResponse {
    #[serde(default)]
    instances: Vec<InstanceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<InstanceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceDto {
    instance_id: String,
    #[serde(default)]
    image_id: String,
    #[serde(default)]
    instance_type: String,
    key_name: Option<String>,
    vpc_id: Option<String>,
    public_ip_address: Option<String>,
    state: Option<StateDto>,
    launch_time: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<TagDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateDto {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TagDto {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    user: UserDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserDto {
    user_name: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyPairResponse {
    key_material: String,
}

impl From<InstanceDto> for InstanceSummary {
    fn from(dto: InstanceDto) -> Self {
        Self {
            id: dto.instance_id,
            image_id: dto.image_id,
            instance_type: dto.instance_type,
            key_name: dto.key_name,
            vpc_id: dto.vpc_id,
            public_ip: dto.public_ip_address,
            state: dto
                .state
                .map_or(InstanceState::Unknown, |s| InstanceState::from_name(&s.name)),
            launch_time: dto.launch_time,
            tags: dto.tags.into_iter().map(|t| Tag::new(t.key, t.value)).collect(),
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────────────────────

/// Infrastructure adapter for EC2, IAM, STS, ECR, and S3 via the `aws` CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct AwsCli<R: CommandRunner> {
    runner: R,
    region: Option<String>,
    profile: Option<String>,
    tags_bucket: String,
    tags_key: String,
}

impl<R: CommandRunner> AwsCli<R> {
    /// Create an adapter using the region, profile, and tag catalog from `config`.
    pub fn new(runner: R, config: &DevMachineConfig) -> Self {
        Self {
            runner,
            region: config.aws.region.clone(),
            profile: config.aws.profile.clone(),
            tags_bucket: config.tags.bucket.clone(),
            tags_key: config.tags.key.clone(),
        }
    }

    /// Append the global `--region`/`--profile` flags.
    fn with_globals<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = args.to_vec();
        if let Some(region) = &self.region {
            full.extend(["--region", region.as_str()]);
        }
        if let Some(profile) = &self.profile {
            full.extend(["--profile", profile.as_str()]);
        }
        full
    }

    async fn raw(&self, args: &[&str], timeout: Duration) -> Result<Output> {
        let full = self.with_globals(args);
        self.runner.run_with_timeout("aws", &full, timeout).await
    }

    /// Run a command and return stdout, failing on a non-zero exit.
    async fn text(&self, args: &[&str], timeout: Duration) -> Result<String> {
        let output = self.raw(args, timeout).await?;
        if !output.status.success() {
            anyhow::bail!("{}", stderr_message(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a command with `--output json` and deserialize stdout.
    async fn json<T: DeserializeOwned>(&self, args: &[&str], timeout: Duration) -> Result<T> {
        let mut full = args.to_vec();
        full.extend(["--output", "json"]);
        let stdout = self.text(&full, timeout).await?;
        serde_json::from_str(&stdout).with_context(|| format!("parsing output of aws {}", args.join(" ")))
    }

    async fn describe_all(&self, filter: InstanceFilter) -> Result<Vec<InstanceSummary>> {
        let states = match filter {
            InstanceFilter::All => None,
            InstanceFilter::Running => Some("Name=instance-state-name,Values=running".to_string()),
            InstanceFilter::Live => Some(format!("Name=instance-state-name,Values={LIVE_STATES}")),
        };
        let mut args = vec!["ec2", "describe-instances"];
        if let Some(states) = &states {
            args.extend(["--filters", states.as_str()]);
        }
        let response: DescribeInstancesResponse = self
            .json(&args, DEFAULT_CMD_TIMEOUT)
            .await
            .context("aws ec2 describe-instances")?;
        Ok(flatten(response))
    }
}

fn flatten(response: DescribeInstancesResponse) -> Vec<InstanceSummary> {
    response
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .map(InstanceSummary::from)
        .collect()
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("aws exited with {}", output.status)
    } else {
        trimmed.to_string()
    }
}

/// `--tag-specifications` JSON for an instance.
fn tag_specifications(tags: &[Tag]) -> String {
    let tags: Vec<_> = tags
        .iter()
        .map(|t| serde_json::json!({ "Key": t.key, "Value": t.value }))
        .collect();
    serde_json::json!([{ "ResourceType": "instance", "Tags": tags }]).to_string()
}

impl<R: CommandRunner> ComputeApi for AwsCli<R> {
    async fn launch(&self, request: &LaunchRequest) -> Result<String> {
        let tag_spec = tag_specifications(&request.tags);
        let profile_arg = request
            .iam_instance_profile
            .as_ref()
            .map(|p| format!("Name={p}"));
        let mut args = vec![
            "ec2",
            "run-instances",
            "--image-id",
            request.image_id.as_str(),
            "--instance-type",
            request.instance_type.as_str(),
            "--key-name",
            request.key_name.as_str(),
            "--count",
            "1",
            "--tag-specifications",
            tag_spec.as_str(),
        ];
        if let Some(subnet) = &request.subnet_id {
            args.extend(["--subnet-id", subnet.as_str()]);
        }
        if !request.security_group_ids.is_empty() {
            args.push("--security-group-ids");
            args.extend(request.security_group_ids.iter().map(String::as_str));
        }
        if let Some(profile) = &profile_arg {
            args.extend(["--iam-instance-profile", profile.as_str()]);
        }

        let response: RunInstancesResponse = self
            .json(&args, INSTANCE_WAIT_TIMEOUT)
            .await
            .context("aws ec2 run-instances")?;
        response
            .instances
            .into_iter()
            .next()
            .map(|i| i.instance_id)
            .context("aws ec2 run-instances returned no instance")
    }

    async fn wait_until_running(&self, instance_id: &str) -> Result<()> {
        self.text(
            &["ec2", "wait", "instance-running", "--instance-ids", instance_id],
            INSTANCE_WAIT_TIMEOUT,
        )
        .await
        .context("aws ec2 wait instance-running")?;
        Ok(())
    }

    async fn describe(&self, instance_id: &str) -> Result<Option<InstanceSummary>> {
        let output = self
            .raw(
                &[
                    "ec2",
                    "describe-instances",
                    "--instance-ids",
                    instance_id,
                    "--output",
                    "json",
                ],
                DEFAULT_CMD_TIMEOUT,
            )
            .await
            .context("aws ec2 describe-instances")?;
        if !output.status.success() {
            let message = stderr_message(&output);
            if message.contains("InvalidInstanceID") {
                return Ok(None);
            }
            anyhow::bail!("aws ec2 describe-instances: {message}");
        }
        let response: DescribeInstancesResponse = serde_json::from_slice(&output.stdout)
            .context("parsing output of aws ec2 describe-instances")?;
        Ok(flatten(response).into_iter().find(|i| i.id == instance_id))
    }

    async fn list(&self, filter: InstanceFilter) -> Result<Vec<InstanceSummary>> {
        self.describe_all(filter).await
    }

    async fn terminate(&self, instance_id: &str) -> Result<()> {
        self.text(
            &[
                "ec2",
                "terminate-instances",
                "--instance-ids",
                instance_id,
                "--output",
                "json",
            ],
            DEFAULT_CMD_TIMEOUT,
        )
        .await
        .context("aws ec2 terminate-instances")?;
        Ok(())
    }

    async fn create_key_pair(&self, name: &str) -> Result<String> {
        let response: KeyPairResponse = self
            .json(
                &[
                    "ec2",
                    "create-key-pair",
                    "--key-name",
                    name,
                    "--key-type",
                    "rsa",
                    "--key-format",
                    "pem",
                ],
                DEFAULT_CMD_TIMEOUT,
            )
            .await
            .context("aws ec2 create-key-pair")?;
        Ok(response.key_material)
    }
}

impl<R: CommandRunner> AccountApi for AwsCli<R> {
    async fn account_id(&self) -> Result<String> {
        let identity: CallerIdentity = self
            .json(&["sts", "get-caller-identity"], DEFAULT_CMD_TIMEOUT)
            .await
            .context("aws sts get-caller-identity")?;
        Ok(identity.account)
    }

    async fn region(&self) -> Result<String> {
        if let Some(region) = &self.region {
            return Ok(region.clone());
        }
        let region = self
            .text(&["configure", "get", "region"], DEFAULT_CMD_TIMEOUT)
            .await
            .context("aws configure get region")?;
        let region = region.trim();
        if region.is_empty() {
            anyhow::bail!(
                "no AWS region configured. Run: dev-machine config set aws.region <region>"
            );
        }
        Ok(region.to_string())
    }

    async fn current_user(&self) -> Result<IamUser> {
        let response: GetUserResponse = self
            .json(&["iam", "get-user"], DEFAULT_CMD_TIMEOUT)
            .await
            .context("aws iam get-user")?;
        Ok(IamUser {
            user_name: response.user.user_name,
            user_id: response.user.user_id,
        })
    }

    async fn registry_password(&self) -> Result<String> {
        let password = self
            .text(&["ecr", "get-login-password"], DEFAULT_CMD_TIMEOUT)
            .await
            .context("aws ecr get-login-password")?;
        Ok(password.trim().to_string())
    }
}

impl<R: CommandRunner> TagCatalog for AwsCli<R> {
    async fn project_tags(&self) -> Result<Vec<String>> {
        let uri = format!("s3://{}/{}", self.tags_bucket, self.tags_key);
        let body = self
            .text(&["s3", "cp", uri.as_str(), "-"], DEFAULT_CMD_TIMEOUT)
            .await
            .with_context(|| format!("reading {uri}"))?;
        Ok(parse_project_tags(&body))
    }
}
