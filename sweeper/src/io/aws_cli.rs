//! [`CloudFormation`] backed by the AWS CLI.
//!
//! Every call runs `aws cloudformation <operation> --output json --region <r>`
//! (plus `--profile` when set) through [`run_with_timeout`]. The CLI follows
//! pagination tokens itself, so list responses arrive complete.

use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::io::cloudformation::{
    CloudFormation, ProviderError, StackDescriptor, StackEvent, StackResource,
};
use crate::io::config::AwsConfig;
use crate::io::process::run_with_timeout;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksResponse {
    #[serde(default)]
    stacks: Vec<StackDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackEventsResponse {
    #[serde(default)]
    stack_events: Vec<StackEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackResourcesResponse {
    #[serde(default)]
    stack_resources: Vec<StackResource>,
}

#[derive(Debug, Clone)]
pub struct AwsCliCloudFormation {
    command: Vec<String>,
    region: String,
    profile: Option<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl AwsCliCloudFormation {
    pub fn new(aws: &AwsConfig, region: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            command: aws.command.clone(),
            region: region.into(),
            profile,
            timeout: aws.command_timeout(),
            output_limit_bytes: aws.output_limit_bytes,
        }
    }

    /// Arguments following the configured command prefix.
    pub fn arguments(&self, operation: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            "cloudformation".to_string(),
            operation.to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--region".to_string(),
            self.region.clone(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.extend(extra.iter().map(|arg| (*arg).to_string()));
        args
    }

    #[instrument(skip_all, fields(operation = %operation, target = %target))]
    fn invoke(&self, operation: &str, target: &str, extra: &[&str]) -> Result<Vec<u8>> {
        let (program, prefix) = self
            .command
            .split_first()
            .ok_or_else(|| ProviderError::new(operation, target, "aws.command is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .args(self.arguments(operation, extra))
            .env("AWS_PAGER", "");
        debug!(region = %self.region, "invoking provider");

        let output = run_with_timeout(cmd, self.timeout, self.output_limit_bytes)?;
        if output.timed_out {
            return Err(ProviderError::new(
                operation,
                target,
                format!("timed out after {}s", self.timeout.as_secs()),
            )
            .into());
        }
        if !output.success() {
            let stderr = output.stderr_text();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ProviderError::new(operation, target, message).into());
        }
        if output.stdout_truncated > 0 {
            return Err(ProviderError::new(
                operation,
                target,
                format!(
                    "response exceeded {} bytes ({} dropped)",
                    self.output_limit_bytes, output.stdout_truncated
                ),
            )
            .into());
        }
        Ok(output.stdout)
    }

    fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        target: &str,
        extra: &[&str],
    ) -> Result<T> {
        let stdout = self.invoke(operation, target, extra)?;
        Ok(parse_response(operation, target, &stdout)?)
    }
}

fn parse_response<T: DeserializeOwned>(
    operation: &str,
    target: &str,
    body: &[u8],
) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|err| {
        ProviderError::new(operation, target, format!("unreadable response: {err}"))
    })
}

impl CloudFormation for AwsCliCloudFormation {
    fn describe_stacks(&self) -> Result<Vec<StackDescriptor>> {
        let response: DescribeStacksResponse = self.query("describe-stacks", "*", &[])?;
        Ok(response.stacks)
    }

    fn describe_stack(&self, stack_id: &str) -> Result<StackDescriptor> {
        let response: DescribeStacksResponse =
            self.query("describe-stacks", stack_id, &["--stack-name", stack_id])?;
        response.stacks.into_iter().next().ok_or_else(|| {
            ProviderError::new("describe-stacks", stack_id, "stack not found").into()
        })
    }

    fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackEvent>> {
        let response: DescribeStackEventsResponse =
            self.query("describe-stack-events", stack_id, &["--stack-name", stack_id])?;
        Ok(response.stack_events)
    }

    fn describe_stack_resources(&self, stack_id: &str) -> Result<Vec<StackResource>> {
        let response: DescribeStackResourcesResponse =
            self.query("describe-stack-resources", stack_id, &["--stack-name", stack_id])?;
        Ok(response.stack_resources)
    }

    fn delete_stack(&self, stack_id: &str) -> Result<()> {
        self.invoke("delete-stack", stack_id, &["--stack-name", stack_id])?;
        Ok(())
    }

    fn update_termination_protection(&self, stack_id: &str, enabled: bool) -> Result<()> {
        let flag = if enabled {
            "--enable-termination-protection"
        } else {
            "--no-enable-termination-protection"
        };
        self.invoke(
            "update-termination-protection",
            stack_id,
            &["--stack-name", stack_id, flag],
        )?;
        Ok(())
    }
}
