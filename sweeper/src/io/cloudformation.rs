//! Provider abstraction for the stack API.
//!
//! The [`CloudFormation`] trait is the narrow surface the sweeper needs from
//! the provider. [`crate::io::aws_cli::AwsCliCloudFormation`] implements it by
//! shelling out to the AWS CLI; tests use a scripted fake that returns canned
//! responses without touching the network.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::stack::Stack;

/// A provider request was rejected or could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed for {target}: {message}")]
pub struct ProviderError {
    pub operation: String,
    /// Stack id, or `"*"` for account-wide requests.
    pub target: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        operation: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            target: target.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub parameter_key: String,
    #[serde(default)]
    pub parameter_value: String,
}

/// One entry of a `DescribeStacks` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescriptor {
    pub stack_id: String,
    pub stack_name: String,
    #[serde(default)]
    pub stack_status: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub last_updated_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub root_id: Option<String>,
    #[serde(default)]
    pub enable_termination_protection: bool,
}

impl StackDescriptor {
    /// Nested stacks are managed through their root and never swept directly.
    pub fn is_nested(&self) -> bool {
        self.parent_id.is_some() || self.root_id.is_some()
    }
}

impl From<StackDescriptor> for Stack {
    fn from(descriptor: StackDescriptor) -> Self {
        let mut stack = Stack::new(
            descriptor.stack_id,
            descriptor.stack_name,
            descriptor.creation_time,
        );
        if let Some(updated) = descriptor.last_updated_time {
            stack = stack.with_last_updated_at(updated);
        }
        stack.tags = descriptor
            .tags
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect();
        stack.parameters = descriptor
            .parameters
            .into_iter()
            .map(|param| (param.parameter_key, param.parameter_value))
            .collect();
        stack
    }
}

/// A stack lifecycle event. Providers return these newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackEvent {
    pub event_id: String,
    pub logical_resource_id: String,
    pub resource_status: String,
    #[serde(default)]
    pub resource_status_reason: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackResource {
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    pub resource_type: String,
    #[serde(default)]
    pub resource_status: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Stack operations the sweeper consumes from the provider.
///
/// Implementations own pagination and transport concerns. Failed requests
/// should surface as [`ProviderError`] so callers can tell them apart from
/// unsuccessful stack outcomes.
pub trait CloudFormation {
    /// Every live stack in the account/region, nested ones included.
    fn describe_stacks(&self) -> Result<Vec<StackDescriptor>>;
    fn describe_stack(&self, stack_id: &str) -> Result<StackDescriptor>;
    /// Events for the stack, newest first.
    fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackEvent>>;
    fn describe_stack_resources(&self, stack_id: &str) -> Result<Vec<StackResource>>;
    fn delete_stack(&self, stack_id: &str) -> Result<()>;
    fn update_termination_protection(&self, stack_id: &str, enabled: bool) -> Result<()>;
}

/// List root stacks as [`Stack`] snapshots, dropping nested stacks.
#[instrument(skip_all)]
pub fn list_stacks<C: CloudFormation + ?Sized>(client: &C) -> Result<Vec<Stack>> {
    let descriptors = client.describe_stacks().context("list stacks")?;
    let total = descriptors.len();
    let stacks: Vec<Stack> = descriptors
        .into_iter()
        .filter(|descriptor| !descriptor.is_nested())
        .map(Stack::from)
        .collect();
    debug!(total, roots = stacks.len(), "listed stacks");
    Ok(stacks)
}

/// Index resources by logical id.
pub fn resources_by_logical_id(resources: Vec<StackResource>) -> BTreeMap<String, StackResource> {
    resources
        .into_iter()
        .map(|resource| (resource.logical_resource_id.clone(), resource))
        .collect()
}
