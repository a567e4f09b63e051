//! Remote observation and deletion of a single stack.
//!
//! [`StackLifecycle::delete`] turns the provider's one-shot delete request into
//! a polled operation: after the request is accepted it watches the stack's
//! status and event stream until the status leaves the in-progress set,
//! emitting each new event exactly once, oldest first.

use std::collections::{BTreeMap, HashSet};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::stack::{Stack, is_in_progress, is_successful};
use crate::io::cloudformation::{
    CloudFormation, StackDescriptor, StackEvent, StackResource, resources_by_logical_id,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The wait finished, but the stack settled in a status that is not a success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stack did not delete successfully: {name} is in {status} status")]
pub struct UnsuccessfulDeleteError {
    pub name: String,
    pub status: String,
}

/// How a successful [`StackLifecycle::delete`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Request accepted; completion was not awaited.
    Requested,
    /// Waited until the stack reached a successful terminal status.
    Completed { status: String },
}

/// Remote operations against stacks through a provider client.
///
/// Status, termination protection, resources and events are fetched on every
/// call and never cached.
pub struct StackLifecycle<'a, C: ?Sized> {
    client: &'a C,
    poll_interval: Duration,
}

impl<'a, C: CloudFormation + ?Sized> StackLifecycle<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn status(&self, stack: &Stack) -> Result<String> {
        Ok(self.describe(stack)?.stack_status)
    }

    pub fn termination_protection(&self, stack: &Stack) -> Result<bool> {
        Ok(self.describe(stack)?.enable_termination_protection)
    }

    pub fn resources(&self, stack: &Stack) -> Result<BTreeMap<String, StackResource>> {
        let resources = self
            .client
            .describe_stack_resources(&stack.stack_id)
            .with_context(|| format!("describe resources of {}", stack.name))?;
        Ok(resources_by_logical_id(resources))
    }

    /// Events newest first, as the provider returns them.
    pub fn events(&self, stack: &Stack) -> Result<Vec<StackEvent>> {
        self.client
            .describe_stack_events(&stack.stack_id)
            .with_context(|| format!("describe events of {}", stack.name))
    }

    /// Turn termination protection off. Safe to call when it is already off.
    #[instrument(skip_all, fields(stack = %stack.name))]
    pub fn disable_termination_protection(&self, stack: &Stack) -> Result<()> {
        self.client
            .update_termination_protection(&stack.stack_id, false)
            .with_context(|| format!("disable termination protection on {}", stack.name))
    }

    /// Request deletion and, when `wait` is set, poll until the stack settles.
    ///
    /// Exactly one delete request is sent. While waiting, `on_event` receives
    /// every newly observed event in chronological order.
    #[instrument(skip_all, fields(stack = %stack.name, wait = wait))]
    pub fn delete<F: FnMut(&StackEvent)>(
        &self,
        stack: &Stack,
        wait: bool,
        on_event: F,
    ) -> Result<DeleteOutcome> {
        self.client
            .delete_stack(&stack.stack_id)
            .with_context(|| format!("delete {}", stack.name))?;
        debug!("delete requested");
        if !wait {
            return Ok(DeleteOutcome::Requested);
        }

        let status = self.wait(stack, on_event)?;
        if !is_successful(&status) {
            return Err(UnsuccessfulDeleteError {
                name: stack.name.clone(),
                status,
            }
            .into());
        }
        Ok(DeleteOutcome::Completed { status })
    }

    /// Poll until the status leaves the in-progress set and return it.
    ///
    /// The first poll reports only the most recent existing event; every
    /// later poll reports the events not seen before. No timeout applies.
    pub fn wait<F: FnMut(&StackEvent)>(&self, stack: &Stack, mut on_event: F) -> Result<String> {
        let mut status = self.status(stack)?;
        let initial = self.events(stack)?;
        let mut seen: HashSet<String> = initial.iter().map(|e| e.event_id.clone()).collect();
        if let Some(latest) = initial.first() {
            on_event(latest);
        }

        let mut polls = 0u32;
        while is_in_progress(&status) {
            let events = self.events(stack)?;
            for event in events.iter().rev() {
                if seen.insert(event.event_id.clone()) {
                    on_event(event);
                }
            }
            status = self.status(stack)?;
            polls += 1;
            debug!(polls, status = %status, "polled stack");
            if is_in_progress(&status) {
                thread::sleep(self.poll_interval);
            }
        }
        Ok(status)
    }

    fn describe(&self, stack: &Stack) -> Result<StackDescriptor> {
        self.client
            .describe_stack(&stack.stack_id)
            .with_context(|| format!("describe {}", stack.name))
    }
}

/// `"<logical id> - <status>"`, with ` - <reason>` appended when present.
pub fn format_event(event: &StackEvent) -> String {
    match event.resource_status_reason.as_deref() {
        Some(reason) if !reason.is_empty() => format!(
            "{} - {} - {}",
            event.logical_resource_id, event.resource_status, reason
        ),
        _ => format!("{} - {}", event.logical_resource_id, event.resource_status),
    }
}

/// Default event sink for the CLI.
pub fn log_event(event: &StackEvent) {
    info!("{}", format_event(event));
}
