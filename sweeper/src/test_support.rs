//! Test-only fixtures: deterministic stacks, canned strategies and a scripted provider.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};

use crate::core::stack::Stack;
use crate::core::strategy::Strategy;
use crate::io::cloudformation::{
    CloudFormation, ProviderError, StackDescriptor, StackEvent, StackResource,
};

pub const STACK_NAME: &str = "MyStack";
pub const STACK_ID: &str = "arn:aws:cloudformation:ap-southeast-2:123456789012:stack/MyStack/bd6129c0-de8c-11e9-9c70-0ac26335768c";

/// UTC timestamp shorthand.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid timestamp")
}

pub fn stack_id(name: &str) -> String {
    format!(
        "arn:aws:cloudformation:ap-southeast-2:123456789012:stack/{name}/bd6129c0-de8c-11e9-9c70-0ac26335768c"
    )
}

/// A stack created (and last updated) on 2020-01-01 with no tags.
pub fn stack(name: &str) -> Stack {
    Stack::new(stack_id(name), name, utc(2020, 1, 1, 0, 0, 0))
}

/// The stack the lifecycle tests operate on.
pub fn fixture_stack() -> Stack {
    Stack::new(STACK_ID, STACK_NAME, utc(2020, 1, 1, 0, 0, 0))
        .with_parameter("Hello", "You")
        .with_tag("MyTag", "TagValue")
}

pub fn descriptor(name: &str) -> StackDescriptor {
    StackDescriptor {
        stack_id: stack_id(name),
        stack_name: name.to_string(),
        stack_status: "CREATE_COMPLETE".to_string(),
        creation_time: utc(2020, 1, 1, 0, 0, 0),
        last_updated_time: Some(utc(2020, 1, 1, 0, 0, 0)),
        tags: Vec::new(),
        parameters: Vec::new(),
        parent_id: None,
        root_id: None,
        enable_termination_protection: false,
    }
}

pub fn nested_descriptor(name: &str, parent: &str) -> StackDescriptor {
    let parent_id = stack_id(parent);
    StackDescriptor {
        parent_id: Some(parent_id.clone()),
        root_id: Some(parent_id),
        ..descriptor(name)
    }
}

pub fn event(event_id: &str, logical_resource_id: &str, resource_status: &str) -> StackEvent {
    StackEvent {
        event_id: event_id.to_string(),
        logical_resource_id: logical_resource_id.to_string(),
        resource_status: resource_status.to_string(),
        resource_status_reason: None,
        resource_type: None,
        timestamp: None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AlwaysTrue;

impl Strategy for AlwaysTrue {
    fn should_remove(&mut self, _stack: &mut Stack) -> bool {
        true
    }

    fn describe(&self) -> String {
        "AlwaysTrue".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AlwaysFalse;

impl Strategy for AlwaysFalse {
    fn should_remove(&mut self, _stack: &mut Stack) -> bool {
        false
    }

    fn describe(&self) -> String {
        "AlwaysFalse".to_string()
    }
}

/// Returns true, false, true, ... starting with true.
#[derive(Debug, Default)]
pub struct Alternating {
    calls: u32,
}

impl Alternating {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for Alternating {
    fn should_remove(&mut self, _stack: &mut Stack) -> bool {
        let result = self.calls % 2 == 0;
        self.calls += 1;
        result
    }

    fn describe(&self) -> String {
        "Alternating".to_string()
    }
}

/// Returns a fixed result and counts how often it was evaluated.
pub struct Counting {
    result: bool,
    calls: Rc<Cell<u32>>,
}

impl Counting {
    /// The strategy plus a handle to its call counter.
    pub fn new(result: bool) -> (Self, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                result,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl Strategy for Counting {
    fn should_remove(&mut self, _stack: &mut Stack) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.result
    }

    fn describe(&self) -> String {
        format!("Counting({})", self.result)
    }
}

/// Provider fake that replays scripted responses and records every call.
///
/// `describe_stack` pops the next scripted status and `describe_stack_events`
/// the next scripted event list; running out of either is an error, which
/// lets tests prove that no polling happens past a terminal status.
#[derive(Default)]
pub struct ScriptedCloudFormation {
    stacks: Vec<StackDescriptor>,
    listing_error: Option<String>,
    statuses: RefCell<VecDeque<String>>,
    events: RefCell<VecDeque<Vec<StackEvent>>>,
    resources: Vec<StackResource>,
    protected: RefCell<BTreeSet<String>>,
    delete_failures: BTreeMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedCloudFormation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stacks(mut self, stacks: Vec<StackDescriptor>) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_listing_error(mut self, message: &str) -> Self {
        self.listing_error = Some(message.to_string());
        self
    }

    pub fn with_statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses
            .borrow_mut()
            .extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn with_events(self, responses: Vec<Vec<StackEvent>>) -> Self {
        self.events.borrow_mut().extend(responses);
        self
    }

    pub fn with_resources<'r>(mut self, resources: impl IntoIterator<Item = (&'r str, &'r str)>) -> Self {
        self.resources = resources
            .into_iter()
            .map(|(logical_id, resource_type)| StackResource {
                logical_resource_id: logical_id.to_string(),
                physical_resource_id: Some(format!("{logical_id}-PHYSICAL-1234")),
                resource_type: resource_type.to_string(),
                resource_status: "UPDATE_COMPLETE".to_string(),
                timestamp: None,
            })
            .collect();
        self
    }

    pub fn with_protected(self, stack_id: &str) -> Self {
        self.protected.borrow_mut().insert(stack_id.to_string());
        self
    }

    pub fn with_delete_failure(mut self, stack_id: &str, message: &str) -> Self {
        self.delete_failures
            .insert(stack_id.to_string(), message.to_string());
        self
    }

    /// Calls in order, formatted `operation:stack_id`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// True when every scripted status and event response was consumed.
    pub fn is_exhausted(&self) -> bool {
        self.statuses.borrow().is_empty() && self.events.borrow().is_empty()
    }

    fn record(&self, operation: &str, stack_id: &str) {
        self.calls
            .borrow_mut()
            .push(format!("{operation}:{stack_id}"));
    }
}

impl CloudFormation for ScriptedCloudFormation {
    fn describe_stacks(&self) -> Result<Vec<StackDescriptor>> {
        self.record("describe_stacks", "*");
        if let Some(message) = &self.listing_error {
            return Err(ProviderError::new("describe-stacks", "*", message.as_str()).into());
        }
        Ok(self.stacks.clone())
    }

    fn describe_stack(&self, stack_id: &str) -> Result<StackDescriptor> {
        self.record("describe_stack", stack_id);
        let status = self
            .statuses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted describe_stack response for {stack_id}"))?;
        let mut found = self
            .stacks
            .iter()
            .find(|d| d.stack_id == stack_id)
            .cloned()
            .unwrap_or_else(|| StackDescriptor {
                stack_id: stack_id.to_string(),
                ..descriptor(STACK_NAME)
            });
        found.stack_status = status;
        found.enable_termination_protection = self.protected.borrow().contains(stack_id);
        Ok(found)
    }

    fn describe_stack_events(&self, stack_id: &str) -> Result<Vec<StackEvent>> {
        self.record("describe_stack_events", stack_id);
        self.events
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted describe_stack_events response for {stack_id}"))
    }

    fn describe_stack_resources(&self, stack_id: &str) -> Result<Vec<StackResource>> {
        self.record("describe_stack_resources", stack_id);
        Ok(self.resources.clone())
    }

    fn delete_stack(&self, stack_id: &str) -> Result<()> {
        self.record("delete_stack", stack_id);
        match self.delete_failures.get(stack_id) {
            Some(message) => Err(ProviderError::new("delete-stack", stack_id, message.as_str()).into()),
            None => Ok(()),
        }
    }

    fn update_termination_protection(&self, stack_id: &str, enabled: bool) -> Result<()> {
        self.record("update_termination_protection", stack_id);
        let mut protected = self.protected.borrow_mut();
        if enabled {
            protected.insert(stack_id.to_string());
        } else {
            protected.remove(stack_id);
        }
        Ok(())
    }
}
