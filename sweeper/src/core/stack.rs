//! In-memory snapshot of a remote stack.
//!
//! A [`Stack`] is built once per listing pass and holds only data that does not
//! change while the sweep runs. Status, events and resources are fetched fresh
//! through [`crate::io::lifecycle::StackLifecycle`] because they move while a
//! delete is in flight.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Statuses that mean the last stack operation is still running.
pub const IN_PROGRESS_STATUSES: &[&str] = &["DELETE_IN_PROGRESS"];

/// Terminal statuses that count as a successful outcome.
pub const SUCCESSFUL_STATUSES: &[&str] = &[
    "CREATE_COMPLETE",
    "UPDATE_COMPLETE",
    "IMPORT_COMPLETE",
    "DELETE_COMPLETE",
];

pub fn is_in_progress(status: &str) -> bool {
    IN_PROGRESS_STATUSES.contains(&status)
}

pub fn is_successful(status: &str) -> bool {
    SUCCESSFUL_STATUSES.contains(&status)
}

/// Record left on a stack by the strategy that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    /// `describe()` output of the marking strategy.
    pub strategy: String,
    /// Human-readable explanation of why the stack was selected.
    pub reason: String,
}

impl Mark {
    pub fn new(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }
}

/// A root (non-nested) stack as seen during a listing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub stack_id: String,
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at` when the stack was never updated.
    pub last_updated_at: DateTime<Utc>,
    marked_by: Vec<Mark>,
}

impl Stack {
    pub fn new(
        stack_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack_id: stack_id.into(),
            name: name.into(),
            parameters: BTreeMap::new(),
            tags: BTreeMap::new(),
            created_at,
            last_updated_at: created_at,
            marked_by: Vec::new(),
        }
    }

    pub fn with_last_updated_at(mut self, last_updated_at: DateTime<Utc>) -> Self {
        self.last_updated_at = last_updated_at;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Append a mark. Marks are never removed.
    pub fn mark(&mut self, mark: Mark) {
        self.marked_by.push(mark);
    }

    pub fn marked_by(&self) -> &[Mark] {
        &self.marked_by
    }

    /// One reason per mark, in the order the marks were recorded.
    pub fn mark_reasons(&self) -> Vec<String> {
        self.marked_by
            .iter()
            .map(|mark| mark.reason.clone())
            .collect()
    }
}
