//! One sweep: list, select, report and (optionally) delete.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument};

use crate::core::stack::Stack;
use crate::core::strategy::{Strategy, evaluate};
use crate::io::cloudformation::{CloudFormation, StackEvent, list_stacks};
use crate::io::lifecycle::{DEFAULT_POLL_INTERVAL, StackLifecycle};

/// What to do with the stacks a strategy selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    /// Without this the sweep only reports.
    pub delete: bool,
    /// Wait for each delete to settle before moving on.
    pub wait: bool,
    pub disable_termination_protection: bool,
    pub poll_interval: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            delete: false,
            wait: true,
            disable_termination_protection: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStack {
    pub name: String,
    pub stack_id: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFailure {
    pub name: String,
    pub error: String,
}

/// Summary of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Root stacks considered.
    pub total: usize,
    /// Selected stacks, in listing order.
    pub selected: Vec<SelectedStack>,
    /// Stacks whose delete was requested (and awaited, when waiting).
    pub deleted: Vec<String>,
    pub failures: Vec<StackFailure>,
}

impl SweepOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// List root stacks, select with `strategy` and delete when asked to.
///
/// A listing failure aborts the sweep. Failures on individual stacks are
/// logged, recorded in the outcome and do not stop the remaining deletes.
#[instrument(skip_all, fields(delete = options.delete, wait = options.wait))]
pub fn run_sweep<C, S, F>(
    client: &C,
    strategy: &mut S,
    options: &SweepOptions,
    mut on_event: F,
) -> Result<SweepOutcome>
where
    C: CloudFormation + ?Sized,
    S: Strategy + ?Sized,
    F: FnMut(&StackEvent),
{
    let stacks = list_stacks(client)?;
    let total = stacks.len();
    let candidates = evaluate(strategy, stacks);
    info!(
        "{} stacks (of {}) identified for removal",
        candidates.len(),
        total
    );

    let selected: Vec<SelectedStack> = candidates
        .iter()
        .map(|stack| {
            let reasons = stack.mark_reasons();
            debug!("{} selected for removal: {}", stack.name, reasons.join(", "));
            SelectedStack {
                name: stack.name.clone(),
                stack_id: stack.stack_id.clone(),
                reasons,
            }
        })
        .collect();

    let mut outcome = SweepOutcome {
        total,
        selected,
        ..SweepOutcome::default()
    };
    if !options.delete {
        return Ok(outcome);
    }

    let lifecycle = StackLifecycle::new(client).with_poll_interval(options.poll_interval);
    for stack in &candidates {
        match remove_stack(&lifecycle, stack, options, &mut on_event) {
            Ok(()) => outcome.deleted.push(stack.name.clone()),
            Err(err) => {
                error!(stack = %stack.name, "{err:#}");
                outcome.failures.push(StackFailure {
                    name: stack.name.clone(),
                    error: format!("{err:#}"),
                });
            }
        }
    }
    Ok(outcome)
}

fn remove_stack<C, F>(
    lifecycle: &StackLifecycle<'_, C>,
    stack: &Stack,
    options: &SweepOptions,
    on_event: F,
) -> Result<()>
where
    C: CloudFormation + ?Sized,
    F: FnMut(&StackEvent),
{
    if options.disable_termination_protection
        && lifecycle
            .termination_protection(stack)
            .context("check termination protection")?
    {
        info!("Disabling termination protection on {}", stack.name);
        lifecycle.disable_termination_protection(stack)?;
    }
    lifecycle.delete(stack, options.wait, on_event)?;
    Ok(())
}
