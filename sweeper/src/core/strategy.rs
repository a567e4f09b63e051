//! The removal predicate abstraction shared by every strategy.

use crate::core::stack::Stack;

/// Decides whether a stack qualifies for removal.
///
/// Evaluation is sequential: `should_remove` takes `&mut self` so stateful
/// strategies (see [`crate::core::combinators::LimitedBy`]) can count results
/// without interior mutability, and `&mut Stack` so selecting leaf strategies
/// can record a [`crate::core::stack::Mark`]. Nothing else may be mutated.
pub trait Strategy {
    fn should_remove(&mut self, stack: &mut Stack) -> bool;

    /// Echo of the strategy's configuration, used for diagnostics.
    fn describe(&self) -> String;

    /// Why this strategy selected `stack`.
    ///
    /// Only strategies that mark stacks return `Some`; combinators never do.
    fn mark_reason(&self, _stack: &Stack) -> Option<String> {
        None
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        (**self).should_remove(stack)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn mark_reason(&self, stack: &Stack) -> Option<String> {
        (**self).mark_reason(stack)
    }
}

/// Keep the stacks `strategy` selects, preserving their order.
pub fn evaluate<S: Strategy + ?Sized>(strategy: &mut S, stacks: Vec<Stack>) -> Vec<Stack> {
    stacks
        .into_iter()
        .filter_map(|mut stack| strategy.should_remove(&mut stack).then_some(stack))
        .collect()
}

/// Human-readable reasons for a selected stack, one per recorded mark.
pub fn reasons_for(stack: &Stack) -> Vec<String> {
    stack.mark_reasons()
}

/// Render nested strategies as `[A, B]` for `describe()` output.
pub(crate) fn describe_all(strategies: &[Box<dyn Strategy>]) -> String {
    let parts: Vec<String> = strategies.iter().map(|s| s.describe()).collect();
    format!("[{}]", parts.join(", "))
}
