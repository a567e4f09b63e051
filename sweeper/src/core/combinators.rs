//! Strategies built from other strategies.

use crate::core::stack::Stack;
use crate::core::strategy::{Strategy, describe_all};

/// Selects only when every nested strategy selects. Empty selects everything.
pub struct ConjunctionOf {
    strategies: Vec<Box<dyn Strategy>>,
}

impl ConjunctionOf {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }
}

impl Strategy for ConjunctionOf {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        // `all` stops at the first false, so later strategies never mark.
        self.strategies
            .iter_mut()
            .all(|strategy| strategy.should_remove(stack))
    }

    fn describe(&self) -> String {
        format!("ConjunctionOf({})", describe_all(&self.strategies))
    }
}

/// Selects when any nested strategy selects. Empty selects nothing.
pub struct DisjunctionOf {
    strategies: Vec<Box<dyn Strategy>>,
}

impl DisjunctionOf {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }
}

impl Strategy for DisjunctionOf {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        self.strategies
            .iter_mut()
            .any(|strategy| strategy.should_remove(stack))
    }

    fn describe(&self) -> String {
        format!("DisjunctionOf({})", describe_all(&self.strategies))
    }
}

/// Caps how many stacks `inner` may select over the lifetime of this instance.
///
/// Once `limit` positive results have been returned, `inner` is no longer
/// evaluated at all, so its marks cannot leak onto stacks past the cap. Only
/// this strategy's own positive results are counted: when nested under a
/// conjunction, a slot is consumed even if a sibling later vetoes the stack.
pub struct LimitedBy {
    limit: u32,
    selected: u32,
    inner: Box<dyn Strategy>,
}

impl LimitedBy {
    pub fn new(limit: u32, inner: Box<dyn Strategy>) -> Self {
        Self {
            limit,
            selected: 0,
            inner,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Positive results handed out so far.
    pub fn selected(&self) -> u32 {
        self.selected
    }

    pub fn inner(&self) -> &dyn Strategy {
        self.inner.as_ref()
    }
}

impl Strategy for LimitedBy {
    fn should_remove(&mut self, stack: &mut Stack) -> bool {
        if self.selected >= self.limit {
            return false;
        }
        let result = self.inner.should_remove(stack);
        if result {
            self.selected += 1;
        }
        result
    }

    fn describe(&self) -> String {
        format!("LimitedBy({}, {})", self.limit, self.inner.describe())
    }
}
