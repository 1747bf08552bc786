//! Per-call traversal state.
//!
//! A [`TraversalContext`] is built fresh for every `apply`/`map` call and
//! consumed by it. It owns everything that changes while a selector runs: the
//! predicate position slots, the set of nodes already selected and the latched
//! finished flag. Selectors themselves stay immutable and shareable.

use std::collections::HashSet;
use std::ops::Range;
use thicket_expr::{EvaluationContext, ExprError, Expression, FunctionRegistry, Value, evaluate};
use thicket_tree::TreeNode;
use thicket_types::NumericConfig;

/// Counters handed to a finisher before each candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Candidates that passed the filter so far.
    pub visited: usize,
    /// Distinct nodes selected so far.
    pub selected: usize,
}

/// Ready-made finisher conditions.
pub struct Finisher;

impl Finisher {
    /// Finishes once `limit` nodes have been selected.
    pub fn after(limit: usize) -> impl FnMut(&Progress) -> bool {
        move |progress| progress.selected >= limit
    }
}

type Filter<'c, N> = Box<dyn FnMut(&N) -> bool + 'c>;
type FinishCondition<'c> = Box<dyn FnMut(&Progress) -> bool + 'c>;
type SelectedSink<'c, N> = Box<dyn FnMut(&N) + 'c>;

pub struct TraversalContext<'c, N> {
    functions: &'c FunctionRegistry<N>,
    numeric: NumericConfig,
    filter: Option<Filter<'c, N>>,
    finisher: Option<FinishCondition<'c>>,
    on_selected: Option<SelectedSink<'c, N>>,
    finished: bool,
    progress: Progress,
    positions: Vec<usize>,
    current: Option<N>,
    seen: HashSet<N>,
    selected: Vec<N>,
}

pub struct TraversalContextBuilder<'c, N> {
    functions: &'c FunctionRegistry<N>,
    numeric: NumericConfig,
    filter: Option<Filter<'c, N>>,
    finisher: Option<FinishCondition<'c>>,
    on_selected: Option<SelectedSink<'c, N>>,
}

impl<'c, N> TraversalContextBuilder<'c, N> {
    /// Candidates rejected here are never handed on. On axes that walk whole
    /// subtrees downward, their descendants are skipped too.
    pub fn filter(mut self, filter: impl FnMut(&N) -> bool + 'c) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Consulted before every candidate; once it returns true the traversal
    /// stops and nothing more is selected.
    pub fn finisher(mut self, finisher: impl FnMut(&Progress) -> bool + 'c) -> Self {
        self.finisher = Some(Box::new(finisher));
        self
    }

    /// Called once for every distinct node the whole chain accepts.
    pub fn on_selected(mut self, sink: impl FnMut(&N) + 'c) -> Self {
        self.on_selected = Some(Box::new(sink));
        self
    }

    pub fn numeric(mut self, numeric: NumericConfig) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn build(self) -> TraversalContext<'c, N> {
        TraversalContext {
            functions: self.functions,
            numeric: self.numeric,
            filter: self.filter,
            finisher: self.finisher,
            on_selected: self.on_selected,
            finished: false,
            progress: Progress::default(),
            positions: Vec::new(),
            current: None,
            seen: HashSet::new(),
            selected: Vec::new(),
        }
    }
}

impl<'c, N> TraversalContext<'c, N> {
    pub fn builder(functions: &'c FunctionRegistry<N>) -> TraversalContextBuilder<'c, N> {
        TraversalContextBuilder {
            functions,
            numeric: NumericConfig::default(),
            filter: None,
            finisher: None,
            on_selected: None,
        }
    }

    /// A context with no filter, no finisher and default numerics.
    pub fn new(functions: &'c FunctionRegistry<N>) -> Self {
        Self::builder(functions).build()
    }

    pub fn functions(&self) -> &'c FunctionRegistry<N> {
        self.functions
    }

    pub fn numeric(&self) -> NumericConfig {
        self.numeric
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// The candidate most recently accepted by an axis.
    pub fn node(&self) -> Option<&N> {
        self.current.as_ref()
    }

    /// True once the finisher has fired. The answer never reverts to false.
    pub fn is_finished(&mut self) -> bool {
        if !self.finished {
            if let Some(finisher) = self.finisher.as_mut() {
                self.finished = finisher(&self.progress);
            }
        }
        self.finished
    }

    fn assert_running(&self, operation: &str) {
        assert!(
            !self.finished,
            "TraversalContext::{operation} called after the traversal finished"
        );
    }

    pub(crate) fn prepare(&mut self, slots: usize) {
        self.positions = vec![0; slots];
    }

    /// Runs the filter over an axis candidate.
    pub fn test(&mut self, candidate: &N) -> bool {
        self.assert_running("test");
        let accepted = self.filter.as_mut().is_none_or(|filter| filter(candidate));
        if accepted {
            self.progress.visited += 1;
        }
        accepted
    }

    pub fn set_node(&mut self, node: &N)
    where
        N: Clone,
    {
        self.assert_running("set_node");
        self.current = Some(node.clone());
    }

    pub(crate) fn reset_positions(&mut self, slots: Range<usize>) {
        for slot in &mut self.positions[slots] {
            *slot = 0;
        }
    }

    /// Counts one more candidate for the predicate in `slot` and returns its
    /// 1-based position.
    pub(crate) fn advance(&mut self, slot: usize) -> usize {
        self.positions[slot] += 1;
        self.positions[slot]
    }
}

impl<N: TreeNode> TraversalContext<'_, N> {
    /// Records a node that satisfied the whole chain. Repeats are ignored.
    pub fn selected(&mut self, node: &N) {
        self.assert_running("selected");
        if !self.seen.insert(node.clone()) {
            return;
        }
        log::trace!("selected {node:?}");
        self.progress.selected += 1;
        if let Some(sink) = self.on_selected.as_mut() {
            sink(node);
        }
        self.selected.push(node.clone());
    }

    /// Evaluates `expression` with `node` as the context node at `position`.
    pub fn evaluate(
        &mut self,
        expression: &Expression,
        node: &N,
        position: usize,
    ) -> Result<Value, ExprError> {
        self.assert_running("evaluate");
        let e_ctx = EvaluationContext::new(node, position, self.functions, self.numeric);
        evaluate(expression, &e_ctx)
    }

    /// Selected nodes in the order they were first reported.
    pub fn into_selected(self) -> Vec<N> {
        self.selected
    }
}
