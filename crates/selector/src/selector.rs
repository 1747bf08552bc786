//! Selector chains and the engine that runs them.
//!
//! A [`Selector`] is an immutable list of steps applied left to right. An axis
//! step enumerates candidates around the current node; name tests and
//! predicates narrow them; whatever survives the last step is selected.
//! Cloning a selector or appending to it never touches the original chain.

use crate::axes::{self, Axis, Walk};
use crate::context::TraversalContext;
use crate::error::SelectError;
use std::fmt;
use std::rc::Rc;
use thicket_expr::{ExprError, Expression, FunctionRegistry, Value};
use thicket_tree::{NodeName, TreeNode};
use thicket_types::Numeric;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameTest<Name> {
    /// `*`
    Any,
    Named(Name),
}

impl<Name: PartialEq> NameTest<Name> {
    pub fn matches(&self, name: &Name) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Named(expected) => expected == name,
        }
    }
}

/// A bracketed predicate: the compiled expression plus the text it came from,
/// which error messages quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub expression: Expression,
    pub text: String,
}

impl Predicate {
    pub fn new(expression: Expression) -> Self {
        let text = expression.to_string();
        Self { expression, text }
    }

    pub fn with_text(expression: Expression, text: impl Into<String>) -> Self {
        Self {
            expression,
            text: text.into(),
        }
    }

    /// Whether `value` admits the candidate at `position`. Numbers are position
    /// tests; every other value is taken for its truth.
    pub fn accepts(value: &Value, position: usize) -> bool {
        match value {
            Value::Number(n) => n.equals_position(position),
            other => other.to_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step<Name> {
    Axis(Axis),
    Name(NameTest<Name>),
    Predicate(Predicate),
}

pub struct Selector<N: TreeNode> {
    steps: Rc<[Step<N::Name>]>,
}

impl<N: TreeNode> Clone for Selector<N> {
    fn clone(&self) -> Self {
        Self {
            steps: Rc::clone(&self.steps),
        }
    }
}

impl<N: TreeNode> fmt::Debug for Selector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.steps.iter()).finish()
    }
}

impl<N: TreeNode> PartialEq for Selector<N> {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl<N: TreeNode> Default for Selector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> Selector<N> {
    /// The empty chain, which selects the node it is applied to.
    pub fn new() -> Self {
        Self {
            steps: Rc::from(Vec::new()),
        }
    }

    pub fn from_steps(steps: Vec<Step<N::Name>>) -> Self {
        Self {
            steps: Rc::from(steps),
        }
    }

    pub fn steps(&self) -> &[Step<N::Name>] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn with(&self, step: Step<N::Name>) -> Self {
        let mut steps = self.steps.to_vec();
        steps.push(step);
        Self::from_steps(steps)
    }

    /// A new selector running `other` on everything this one selects.
    pub fn append(&self, other: &Selector<N>) -> Self {
        let steps: Vec<_> = self.steps.iter().chain(other.steps.iter()).cloned().collect();
        Self::from_steps(steps)
    }

    pub fn axis(&self, axis: Axis) -> Self {
        self.with(Step::Axis(axis))
    }

    pub fn root(&self) -> Self {
        self.axis(Axis::Root)
    }

    pub fn self_node(&self) -> Self {
        self.axis(Axis::SelfAxis)
    }

    pub fn children(&self) -> Self {
        self.axis(Axis::Child)
    }

    pub fn descendants(&self) -> Self {
        self.axis(Axis::Descendant)
    }

    pub fn descendants_or_self(&self) -> Self {
        self.axis(Axis::DescendantOrSelf)
    }

    pub fn parent(&self) -> Self {
        self.axis(Axis::Parent)
    }

    pub fn ancestors(&self) -> Self {
        self.axis(Axis::Ancestor)
    }

    pub fn ancestors_or_self(&self) -> Self {
        self.axis(Axis::AncestorOrSelf)
    }

    pub fn first_child(&self) -> Self {
        self.axis(Axis::FirstChild)
    }

    pub fn last_child(&self) -> Self {
        self.axis(Axis::LastChild)
    }

    pub fn following_siblings(&self) -> Self {
        self.axis(Axis::FollowingSibling)
    }

    pub fn preceding_siblings(&self) -> Self {
        self.axis(Axis::PrecedingSibling)
    }

    pub fn following(&self) -> Self {
        self.axis(Axis::Following)
    }

    pub fn preceding(&self) -> Self {
        self.axis(Axis::Preceding)
    }

    pub fn named(&self, name: N::Name) -> Self {
        self.with(Step::Name(NameTest::Named(name)))
    }

    pub fn any_name(&self) -> Self {
        self.with(Step::Name(NameTest::Any))
    }

    pub fn expression(&self, expression: Expression) -> Self {
        self.with(Step::Predicate(Predicate::new(expression)))
    }

    pub fn predicate(&self, predicate: Predicate) -> Self {
        self.with(Step::Predicate(predicate))
    }

    /// Shorthand for a `[position]` predicate.
    pub fn position(&self, position: i64) -> Self {
        self.expression(Expression::Number(Numeric::from(position)))
    }

    /// Runs the chain from `root`, reporting matches through `ctx`. Returns
    /// `root` itself; selection happens only as a side effect on the context.
    pub fn apply(&self, root: &N, mut ctx: TraversalContext<'_, N>) -> Result<N, SelectError> {
        self.run(root, &mut ctx)?;
        Ok(root.clone())
    }

    /// Every distinct node the chain selects from `root`, in traversal order.
    pub fn select(&self, root: &N, functions: &FunctionRegistry<N>) -> Result<Vec<N>, SelectError> {
        let mut ctx = TraversalContext::new(functions);
        self.run(root, &mut ctx)?;
        Ok(ctx.into_selected())
    }

    /// Like [`Selector::select`] but stops at the first match.
    pub fn select_first(
        &self,
        root: &N,
        functions: &FunctionRegistry<N>,
    ) -> Result<Option<N>, SelectError> {
        let mut ctx = TraversalContext::builder(functions)
            .finisher(|progress| progress.selected >= 1)
            .build();
        self.run(root, &mut ctx)?;
        Ok(ctx.into_selected().into_iter().next())
    }

    pub(crate) fn run(&self, root: &N, ctx: &mut TraversalContext<'_, N>) -> Result<(), SelectError> {
        ctx.prepare(self.steps.len());
        self.step(0, root, ctx)
    }

    fn step(&self, index: usize, node: &N, ctx: &mut TraversalContext<'_, N>) -> Result<(), SelectError> {
        if ctx.is_finished() {
            return Ok(());
        }
        let Some(step) = self.steps.get(index) else {
            ctx.selected(node);
            return Ok(());
        };
        match step {
            Step::Axis(axis) => {
                ctx.reset_positions(index + 1..self.segment_end(index + 1));
                axes::traverse(*axis, node, &mut |candidate: N| {
                    if ctx.is_finished() {
                        return Ok(Walk::Stop);
                    }
                    if !ctx.test(&candidate) {
                        return Ok(Walk::Prune);
                    }
                    ctx.set_node(&candidate);
                    self.step(index + 1, &candidate, ctx)?;
                    Ok(Walk::Continue)
                })
            }
            Step::Name(test) => {
                if test.matches(&node.name()) {
                    self.step(index + 1, node, ctx)
                } else {
                    Ok(())
                }
            }
            Step::Predicate(predicate) => {
                let position = ctx.advance(index);
                let value = ctx
                    .evaluate(&predicate.expression, node, position)
                    .map_err(|source| predicate_error(predicate, source))?;
                if Predicate::accepts(&value, position) {
                    self.step(index + 1, node, ctx)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// The index of the next axis step at or after `from`, or the chain length.
    fn segment_end(&self, from: usize) -> usize {
        self.steps[from.min(self.steps.len())..]
            .iter()
            .position(|step| matches!(step, Step::Axis(_)))
            .map_or(self.steps.len(), |offset| from + offset)
    }
}

fn predicate_error(predicate: &Predicate, source: ExprError) -> SelectError {
    match source {
        ExprError::FunctionNotFound { name } => SelectError::FunctionNotFound {
            function: name,
            predicate: predicate.text.clone(),
        },
        source => SelectError::Evaluation {
            predicate: predicate.text.clone(),
            source,
        },
    }
}

/// Canonical query text. Every axis is spelled out, and a step without a name
/// test gets `*`, so the output parses back to an equivalent chain.
impl<N: TreeNode> fmt::Display for Selector<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut needs_separator = false;
        let mut needs_test = false;
        for step in self.steps.iter() {
            match step {
                Step::Axis(Axis::Root) => {
                    if needs_test {
                        f.write_str("*")?;
                    }
                    f.write_str("/")?;
                    needs_separator = false;
                    needs_test = false;
                }
                Step::Axis(axis) => {
                    if needs_test {
                        f.write_str("*")?;
                    }
                    if needs_separator {
                        f.write_str("/")?;
                    }
                    write!(f, "{axis}")?;
                    needs_separator = true;
                    needs_test = true;
                }
                Step::Name(test) => {
                    if !needs_test {
                        // A name test with no axis of its own applies to the current node.
                        if needs_separator {
                            f.write_str("/")?;
                        }
                        write!(f, "{}", Axis::SelfAxis)?;
                    }
                    match test {
                        NameTest::Any => f.write_str("*")?,
                        NameTest::Named(name) => write!(f, "{name}")?,
                    }
                    needs_separator = true;
                    needs_test = false;
                }
                Step::Predicate(predicate) => {
                    if needs_test {
                        f.write_str("*")?;
                    } else if !needs_separator {
                        write!(f, "{}*", Axis::SelfAxis)?;
                    }
                    write!(f, "[{}]", predicate.expression)?;
                    needs_separator = true;
                    needs_test = false;
                }
            }
        }
        if needs_test {
            f.write_str("*")?;
        } else if self.steps.is_empty() {
            write!(f, "{}*", Axis::SelfAxis)?;
        }
        Ok(())
    }
}

/// Builds a name test from query text using the tree's default name factory.
pub fn name_test<Name: NodeName>(text: &str) -> NameTest<Name> {
    match text {
        "*" => NameTest::Any,
        other => NameTest::Named(Name::from_query(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Finisher;
    use thicket_expr::BinaryOperator;
    use thicket_tree::{ElementNode, fixtures};

    fn select(selector: &Selector<ElementNode>, root: &ElementNode) -> Vec<String> {
        let registry = FunctionRegistry::with_builtins();
        fixtures::ids(&selector.select(root, &registry).unwrap())
    }

    fn id_equals(id: &str) -> Expression {
        Expression::binary(
            Expression::attribute("id"),
            BinaryOperator::Equals,
            Expression::text(id),
        )
    }

    #[test]
    fn test_empty_chain_selects_start_node() {
        let root = fixtures::forest();
        assert_eq!(select(&Selector::new(), &root), ["-"]);
    }

    #[test]
    fn test_named_children() {
        let root = fixtures::forest();
        let branch = fixtures::find(&root, "2").unwrap();
        let selector = Selector::new().children().named("leaf".to_string());
        assert_eq!(select(&selector, &branch), ["c", "f"]);
    }

    #[test]
    fn test_position_counts_per_axis_application() {
        let root = fixtures::forest();
        // The second child of every branch.
        let selector = Selector::new().children().children().position(2);
        assert_eq!(select(&selector, &root), ["b", "d"]);
    }

    #[test]
    fn test_position_counts_after_name_test() {
        let root = fixtures::forest();
        let branch = fixtures::find(&root, "2").unwrap();
        let selector = Selector::new().children().named("leaf".to_string()).position(2);
        assert_eq!(select(&selector, &branch), ["f"]);
    }

    #[test]
    fn test_stacked_predicates_count_survivors() {
        let root = fixtures::forest();
        let selector = Selector::new()
            .descendants()
            .named("leaf".to_string())
            .expression(Expression::binary(
                Expression::attribute("id"),
                BinaryOperator::NotEquals,
                Expression::text("a"),
            ))
            .position(3);
        // Leaves other than `a`, in document order: b c e f g.
        assert_eq!(select(&selector, &root), ["e"]);
    }

    #[test]
    fn test_out_of_range_positions_select_nothing() {
        let root = fixtures::flat(3);
        for position in [-1, 0, 4] {
            let selector = Selector::new().children().position(position);
            assert!(selector.select(&root, &FunctionRegistry::with_builtins()).unwrap().is_empty());
        }
    }

    #[test]
    fn test_predicate_truth() {
        let root = fixtures::forest();
        let selector = Selector::new().descendants().expression(id_equals("d"));
        assert_eq!(select(&selector, &root), ["d"]);
        let text_truth = Selector::new().children().expression(Expression::attribute("id"));
        assert_eq!(select(&text_truth, &root), ["1", "2", "3"]);
    }

    #[test]
    fn test_duplicates_are_selected_once() {
        let root = fixtures::forest();
        let selector = Selector::new().descendants().named("leaf".to_string()).parent();
        assert_eq!(select(&selector, &root), ["1", "2", "d", "3"]);
    }

    #[test]
    fn test_absolute_selector_starts_at_root() {
        let root = fixtures::forest();
        let leaf = fixtures::find(&root, "e").unwrap();
        let selector = Selector::new().root().children().position(3);
        assert_eq!(select(&selector, &leaf), ["3"]);
    }

    #[test]
    fn test_unknown_function_names_predicate() {
        let root = fixtures::forest();
        let selector = Selector::new()
            .children()
            .expression(Expression::call("nope", vec![]));
        let err = selector.select(&root, &FunctionRegistry::with_builtins()).unwrap_err();
        assert_eq!(
            err,
            SelectError::FunctionNotFound {
                function: "nope".to_string(),
                predicate: "nope()".to_string(),
            }
        );
    }

    #[test]
    fn test_conversion_failure_aborts() {
        let root = fixtures::forest();
        let selector = Selector::new().descendants().expression(Expression::binary(
            Expression::text("abc"),
            BinaryOperator::LessThan,
            Expression::attribute("id"),
        ));
        let err = selector.select(&root, &FunctionRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, SelectError::Evaluation { .. }), "{err:?}");
    }

    #[test]
    fn test_finisher_stops_selection() {
        let root = fixtures::forest();
        let registry = FunctionRegistry::with_builtins();
        let mut seen = Vec::new();
        let ctx = TraversalContext::builder(&registry)
            .finisher(Finisher::after(2))
            .on_selected(|n: &ElementNode| seen.push(n.clone()))
            .build();
        let selector = Selector::new().descendants().named("leaf".to_string());
        let returned = selector.apply(&root, ctx).unwrap();
        assert_eq!(returned, root);
        assert_eq!(fixtures::ids(&seen), ["a", "b"]);
    }

    #[test]
    fn test_filter_prunes_subtrees() {
        let root = fixtures::forest();
        let registry = FunctionRegistry::with_builtins();
        let mut seen = Vec::new();
        let ctx = TraversalContext::builder(&registry)
            .filter(|n: &ElementNode| n.attribute("id").as_deref() != Some("2"))
            .on_selected(|n: &ElementNode| seen.push(n.clone()))
            .build();
        Selector::new().descendants().named("leaf".to_string()).apply(&root, ctx).unwrap();
        assert_eq!(fixtures::ids(&seen), ["a", "b", "g"]);
    }

    #[test]
    fn test_select_first() {
        let root = fixtures::forest();
        let registry = FunctionRegistry::with_builtins();
        let first = Selector::new().preceding().select_first(
            &fixtures::find(&root, "f").unwrap(),
            &registry,
        );
        assert_eq!(first.unwrap().and_then(|n| n.attribute("id")), Some("e".to_string()));
    }

    #[test]
    fn test_append_leaves_prefix_untouched() {
        let prefix: Selector<ElementNode> = Selector::new().children();
        let suffix = Selector::new().named("leaf".to_string());
        let joined = prefix.append(&suffix);
        assert_eq!(prefix.steps().len(), 1);
        assert_eq!(joined.steps().len(), 2);
    }

    #[test]
    fn test_display() {
        let selector: Selector<ElementNode> = Selector::new()
            .root()
            .descendants_or_self()
            .named("branch".to_string())
            .expression(id_equals("2"))
            .children()
            .position(2);
        assert_eq!(
            selector.to_string(),
            "/descendant-or-self::branch[@id = '2']/child::*[2]"
        );
        let bare: Selector<ElementNode> = Selector::new().named("leaf".to_string()).position(1);
        assert_eq!(bare.to_string(), "self::leaf[1]");
        assert_eq!(Selector::<ElementNode>::new().to_string(), "self::*");
        assert_eq!(Selector::<ElementNode>::new().root().to_string(), "/");
    }

    #[test]
    fn test_name_test_from_query() {
        assert_eq!(name_test::<String>("*"), NameTest::Any);
        assert_eq!(name_test::<String>("leaf"), NameTest::Named("leaf".to_string()));
    }
}
