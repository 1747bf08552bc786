//! Identity-preserving rewrites.
//!
//! Matches are collected with an ordinary traversal first. Every match and
//! every ancestor between it and the start node is then marked, and only the
//! marked paths are rebuilt, bottom-up. Anything unmarked is handed back as
//! the very same node.

use crate::context::TraversalContext;
use crate::error::SelectError;
use crate::selector::Selector;
use std::collections::HashSet;
use thicket_tree::Rebuild;

struct Plan<N> {
    matched: HashSet<N>,
    marked: HashSet<N>,
}

impl<N: Rebuild> Plan<N> {
    fn new(root: &N, matches: Vec<N>) -> Self {
        let mut marked = HashSet::new();
        let mut matched = HashSet::new();
        for node in matches {
            let Some(path) = path_to(root, &node) else {
                log::debug!("skipping match outside the rewritten tree: {node:?}");
                continue;
            };
            marked.extend(path);
            matched.insert(node);
        }
        Self { matched, marked }
    }
}

/// `node` and its ancestors up to and including `root`, or `None` when `root`
/// is not among them.
fn path_to<N: Rebuild>(root: &N, node: &N) -> Option<Vec<N>> {
    let mut path = vec![node.clone()];
    let mut current = node.clone();
    while current != *root {
        current = current.parent()?;
        path.push(current.clone());
    }
    Some(path)
}

fn rebuild<N: Rebuild>(node: &N, plan: &Plan<N>, mapper: &mut impl FnMut(&N) -> N) -> N {
    if !plan.marked.contains(node) {
        return node.clone();
    }
    let children = node.children();
    let rebuilt: Vec<N> = children
        .iter()
        .map(|child| rebuild(child, plan, mapper))
        .collect();
    let changed = rebuilt.iter().zip(&children).any(|(new, old)| new != old);
    let updated = if changed {
        node.with_children(rebuilt)
    } else {
        node.clone()
    };
    if plan.matched.contains(node) {
        mapper(&updated)
    } else {
        updated
    }
}

impl<N: Rebuild> Selector<N> {
    /// Replaces every selected node with `mapper(node)` and returns the new
    /// root. A matched node's children are rewritten before it is passed to
    /// `mapper`. When nothing matches, `root` itself comes back.
    pub fn map(
        &self,
        root: &N,
        mut ctx: TraversalContext<'_, N>,
        mut mapper: impl FnMut(&N) -> N,
    ) -> Result<N, SelectError> {
        self.run(root, &mut ctx)?;
        let matches = ctx.into_selected();
        if matches.is_empty() {
            return Ok(root.clone());
        }
        let count = matches.len();
        let plan = Plan::new(root, matches);
        log::debug!("rewriting {count} match(es) along {} marked node(s)", plan.marked.len());
        Ok(rebuild(root, &plan, &mut mapper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_expr::FunctionRegistry;
    use thicket_tree::{ElementNode, TreeNode, fixtures};

    fn map_with(
        selector: &Selector<ElementNode>,
        root: &ElementNode,
        mapper: impl FnMut(&ElementNode) -> ElementNode,
    ) -> ElementNode {
        let registry = FunctionRegistry::with_builtins();
        selector
            .map(root, TraversalContext::new(&registry), mapper)
            .unwrap()
    }

    #[test]
    fn test_rename_second_child() {
        let root = fixtures::flat(3);
        let selector = Selector::new().children().position(2);
        let mapped = map_with(&selector, &root, |n| n.renamed("renamed"));

        assert!(!mapped.shares_element(&root));
        let before = root.children();
        let after = mapped.children();
        assert_eq!(
            after.iter().map(|n| n.name()).collect::<Vec<_>>(),
            ["child1", "renamed", "child3"]
        );
        assert!(after[0].shares_element(&before[0]));
        assert!(!after[1].shares_element(&before[1]));
        assert!(after[2].shares_element(&before[2]));
        // The input is left as it was.
        assert_eq!(root.children()[1].name(), "child2");
    }

    #[test]
    fn test_no_match_returns_same_root() {
        let root = fixtures::forest();
        let selector = Selector::new().children().named("missing".to_string());
        let mapped = map_with(&selector, &root, |n| n.renamed("x"));
        assert_eq!(mapped, root);
    }

    #[test]
    fn test_identity_mapper_keeps_every_reference() {
        let root = fixtures::forest();
        let selector = Selector::new().descendants().named("leaf".to_string());
        let mapped = map_with(&selector, &root, |n| n.clone());
        assert!(mapped.shares_element(&root));
    }

    #[test]
    fn test_untouched_branches_are_shared() {
        let root = fixtures::forest();
        let selector = Selector::new()
            .descendants()
            .expression(thicket_expr::Expression::binary(
                thicket_expr::Expression::attribute("id"),
                thicket_expr::BinaryOperator::Equals,
                thicket_expr::Expression::text("e"),
            ));
        let mapped = map_with(&selector, &root, |n| n.with_attribute("seen", "yes"));

        let branches = mapped.children();
        let originals = root.children();
        assert!(branches[0].shares_element(&originals[0]));
        assert!(!branches[1].shares_element(&originals[1]));
        assert!(branches[2].shares_element(&originals[2]));

        let twig = fixtures::find(&mapped, "d").unwrap();
        let original_twig = fixtures::find(&root, "d").unwrap();
        assert!(!twig.shares_element(&original_twig));
        assert_eq!(twig.children()[0].attribute("seen").as_deref(), Some("yes"));
        // Siblings of the rewritten path keep their data.
        let c = fixtures::find(&mapped, "c").unwrap();
        assert!(c.shares_element(&fixtures::find(&root, "c").unwrap()));
    }

    #[test]
    fn test_nested_matches_rewrite_children_first() {
        let root = fixtures::forest();
        let selector = Selector::new().descendants().named("twig".to_string());
        let nested = selector.append(&Selector::new().descendants_or_self());
        let mut order = Vec::new();
        let mapped = map_with(&nested, &root, |n| {
            order.push(n.attribute("id").unwrap_or_default());
            let mark = format!("{}+", n.attribute("id").unwrap_or_default());
            n.with_attribute("id", mark)
        });
        assert_eq!(order, ["e", "d"]);
        let twig = mapped.children()[1].children()[1].clone();
        assert_eq!(twig.attribute("id").as_deref(), Some("d+"));
        assert_eq!(twig.children()[0].attribute("id").as_deref(), Some("e+"));
    }
}
