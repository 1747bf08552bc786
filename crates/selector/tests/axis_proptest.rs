//! Property-based tests for axis traversal and predicate positions over
//! randomly shaped trees.

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashSet;
use thicket_expr::FunctionRegistry;
use thicket_selector::{Finisher, Selector, TraversalContext};
use thicket_tree::{ElementNode, TreeNode, fixtures};

#[derive(Debug, Clone)]
struct Shape(Vec<Shape>);

fn shape() -> impl Strategy<Value = Shape> {
    Just(Shape(Vec::new())).prop_recursive(4, 40, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Shape)
    })
}

/// Builds the tree with `id` attributes numbered in document order.
fn build(shape: &Shape) -> ElementNode {
    fn grow(shape: &Shape, counter: &mut usize) -> ElementNode {
        let node = ElementNode::new(if shape.0.is_empty() { "leaf" } else { "node" })
            .with_attribute("id", counter.to_string());
        *counter += 1;
        let children: Vec<ElementNode> = shape.0.iter().map(|child| grow(child, counter)).collect();
        node.with_children_of(children)
    }
    grow(shape, &mut 0)
}

fn all_nodes(root: &ElementNode) -> Vec<ElementNode> {
    let mut nodes = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let mut children = node.children();
        children.reverse();
        stack.extend(children);
        nodes.push(node);
    }
    nodes
}

fn run(selector: Selector<ElementNode>, start: &ElementNode) -> Vec<String> {
    let registry = FunctionRegistry::with_builtins();
    fixtures::ids(&selector.select(start, &registry).unwrap())
}

fn tree_and_node() -> impl Strategy<Value = (ElementNode, ElementNode)> {
    (shape(), any::<Index>()).prop_map(|(shape, index)| {
        let root = build(&shape);
        let nodes = all_nodes(&root);
        let node = index.get(&nodes).clone();
        (root, node)
    })
}

proptest! {
    #[test]
    fn or_self_axes_add_the_node_in_front((_root, node) in tree_and_node()) {
        let own = fixtures::ids(std::slice::from_ref(&node));

        let mut expected = own.clone();
        expected.extend(run(Selector::new().descendants(), &node));
        prop_assert_eq!(run(Selector::new().descendants_or_self(), &node), expected);

        let mut expected = own;
        expected.extend(run(Selector::new().ancestors(), &node));
        prop_assert_eq!(run(Selector::new().ancestors_or_self(), &node), expected);
    }

    #[test]
    fn ancestors_are_nearest_first((_root, node) in tree_and_node()) {
        let registry = FunctionRegistry::with_builtins();
        let ancestors = Selector::new().ancestors().select(&node, &registry).unwrap();
        let mut expected_parent = node.parent();
        for ancestor in &ancestors {
            prop_assert_eq!(Some(ancestor.clone()), expected_parent);
            expected_parent = ancestor.parent();
        }
        prop_assert!(expected_parent.is_none());
    }

    #[test]
    fn axes_partition_the_tree((root, node) in tree_and_node()) {
        let mut seen = HashSet::new();
        let mut total = 0;
        for selector in [
            Selector::new().preceding(),
            Selector::new().ancestors(),
            Selector::new().descendants_or_self(),
            Selector::new().following(),
        ] {
            let ids = run(selector, &node);
            total += ids.len();
            seen.extend(ids);
        }
        prop_assert_eq!(total, all_nodes(&root).len());
        prop_assert_eq!(seen.len(), total);
    }

    #[test]
    fn sibling_axes_stay_on_one_level((_root, node) in tree_and_node()) {
        let level: HashSet<String> = node
            .parent()
            .map(|parent| fixtures::ids(&parent.children()))
            .unwrap_or_default()
            .into_iter()
            .collect();
        for selector in [Selector::new().following_siblings(), Selector::new().preceding_siblings()] {
            for id in run(selector, &node) {
                prop_assert!(level.contains(&id));
            }
        }
        let following_siblings = run(Selector::new().following_siblings(), &node);
        let following = run(Selector::new().following(), &node);
        for id in &following_siblings {
            prop_assert!(following.contains(id));
        }
    }

    #[test]
    fn position_predicate_picks_exactly_one((root, _node) in tree_and_node(), k in -1i64..8) {
        let children = root.children();
        let selected = run(Selector::new().children().position(k), &root);
        let expected: Vec<String> = usize::try_from(k)
            .ok()
            .filter(|&k| k >= 1 && k <= children.len())
            .map(|k| fixtures::ids(&children[k - 1..k]))
            .unwrap_or_default();
        prop_assert_eq!(selected, expected);
    }

    #[test]
    fn finisher_caps_selection((root, _node) in tree_and_node(), limit in 0usize..6) {
        let registry = FunctionRegistry::with_builtins();
        let mut reported = Vec::new();
        let ctx = TraversalContext::builder(&registry)
            .finisher(Finisher::after(limit))
            .on_selected(|node: &ElementNode| reported.push(node.clone()))
            .build();
        Selector::new().descendants_or_self().apply(&root, ctx).unwrap();

        let everything = all_nodes(&root);
        let expected = &everything[..limit.min(everything.len())];
        prop_assert_eq!(fixtures::ids(&reported), fixtures::ids(expected));
    }
}
