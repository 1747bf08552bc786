//! Sample trees for tests and benchmarks in this and downstream crates.

use crate::{ElementNode, TreeNode};

/// Builds the reference tree used across the test suites:
///
/// ```text
/// root
/// ├── branch{id=1}
/// │   ├── leaf{id=a}
/// │   └── leaf{id=b}
/// ├── branch{id=2}
/// │   ├── leaf{id=c}
/// │   ├── twig{id=d}
/// │   │   └── leaf{id=e}
/// │   └── leaf{id=f}
/// └── branch{id=3}
///     └── leaf{id=g}
/// ```
pub fn forest() -> ElementNode {
    let leaf = |id: &str| ElementNode::new("leaf").with_attribute("id", id);
    let branch = |id: &str| ElementNode::new("branch").with_attribute("id", id);

    ElementNode::new("root")
        .with_child(branch("1").with_child(leaf("a")).with_child(leaf("b")))
        .with_child(
            branch("2")
                .with_child(leaf("c"))
                .with_child(ElementNode::new("twig").with_attribute("id", "d").with_child(leaf("e")))
                .with_child(leaf("f")),
        )
        .with_child(branch("3").with_child(leaf("g")))
}

/// A root with `count` childless children named `child1`, `child2`, ...
pub fn flat(count: usize) -> ElementNode {
    ElementNode::new("root")
        .with_children_of((1..=count).map(|i| ElementNode::new(format!("child{i}"))))
}

/// A balanced tree of the given depth and fan-out, each node carrying an `n` attribute.
pub fn balanced(depth: usize, fan_out: usize) -> ElementNode {
    fn build(level: usize, depth: usize, fan_out: usize, counter: &mut usize) -> ElementNode {
        *counter += 1;
        let node = ElementNode::new(if level == depth { "leaf" } else { "node" })
            .with_attribute("n", counter.to_string());
        if level == depth {
            return node;
        }
        let children: Vec<ElementNode> = (0..fan_out)
            .map(|_| build(level + 1, depth, fan_out, counter))
            .collect();
        node.with_children_of(children)
    }
    let mut counter = 0;
    build(0, depth, fan_out, &mut counter)
}

/// Finds the first node, in document order, whose `id` attribute equals `id`.
pub fn find(root: &ElementNode, id: &str) -> Option<ElementNode> {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if node.attribute("id").as_deref() == Some(id) {
            return Some(node);
        }
        let mut children = node.children();
        children.reverse();
        stack.extend(children);
    }
    None
}

/// The `id` attributes of `nodes`, in order. Nodes without one show as `-`.
pub fn ids(nodes: &[ElementNode]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| n.attribute("id").unwrap_or_else(|| "-".to_string()))
        .collect()
}
