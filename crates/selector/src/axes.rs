//! Candidate enumeration along each axis.
//!
//! [`traverse`] hands every candidate to a visitor callback in axis order. The
//! callback answers with a [`Walk`] so the caller can stop early or, on the
//! axes that walk subtrees top-down, leave out the subtree below a candidate.

use std::fmt;
use thicket_tree::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The topmost ancestor, or the node itself when it has no parent.
    Root,
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FirstChild,
    LastChild,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    /// The keyword written before `::`. `Root` has none.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Axis::Root => return None,
            Axis::SelfAxis => "self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::FirstChild => "first-child",
            Axis::LastChild => "last-child",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Following => "following",
            Axis::Preceding => "preceding",
        })
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.keyword() {
            Some(keyword) => write!(f, "{keyword}::"),
            None => f.write_str("/"),
        }
    }
}

/// What the visitor wants after seeing a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// Skip the candidate's descendants where the axis would visit them next.
    Prune,
    Stop,
}

/// Visits the candidates of `axis` around `node`. The first error from `visit`
/// ends the walk and is returned.
pub fn traverse<N, E>(
    axis: Axis,
    node: &N,
    visit: &mut impl FnMut(N) -> Result<Walk, E>,
) -> Result<(), E>
where
    N: TreeNode,
{
    match axis {
        Axis::Root => visit(node.root()).map(drop),
        Axis::SelfAxis => visit(node.clone()).map(drop),
        Axis::Child => each(node.children(), visit),
        Axis::Descendant => subtrees(node.children(), visit).map(drop),
        Axis::DescendantOrSelf => subtrees(vec![node.clone()], visit).map(drop),
        Axis::Parent => each(node.parent(), visit),
        Axis::Ancestor => each(node.ancestors(), visit),
        Axis::AncestorOrSelf => {
            each(std::iter::once(node.clone()).chain(node.ancestors()), visit)
        }
        Axis::FirstChild => each(node.first_child(), visit),
        Axis::LastChild => each(node.last_child(), visit),
        Axis::FollowingSibling => each(node.following_siblings(), visit),
        Axis::PrecedingSibling => each(node.preceding_siblings(), visit),
        Axis::Following => following(node, visit),
        Axis::Preceding => preceding(node, visit),
    }
}

/// Flat candidate lists: nothing below a candidate is visited, so `Prune` is
/// the same as `Continue`.
fn each<N, E>(
    candidates: impl IntoIterator<Item = N>,
    visit: &mut impl FnMut(N) -> Result<Walk, E>,
) -> Result<(), E> {
    for candidate in candidates {
        if visit(candidate)? == Walk::Stop {
            break;
        }
    }
    Ok(())
}

/// Depth-first preorder over each root in `roots` and its descendants.
/// Returns `Walk::Stop` if the visitor stopped the walk.
fn subtrees<N, E>(roots: Vec<N>, visit: &mut impl FnMut(N) -> Result<Walk, E>) -> Result<Walk, E>
where
    N: TreeNode,
{
    let mut stack = roots;
    stack.reverse();
    while let Some(current) = stack.pop() {
        match visit(current.clone())? {
            Walk::Stop => return Ok(Walk::Stop),
            Walk::Prune => {}
            Walk::Continue => {
                let mut children = current.children();
                children.reverse();
                stack.extend(children);
            }
        }
    }
    Ok(Walk::Continue)
}

/// Everything after `node` in document order except its own descendants: the
/// later sibling subtrees of `node`, then of its parent, and so on upward.
fn following<N, E>(node: &N, visit: &mut impl FnMut(N) -> Result<Walk, E>) -> Result<(), E>
where
    N: TreeNode,
{
    let mut current = Some(node.clone());
    while let Some(level) = current {
        if subtrees(level.following_siblings(), visit)? == Walk::Stop {
            break;
        }
        current = level.parent();
    }
    Ok(())
}

/// Everything before `node` in document order except its ancestors, nearest
/// first. A subtree is seen bottom-up here, so `Prune` has nothing to skip.
fn preceding<N, E>(node: &N, visit: &mut impl FnMut(N) -> Result<Walk, E>) -> Result<(), E>
where
    N: TreeNode,
{
    let mut current = Some(node.clone());
    while let Some(level) = current {
        for sibling in level.preceding_siblings() {
            for candidate in preorder(sibling).into_iter().rev() {
                if visit(candidate)? == Walk::Stop {
                    return Ok(());
                }
            }
        }
        current = level.parent();
    }
    Ok(())
}

fn preorder<N: TreeNode>(root: N) -> Vec<N> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        let mut children = current.children();
        children.reverse();
        stack.extend(children);
        order.push(current);
    }
    order
}
