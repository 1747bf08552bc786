//! A reference-counted, immutable element tree.
//!
//! Element data is shared through `Rc`, so copies made by a rewrite reuse every
//! subtree they do not touch. An [`ElementNode`] is a cursor into that data: the
//! element plus the path of cursors that led to it, which is what gives it a parent.

use crate::{Rebuild, TreeNode};
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<Rc<Element>>,
}

#[derive(Clone)]
pub struct ElementNode {
    element: Rc<Element>,
    parent: Option<Rc<ElementNode>>,
    index: usize,
}

impl ElementNode {
    /// Creates a detached root element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self::detached(Element {
            name: name.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        })
    }

    fn detached(element: Element) -> Self {
        Self {
            element: Rc::new(element),
            parent: None,
            index: 0,
        }
    }

    fn modified(&self, change: impl FnOnce(&mut Element)) -> Self {
        let mut element = (*self.element).clone();
        change(&mut element);
        Self::detached(element)
    }

    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.modified(|e| {
            e.attributes.insert(name.into(), value.into());
        })
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        self.modified(|e| e.text = Some(text.into()))
    }

    pub fn with_child(&self, child: ElementNode) -> Self {
        self.modified(|e| e.children.push(child.element))
    }

    pub fn with_children_of(&self, children: impl IntoIterator<Item = ElementNode>) -> Self {
        self.modified(|e| e.children.extend(children.into_iter().map(|c| c.element)))
    }

    /// A copy under a new name that shares this node's attributes and children.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        self.modified(|e| e.name = name.into())
    }

    pub fn text(&self) -> Option<&str> {
        self.element.text.as_deref()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.element
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn child_count(&self) -> usize {
        self.element.children.len()
    }

    /// Position of this node among its parent's children.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True when both handles are backed by the very same element data, wherever
    /// they sit. After a rewrite this tells an untouched subtree from a copy.
    pub fn shares_element(&self, other: &ElementNode) -> bool {
        Rc::ptr_eq(&self.element, &other.element)
    }

    /// Compares names, attributes, text and children recursively, ignoring identity.
    pub fn same_structure(&self, other: &ElementNode) -> bool {
        self.element == other.element
    }

    fn child_of(parent: &Rc<ElementNode>, index: usize) -> Option<ElementNode> {
        parent.element.children.get(index).map(|element| ElementNode {
            element: Rc::clone(element),
            parent: Some(Rc::clone(parent)),
            index,
        })
    }
}

impl PartialEq for ElementNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.element, &other.element)
            && self.index == other.index
            && self.parent == other.parent
    }
}

impl Eq for ElementNode {}

impl Hash for ElementNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.element) as usize).hash(state);
        self.index.hash(state);
    }
}

impl TreeNode for ElementNode {
    type Name = String;

    fn name(&self) -> String {
        self.element.name.clone()
    }

    fn children(&self) -> Vec<Self> {
        let parent = Rc::new(self.clone());
        (0..self.element.children.len())
            .filter_map(|index| Self::child_of(&parent, index))
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.parent.as_deref().cloned()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.attributes.get(name).cloned()
    }

    fn value(&self) -> Option<String> {
        self.element.text.clone()
    }

    fn first_child(&self) -> Option<Self> {
        Self::child_of(&Rc::new(self.clone()), 0)
    }

    fn last_child(&self) -> Option<Self> {
        let count = self.element.children.len();
        if count == 0 {
            return None;
        }
        Self::child_of(&Rc::new(self.clone()), count - 1)
    }

    fn following_siblings(&self) -> Vec<Self> {
        match &self.parent {
            Some(parent) => (self.index + 1..parent.element.children.len())
                .filter_map(|index| Self::child_of(parent, index))
                .collect(),
            None => Vec::new(),
        }
    }

    fn preceding_siblings(&self) -> Vec<Self> {
        match &self.parent {
            Some(parent) => (0..self.index)
                .rev()
                .filter_map(|index| Self::child_of(parent, index))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Rebuild for ElementNode {
    fn with_children(&self, children: Vec<Self>) -> Self {
        self.modified(|e| e.children = children.into_iter().map(|c| c.element).collect())
    }
}

impl fmt::Debug for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementNode")
            .field("name", &self.element.name)
            .field("index", &self.index)
            .field("children", &self.element.children.len())
            .finish()
    }
}

impl fmt::Display for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(&self.element, f)
    }
}

fn write_element(element: &Element, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", element.name)?;
    if !element.attributes.is_empty() {
        write!(f, "{{")?;
        for (i, (name, value)) in element.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
        }
        write!(f, "}}")?;
    }
    if element.text.is_none() && element.children.is_empty() {
        return Ok(());
    }
    write!(f, "(")?;
    let mut first = true;
    if let Some(text) = &element.text {
        write!(f, "{:?}", text)?;
        first = false;
    }
    for child in &element.children {
        if !first {
            write!(f, ", ")?;
        }
        write_element(child, f)?;
        first = false;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_builder_and_display() {
        let tree = ElementNode::new("root")
            .with_child(ElementNode::new("a").with_attribute("id", "1"))
            .with_child(ElementNode::new("b").with_text("hi"))
            .with_child(ElementNode::new("c").with_child(ElementNode::new("d")));
        assert_eq!(tree.to_string(), r#"root(a{id="1"}, b("hi"), c(d))"#);
        assert_eq!(tree.child_count(), 3);
    }

    #[test]
    fn test_navigation() {
        let root = fixtures::forest();
        let children = root.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].parent(), Some(root.clone()));
        assert_eq!(children[1].index(), 1);
        assert_eq!(root.first_child(), Some(children[0].clone()));
        assert_eq!(root.last_child(), Some(children[2].clone()));
        assert_eq!(root.parent(), None);
        assert_eq!(children[0].attribute("id").as_deref(), Some("1"));
        assert_eq!(children[0].attribute("missing"), None);
    }

    #[test]
    fn test_identity_is_positional() {
        let leaf = ElementNode::new("leaf");
        let root = ElementNode::new("root")
            .with_child(leaf.clone())
            .with_child(leaf.clone());
        let children = root.children();
        assert!(children[0].shares_element(&children[1]));
        assert_ne!(children[0], children[1]);
        assert_eq!(root.children()[0], children[0]);
        assert!(children[0].same_structure(&children[1]));
    }

    #[test]
    fn test_siblings_and_ancestors() {
        let root = fixtures::forest();
        let e = fixtures::find(&root, "e").unwrap();
        let d = fixtures::find(&root, "d").unwrap();
        let c = fixtures::find(&root, "c").unwrap();
        let f = fixtures::find(&root, "f").unwrap();
        let branch2 = fixtures::find(&root, "2").unwrap();

        assert_eq!(e.ancestors(), vec![d.clone(), branch2.clone(), root.clone()]);
        assert_eq!(e.root(), root);
        assert_eq!(d.following_siblings(), vec![f.clone()]);
        assert_eq!(f.preceding_siblings(), vec![d.clone(), c.clone()]);
        assert!(root.following_siblings().is_empty());
    }

    #[test]
    fn test_default_sibling_methods_match_overrides() {
        // Exercise the provided trait methods through a thin wrapper.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        struct Plain(ElementNode);
        impl TreeNode for Plain {
            type Name = String;
            fn name(&self) -> String {
                self.0.name()
            }
            fn children(&self) -> Vec<Self> {
                self.0.children().into_iter().map(Plain).collect()
            }
            fn parent(&self) -> Option<Self> {
                self.0.parent().map(Plain)
            }
            fn attribute(&self, name: &str) -> Option<String> {
                self.0.attribute(name)
            }
        }

        let root = fixtures::forest();
        let d = fixtures::find(&root, "d").unwrap();
        let plain = Plain(d.clone());
        let expected_following: Vec<Plain> = d.following_siblings().into_iter().map(Plain).collect();
        let expected_preceding: Vec<Plain> = d.preceding_siblings().into_iter().map(Plain).collect();
        assert_eq!(plain.following_siblings(), expected_following);
        assert_eq!(plain.preceding_siblings(), expected_preceding);
        assert_eq!(plain.first_child().map(|p| p.0), d.first_child());
        assert_eq!(plain.root().0, root);
        assert_eq!(plain.value(), None);
    }

    #[test]
    fn test_rebuild_shares_untouched_children() {
        let root = fixtures::forest();
        let children = root.children();
        let replaced = children[1].renamed("changed");
        let rebuilt = root.with_children(vec![children[0].clone(), replaced, children[2].clone()]);

        let new_children = rebuilt.children();
        assert!(new_children[0].shares_element(&children[0]));
        assert!(new_children[2].shares_element(&children[2]));
        assert_eq!(new_children[1].name(), "changed");
        assert!(!rebuilt.shares_element(&root));
        // The original is unchanged.
        assert_eq!(root.children()[1].name(), "branch");
    }
}
