//! The engine works over any tree that implements the navigation traits, with
//! its own name type. This one is a flat arena addressed by index.

use std::fmt;
use std::rc::Rc;
use thicket::{
    FunctionRegistry, NameCase, NodeName, Query, QueryConfig, QueryError, SelectError, TreeNode,
};

/// Names compare case-insensitively by storing them folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Tag(String);

impl NodeName for Tag {
    fn from_query(text: &str) -> Self {
        Tag(text.to_ascii_lowercase())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Entry {
    tag: &'static str,
    parent: Option<usize>,
    children: Vec<usize>,
    size: Option<&'static str>,
}

struct Arena {
    entries: Vec<Entry>,
}

#[derive(Clone)]
struct Handle {
    arena: Rc<Arena>,
    index: usize,
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.index == other.index
    }
}

impl Eq for Handle {}

impl std::hash::Hash for Handle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entry().tag, self.index)
    }
}

impl Handle {
    fn entry(&self) -> &Entry {
        &self.arena.entries[self.index]
    }

    fn at(&self, index: usize) -> Handle {
        Handle {
            arena: Rc::clone(&self.arena),
            index,
        }
    }
}

impl TreeNode for Handle {
    type Name = Tag;

    fn name(&self) -> Tag {
        Tag(self.entry().tag.to_string())
    }

    fn children(&self) -> Vec<Self> {
        self.entry().children.iter().map(|&i| self.at(i)).collect()
    }

    fn parent(&self) -> Option<Self> {
        self.entry().parent.map(|i| self.at(i))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "size" => self.entry().size.map(str::to_string),
            _ => None,
        }
    }
}

/// dir(dir(file[3], file[10]), file[7])
fn filesystem() -> Handle {
    let entry = |tag, parent, children: &[usize], size| Entry {
        tag,
        parent,
        children: children.to_vec(),
        size,
    };
    let arena = Arena {
        entries: vec![
            entry("dir", None, &[1, 4], None),
            entry("dir", Some(0), &[2, 3], None),
            entry("file", Some(1), &[], Some("3")),
            entry("file", Some(1), &[], Some("10")),
            entry("file", Some(0), &[], Some("7")),
        ],
    };
    Handle {
        arena: Rc::new(arena),
        index: 0,
    }
}

fn indexes(nodes: &[Handle]) -> Vec<usize> {
    nodes.iter().map(|n| n.index).collect()
}

#[test]
fn test_names_go_through_the_name_factory() -> Result<(), QueryError> {
    let root = filesystem();
    let query: Query<Handle> = Query::compile("//FILE[@size > 5]")?;
    assert_eq!(indexes(&query.select(&root)?), [3, 4]);
    Ok(())
}

#[test]
fn test_name_policy_applies_to_custom_names() {
    let config = QueryConfig::default().with_names(NameCase::LowerOnly);
    let err = Query::<Handle>::compile_with("//FILE", &config, FunctionRegistry::with_builtins())
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::Select(SelectError::IllegalName {
            name: "FILE".to_string()
        })
    );
}

#[test]
fn test_default_navigation_methods_drive_every_axis() -> Result<(), QueryError> {
    let root = filesystem();
    let small = root.children()[0].children()[0].clone();
    let run = |text: &str, start: &Handle| -> Result<Vec<usize>, QueryError> {
        let query: Query<Handle> = Query::compile(text)?;
        Ok(indexes(&query.select(start)?))
    };
    assert_eq!(run("following::*", &small)?, [3, 4]);
    assert_eq!(run("following-sibling::file", &small)?, [3]);
    assert_eq!(run("ancestor::dir", &small)?, [1, 0]);
    assert_eq!(run("/dir/file", &small)?, [2, 3]);
    assert_eq!(run("/file", &small)?, [4]);
    assert_eq!(run("last-child::*", &root)?, [4]);
    assert_eq!(run("preceding::*", &root.children()[1])?, [3, 2, 1]);
    Ok(())
}
