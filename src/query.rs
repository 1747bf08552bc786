//! Compiled queries: parse, compile and run in one place.

use crate::config::QueryConfig;
use crate::error::QueryError;
use std::fmt;
use std::rc::Rc;
use thicket_expr::FunctionRegistry;
use thicket_grammar::{Token, parse_with};
use thicket_selector::{Compiler, Finisher, Selector, TraversalContext, TraversalContextBuilder};
use thicket_tree::{Rebuild, TreeNode};
use thicket_types::NumericConfig;

/// A query compiled for trees of `N`. Cheap to clone; every run gets its own
/// traversal state, so one query can be applied any number of times.
pub struct Query<N: TreeNode> {
    source: Rc<str>,
    syntax: Rc<Token>,
    selector: Selector<N>,
    functions: Rc<FunctionRegistry<N>>,
    numeric: NumericConfig,
}

impl<N: TreeNode> Clone for Query<N> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            syntax: Rc::clone(&self.syntax),
            selector: self.selector.clone(),
            functions: Rc::clone(&self.functions),
            numeric: self.numeric,
        }
    }
}

impl<N: TreeNode> fmt::Debug for Query<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("source", &self.source)
            .field("selector", &self.selector)
            .finish()
    }
}

impl<N: TreeNode> fmt::Display for Query<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl<N: TreeNode> Query<N> {
    /// Compiles `text` with the default configuration and the built-in functions.
    pub fn compile(text: &str) -> Result<Self, QueryError> {
        Self::compile_with(text, &QueryConfig::default(), FunctionRegistry::with_builtins())
    }

    pub fn compile_with(
        text: &str,
        config: &QueryConfig,
        functions: FunctionRegistry<N>,
    ) -> Result<Self, QueryError> {
        let syntax = parse_with(text, &config.numeric)?;
        let selector = Compiler::new(&functions)
            .with_policy(config.names.policy())
            .compile(&syntax)?;
        Ok(Self {
            source: Rc::from(text),
            syntax: Rc::new(syntax),
            selector,
            functions: Rc::new(functions),
            numeric: config.numeric,
        })
    }

    /// The query text exactly as it was given.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn syntax(&self) -> &Token {
        &self.syntax
    }

    pub fn selector(&self) -> &Selector<N> {
        &self.selector
    }

    pub fn functions(&self) -> &FunctionRegistry<N> {
        &self.functions
    }

    /// A context builder preset with this query's functions and numerics.
    pub fn context(&self) -> TraversalContextBuilder<'_, N> {
        TraversalContext::builder(&self.functions).numeric(self.numeric)
    }

    /// Runs the query with a caller-built context and returns `root`.
    pub fn apply(&self, root: &N, ctx: TraversalContext<'_, N>) -> Result<N, QueryError> {
        Ok(self.selector.apply(root, ctx)?)
    }

    /// Every distinct match, in traversal order.
    pub fn select(&self, root: &N) -> Result<Vec<N>, QueryError> {
        let mut matches = Vec::new();
        let ctx = self.context().on_selected(|node: &N| matches.push(node.clone())).build();
        self.selector.apply(root, ctx)?;
        Ok(matches)
    }

    pub fn select_first(&self, root: &N) -> Result<Option<N>, QueryError> {
        let mut first = None;
        let ctx = self
            .context()
            .finisher(Finisher::after(1))
            .on_selected(|node: &N| first = Some(node.clone()))
            .build();
        self.selector.apply(root, ctx)?;
        Ok(first)
    }
}

impl<N: Rebuild> Query<N> {
    /// Returns a copy of `root` with every match replaced by `mapper(match)`.
    /// Subtrees without matches are shared with `root`, which is left as is.
    pub fn map(&self, root: &N, mapper: impl FnMut(&N) -> N) -> Result<N, QueryError> {
        Ok(self.selector.map(root, self.context().build(), mapper)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NameCase;
    use thicket_selector::SelectError;
    use thicket_tree::{ElementNode, fixtures};

    fn ids(query: &str, root: &ElementNode) -> Vec<String> {
        let query: Query<ElementNode> = Query::compile(query).unwrap();
        fixtures::ids(&query.select(root).unwrap())
    }

    #[test]
    fn test_compile_and_select() {
        let root = fixtures::forest();
        assert_eq!(ids("branch[@id >= 2]/leaf", &root), ["c", "f", "g"]);
        assert_eq!(ids("/branch/*[child-count() > 0]", &root), ["d"]);
        assert_eq!(ids("//twig/ancestor::*", &root), ["2", "-"]);
    }

    #[test]
    fn test_source_and_syntax_are_kept() {
        let query: Query<ElementNode> = Query::compile(" branch [ 1 ] ").unwrap();
        assert_eq!(query.source(), " branch [ 1 ] ");
        assert_eq!(query.syntax().text(), " branch [ 1 ] ");
        assert_eq!(query.to_string(), " branch [ 1 ] ");
        assert_eq!(query.selector().to_string(), "child::branch[1]");
    }

    #[test]
    fn test_select_first_stops_early() {
        let root = fixtures::forest();
        let query: Query<ElementNode> = Query::compile("//leaf").unwrap();
        let first = query.select_first(&root).unwrap();
        assert_eq!(first.and_then(|n| n.attribute("id")), Some("a".to_string()));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = Query::<ElementNode>::compile("branch[").unwrap_err();
        assert!(matches!(err, QueryError::Syntax(_)));
        assert!(err.to_string().starts_with("syntax error: unexpected end of input at line 1, column 8"));
    }

    #[test]
    fn test_name_case_from_config() {
        let config = QueryConfig::default().with_names(NameCase::LowerOnly);
        let err = Query::<ElementNode>::compile_with("Branch", &config, FunctionRegistry::with_builtins())
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::Select(SelectError::IllegalName {
                name: "Branch".to_string()
            })
        );
    }

    #[test]
    fn test_double_numerics() {
        let root = fixtures::forest();
        let config = QueryConfig::default().with_numeric(NumericConfig::double());
        let query: Query<ElementNode> =
            Query::compile_with("branch[@id div 2 = 1.5]", &config, FunctionRegistry::with_builtins())
                .unwrap();
        assert_eq!(fixtures::ids(&query.select(&root).unwrap()), ["3"]);
    }

    #[test]
    fn test_map_through_query() {
        let root = fixtures::flat(3);
        let query: Query<ElementNode> = Query::compile("*[2]").unwrap();
        let mapped = query.map(&root, |n| n.renamed("second")).unwrap();
        let names: Vec<String> = mapped.children().iter().map(|n| n.name()).collect();
        assert_eq!(names, ["child1", "second", "child3"]);
    }
}
