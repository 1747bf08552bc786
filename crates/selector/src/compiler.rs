//! Turns a parsed query into a [`Selector`].
//!
//! The compiler walks the token tree with a [`Visitor`]: paths and steps
//! become axis steps, names and `*` become name tests, and each bracketed
//! predicate is converted into an [`Expression`] in one go. Function names are
//! resolved against the registry here, so an unknown function fails the
//! compile rather than the first evaluation.

use crate::axes::Axis;
use crate::error::SelectError;
use crate::selector::{NameTest, Predicate, Selector, Step};
use thicket_expr::{BinaryOperator, Expression, FunctionRegistry};
use thicket_grammar::{
    AxisKeyword, BinaryOperator as SyntaxOperator, Leaf, LeafKind, Parent, ParentKind, Token, Visit,
    Visitor, walk,
};
use thicket_tree::{NodeName, TreeNode};

type NameFactory<Name> = Box<dyn Fn(&str) -> Name>;
type NameFilter = Box<dyn Fn(&str) -> bool>;

/// How query names become node names, and which names are legal at all.
pub struct NamePolicy<Name> {
    factory: NameFactory<Name>,
    accept: NameFilter,
}

impl<Name: NodeName> NamePolicy<Name> {
    pub fn new(
        factory: impl Fn(&str) -> Name + 'static,
        accept: impl Fn(&str) -> bool + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            accept: Box::new(accept),
        }
    }

    /// Accepts every name and builds it with [`NodeName::from_query`].
    pub fn permissive() -> Self {
        Self::new(Name::from_query, |_| true)
    }

    /// The default factory with a custom acceptance check.
    pub fn accepting(accept: impl Fn(&str) -> bool + 'static) -> Self {
        Self::new(Name::from_query, accept)
    }

    pub fn name(&self, text: &str) -> Result<Name, SelectError> {
        if !(self.accept)(text) {
            return Err(SelectError::IllegalName {
                name: text.to_string(),
            });
        }
        Ok((self.factory)(text))
    }
}

impl<Name: NodeName> Default for NamePolicy<Name> {
    fn default() -> Self {
        Self::permissive()
    }
}

pub struct Compiler<'r, N: TreeNode> {
    policy: NamePolicy<N::Name>,
    functions: &'r FunctionRegistry<N>,
}

impl<'r, N: TreeNode> Compiler<'r, N> {
    pub fn new(functions: &'r FunctionRegistry<N>) -> Self {
        Self {
            policy: NamePolicy::default(),
            functions,
        }
    }

    pub fn with_policy(mut self, policy: NamePolicy<N::Name>) -> Self {
        self.policy = policy;
        self
    }

    /// Compiles a `Path` token as produced by the parser.
    pub fn compile(&self, token: &Token) -> Result<Selector<N>, SelectError> {
        let is_path = token
            .as_parent()
            .is_some_and(|parent| matches!(parent.kind(), ParentKind::Path { .. }));
        if !is_path {
            return Err(unexpected("path", token));
        }
        let mut builder = ChainBuilder {
            compiler: self,
            steps: Vec::new(),
            error: None,
        };
        walk(token, &mut builder);
        if let Some(err) = builder.error {
            return Err(err);
        }
        log::debug!("compiled {:?} into {} step(s)", token.text(), builder.steps.len());
        Ok(Selector::from_steps(builder.steps))
    }
}

struct ChainBuilder<'c, 'r, N: TreeNode> {
    compiler: &'c Compiler<'r, N>,
    steps: Vec<Step<N::Name>>,
    error: Option<SelectError>,
}

impl<N: TreeNode> ChainBuilder<'_, '_, N> {
    fn record(&mut self, result: Result<Step<N::Name>, SelectError>) {
        match result {
            Ok(step) => self.steps.push(step),
            Err(err) => self.error = Some(err),
        }
    }

    fn predicate(&self, parent: &Parent) -> Result<Step<N::Name>, SelectError> {
        let body = operands(parent)
            .into_iter()
            .next()
            .ok_or_else(|| SelectError::UnexpectedToken {
                expected: "expression",
                found: parent.kind().label(),
            })?;
        let expression = expression(body)?;
        let text = body.text().to_string();
        if let Some(missing) = expression
            .function_names()
            .into_iter()
            .find(|name| !self.compiler.functions.contains(name))
        {
            return Err(SelectError::FunctionNotFound {
                function: missing.to_string(),
                predicate: text,
            });
        }
        Ok(Step::Predicate(Predicate::with_text(expression, text)))
    }
}

impl<N: TreeNode> Visitor for ChainBuilder<'_, '_, N> {
    fn start(&mut self, parent: &Parent) -> Visit {
        if self.error.is_some() {
            return Visit::SkipChildren;
        }
        match parent.kind() {
            ParentKind::Path { absolute } => {
                if absolute {
                    self.steps.push(Step::Axis(Axis::Root));
                }
                Visit::Continue
            }
            ParentKind::Step => {
                let keyword = parent.children().iter().find_map(|token| match token.as_leaf()?.kind() {
                    LeafKind::Axis(keyword) => Some(*keyword),
                    _ => None,
                });
                self.steps.push(Step::Axis(keyword.map_or(Axis::Child, axis_for)));
                Visit::Continue
            }
            ParentKind::Predicate => {
                let step = self.predicate(parent);
                self.record(step);
                Visit::SkipChildren
            }
            _ => Visit::SkipChildren,
        }
    }

    fn leaf(&mut self, leaf: &Leaf) {
        if self.error.is_some() {
            return;
        }
        match leaf.kind() {
            LeafKind::Name(name) => {
                let step = self
                    .compiler
                    .policy
                    .name(name)
                    .map(|name| Step::Name(NameTest::Named(name)));
                self.record(step);
            }
            LeafKind::Wildcard => self.steps.push(Step::Name(NameTest::Any)),
            _ => {}
        }
    }
}

pub fn axis_for(keyword: AxisKeyword) -> Axis {
    match keyword {
        AxisKeyword::Ancestor => Axis::Ancestor,
        AxisKeyword::AncestorOrSelf => Axis::AncestorOrSelf,
        AxisKeyword::Child => Axis::Child,
        AxisKeyword::Descendant => Axis::Descendant,
        AxisKeyword::DescendantOrSelf | AxisKeyword::DoubleSlash => Axis::DescendantOrSelf,
        AxisKeyword::FirstChild => Axis::FirstChild,
        AxisKeyword::Following => Axis::Following,
        AxisKeyword::FollowingSibling => Axis::FollowingSibling,
        AxisKeyword::LastChild => Axis::LastChild,
        AxisKeyword::Parent | AxisKeyword::DotDot => Axis::Parent,
        AxisKeyword::Preceding => Axis::Preceding,
        AxisKeyword::PrecedingSibling => Axis::PrecedingSibling,
        AxisKeyword::SelfAxis | AxisKeyword::Dot => Axis::SelfAxis,
    }
}

fn operator_for(op: SyntaxOperator) -> BinaryOperator {
    match op {
        SyntaxOperator::Or => BinaryOperator::Or,
        SyntaxOperator::And => BinaryOperator::And,
        SyntaxOperator::Equal => BinaryOperator::Equals,
        SyntaxOperator::NotEqual => BinaryOperator::NotEquals,
        SyntaxOperator::Less => BinaryOperator::LessThan,
        SyntaxOperator::LessOrEqual => BinaryOperator::LessThanOrEqual,
        SyntaxOperator::Greater => BinaryOperator::GreaterThan,
        SyntaxOperator::GreaterOrEqual => BinaryOperator::GreaterThanOrEqual,
        SyntaxOperator::Add => BinaryOperator::Plus,
        SyntaxOperator::Subtract => BinaryOperator::Minus,
        SyntaxOperator::Multiply => BinaryOperator::Multiply,
        SyntaxOperator::Divide => BinaryOperator::Divide,
        SyntaxOperator::Modulo => BinaryOperator::Modulo,
    }
}

/// Children that carry meaning: no whitespace, no punctuation or operator symbols.
fn operands(parent: &Parent) -> Vec<&Token> {
    parent
        .significant()
        .filter(|token| !matches!(token.as_leaf().map(Leaf::kind), Some(LeafKind::Symbol(_))))
        .collect()
}

fn unexpected(expected: &'static str, token: &Token) -> SelectError {
    let found = match token {
        Token::Leaf(leaf) => leaf.kind().label(),
        Token::Parent(parent) => parent.kind().label(),
    };
    SelectError::UnexpectedToken { expected, found }
}

/// Converts the body of a predicate into an [`Expression`].
pub fn expression(token: &Token) -> Result<Expression, SelectError> {
    let parent = match token {
        Token::Leaf(leaf) => {
            return match leaf.kind() {
                LeafKind::Number(n) => Ok(Expression::Number(*n)),
                LeafKind::Text(text) => Ok(Expression::text(text.clone())),
                _ => Err(unexpected("expression", token)),
            };
        }
        Token::Parent(parent) => parent,
    };
    let operands = operands(parent);
    let operand = |index: usize| operands.get(index).copied().ok_or_else(|| unexpected("operand", token));
    match parent.kind() {
        ParentKind::Binary(op) => Ok(Expression::binary(
            expression(operand(0)?)?,
            operator_for(op),
            expression(operand(1)?)?,
        )),
        ParentKind::Negation => Ok(Expression::negate(expression(operand(0)?)?)),
        ParentKind::Group => expression(operand(0)?),
        ParentKind::Attribute => Ok(Expression::attribute(leaf_name(operand(0)?)?)),
        ParentKind::FunctionCall => {
            let name = leaf_name(operand(0)?)?;
            let args = operands[1..]
                .iter()
                .map(|arg| expression(arg))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expression::call(name, args))
        }
        ParentKind::Path { .. } | ParentKind::Step | ParentKind::Predicate => {
            Err(unexpected("expression", token))
        }
    }
}

fn leaf_name(token: &Token) -> Result<String, SelectError> {
    match token.as_leaf().map(Leaf::kind) {
        Some(LeafKind::Name(name)) => Ok(name.clone()),
        _ => Err(unexpected("name", token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_grammar::parse;
    use thicket_tree::{ElementNode, fixtures};

    fn compile(query: &str) -> Result<Selector<ElementNode>, SelectError> {
        let registry = FunctionRegistry::with_builtins();
        Compiler::new(&registry).compile(&parse(query).unwrap())
    }

    fn select(query: &str, start: &ElementNode) -> Vec<String> {
        let registry = FunctionRegistry::with_builtins();
        let selector = Compiler::new(&registry).compile(&parse(query).unwrap()).unwrap();
        fixtures::ids(&selector.select(start, &registry).unwrap())
    }

    #[test]
    fn test_steps_follow_query_order() {
        let selector = compile("/branch[2]/..").unwrap();
        assert_eq!(
            selector.steps(),
            &[
                Step::Axis(Axis::Root),
                Step::Axis(Axis::Child),
                Step::Name(NameTest::Named("branch".to_string())),
                Step::Predicate(Predicate::with_text(Expression::number(2i64), "2")),
                Step::Axis(Axis::Parent),
            ]
        );
    }

    #[test]
    fn test_abbreviations() {
        let root = fixtures::forest();
        let twig = fixtures::find(&root, "d").unwrap();
        assert_eq!(select(".", &twig), ["d"]);
        assert_eq!(select("..", &twig), ["2"]);
        assert_eq!(select("../leaf", &twig), ["c", "f"]);
        assert_eq!(select("//leaf[@id = 'e']", &root), ["e"]);
        assert_eq!(select("branch//leaf", &root), ["a", "b", "c", "e", "f", "g"]);
    }

    #[test]
    fn test_expression_conversion() {
        let token = parse("*[-(@n + 2) * 3 >= 1 and not(contains(name(), 'x'))]").unwrap();
        let selector: Selector<ElementNode> =
            Compiler::new(&FunctionRegistry::with_builtins()).compile(&token).unwrap();
        let Some(Step::Predicate(predicate)) = selector.steps().last() else {
            panic!("expected a predicate step");
        };
        assert_eq!(
            predicate.expression.to_string(),
            "-(@n + 2) * 3 >= 1 and not(contains(name(), 'x'))"
        );
        assert_eq!(predicate.text, "-(@n + 2) * 3 >= 1 and not(contains(name(), 'x'))");
    }

    #[test]
    fn test_unknown_function_fails_compile() {
        assert_eq!(
            compile("a[position() = 1 or shout( 'x' )]"),
            Err(SelectError::FunctionNotFound {
                function: "shout".to_string(),
                predicate: "position() = 1 or shout( 'x' )".to_string(),
            })
        );
    }

    #[test]
    fn test_name_policy_rejects_names() {
        let registry = FunctionRegistry::with_builtins();
        let compiler: Compiler<'_, ElementNode> = Compiler::new(&registry).with_policy(NamePolicy::accepting(
            |name: &str| !name.chars().any(char::is_uppercase),
        ));
        assert!(compiler.compile(&parse("branch/leaf").unwrap()).is_ok());
        assert_eq!(
            compiler.compile(&parse("branch/Leaf").unwrap()),
            Err(SelectError::IllegalName {
                name: "Leaf".to_string()
            })
        );
    }

    #[test]
    fn test_custom_name_factory() {
        let registry = FunctionRegistry::with_builtins();
        let policy: NamePolicy<String> = NamePolicy::new(|text: &str| text.to_ascii_lowercase(), |_| true);
        let compiler: Compiler<'_, ElementNode> = Compiler::new(&registry).with_policy(policy);
        let selector = compiler.compile(&parse("BRANCH/Leaf").unwrap()).unwrap();
        assert_eq!(selector.to_string(), "child::branch/child::leaf");
        let root = fixtures::forest();
        assert_eq!(
            fixtures::ids(&selector.select(&root, &registry).unwrap()),
            ["a", "b", "c", "f", "g"]
        );
    }

    #[test]
    fn test_numeric_and_boolean_predicates_share_a_step_kind() {
        let root = fixtures::forest();
        assert_eq!(select("branch[2]", &root), ["2"]);
        assert_eq!(select("branch[position() = 2]", &root), ["2"]);
        assert_eq!(select("branch[@id > 1][2]", &root), ["3"]);
    }

    #[test]
    fn test_rejects_non_path_tokens() {
        let registry = FunctionRegistry::<ElementNode>::with_builtins();
        let err = Compiler::new(&registry).compile(&Token::name("a")).unwrap_err();
        assert_eq!(
            err,
            SelectError::UnexpectedToken {
                expected: "path",
                found: "Name"
            }
        );
    }
}
