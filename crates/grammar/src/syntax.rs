//! The lossless token tree produced by the parser.
//!
//! Every token records the exact source text it was parsed from. Leaves hold
//! their slice of the input; parents hold the concatenation of their children.
//! Whitespace is kept as [`LeafKind::Whitespace`] leaves so that printing a tree
//! reproduces the query byte for byte.

use std::fmt;
use thicket_types::Numeric;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Leaf(Leaf),
    Parent(Parent),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Leaf {
    kind: LeafKind,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parent {
    kind: ParentKind,
    children: Vec<Token>,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Name(String),
    Number(Numeric),
    /// Quoted text; holds the value without its quotes.
    Text(String),
    Axis(AxisKeyword),
    Wildcard,
    Symbol(Symbol),
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentKind {
    Path { absolute: bool },
    Step,
    Predicate,
    Binary(BinaryOperator),
    Negation,
    FunctionCall,
    Group,
    Attribute,
}

/// Axis prefixes as written, including the abbreviated forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKeyword {
    Ancestor,
    AncestorOrSelf,
    Child,
    Descendant,
    DescendantOrSelf,
    /// `//`
    DoubleSlash,
    FirstChild,
    Following,
    FollowingSibling,
    LastChild,
    Parent,
    /// `..`
    DotDot,
    Preceding,
    PrecedingSibling,
    SelfAxis,
    /// `.`
    Dot,
}

impl AxisKeyword {
    /// Every prefix in the order the parser tries them.
    pub const ALL: [AxisKeyword; 16] = [
        AxisKeyword::AncestorOrSelf,
        AxisKeyword::Ancestor,
        AxisKeyword::Child,
        AxisKeyword::DescendantOrSelf,
        AxisKeyword::Descendant,
        AxisKeyword::FirstChild,
        AxisKeyword::FollowingSibling,
        AxisKeyword::Following,
        AxisKeyword::LastChild,
        AxisKeyword::Parent,
        AxisKeyword::PrecedingSibling,
        AxisKeyword::Preceding,
        AxisKeyword::SelfAxis,
        AxisKeyword::DoubleSlash,
        AxisKeyword::DotDot,
        AxisKeyword::Dot,
    ];

    /// The canonical lowercase spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            AxisKeyword::Ancestor => "ancestor::",
            AxisKeyword::AncestorOrSelf => "ancestor-or-self::",
            AxisKeyword::Child => "child::",
            AxisKeyword::Descendant => "descendant::",
            AxisKeyword::DescendantOrSelf => "descendant-or-self::",
            AxisKeyword::DoubleSlash => "//",
            AxisKeyword::FirstChild => "first-child::",
            AxisKeyword::Following => "following::",
            AxisKeyword::FollowingSibling => "following-sibling::",
            AxisKeyword::LastChild => "last-child::",
            AxisKeyword::Parent => "parent::",
            AxisKeyword::DotDot => "..",
            AxisKeyword::Preceding => "preceding::",
            AxisKeyword::PrecedingSibling => "preceding-sibling::",
            AxisKeyword::SelfAxis => "self::",
            AxisKeyword::Dot => ".",
        }
    }

    /// `.` and `..` may stand alone as a whole step.
    pub fn stands_alone(self) -> bool {
        matches!(self, AxisKeyword::Dot | AxisKeyword::DotDot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Slash,
    At,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Minus,
    Plus,
    Star,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Div,
    Mod,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::Slash => "/",
            Symbol::At => "@",
            Symbol::OpenBracket => "[",
            Symbol::CloseBracket => "]",
            Symbol::OpenParen => "(",
            Symbol::CloseParen => ")",
            Symbol::Comma => ",",
            Symbol::Minus => "-",
            Symbol::Plus => "+",
            Symbol::Star => "*",
            Symbol::Equal => "=",
            Symbol::NotEqual => "!=",
            Symbol::Less => "<",
            Symbol::LessOrEqual => "<=",
            Symbol::Greater => ">",
            Symbol::GreaterOrEqual => ">=",
            Symbol::And => "and",
            Symbol::Or => "or",
            Symbol::Div => "div",
            Symbol::Mod => "mod",
        }
    }

    /// The binary operator this symbol spells, if any.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        let op = match self {
            Symbol::Or => BinaryOperator::Or,
            Symbol::And => BinaryOperator::And,
            Symbol::Equal => BinaryOperator::Equal,
            Symbol::NotEqual => BinaryOperator::NotEqual,
            Symbol::Less => BinaryOperator::Less,
            Symbol::LessOrEqual => BinaryOperator::LessOrEqual,
            Symbol::Greater => BinaryOperator::Greater,
            Symbol::GreaterOrEqual => BinaryOperator::GreaterOrEqual,
            Symbol::Plus => BinaryOperator::Add,
            Symbol::Minus => BinaryOperator::Subtract,
            Symbol::Star => BinaryOperator::Multiply,
            Symbol::Div => BinaryOperator::Divide,
            Symbol::Mod => BinaryOperator::Modulo,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(self) -> Symbol {
        match self {
            BinaryOperator::Or => Symbol::Or,
            BinaryOperator::And => Symbol::And,
            BinaryOperator::Equal => Symbol::Equal,
            BinaryOperator::NotEqual => Symbol::NotEqual,
            BinaryOperator::Less => Symbol::Less,
            BinaryOperator::LessOrEqual => Symbol::LessOrEqual,
            BinaryOperator::Greater => Symbol::Greater,
            BinaryOperator::GreaterOrEqual => Symbol::GreaterOrEqual,
            BinaryOperator::Add => Symbol::Plus,
            BinaryOperator::Subtract => Symbol::Minus,
            BinaryOperator::Multiply => Symbol::Star,
            BinaryOperator::Divide => Symbol::Div,
            BinaryOperator::Modulo => Symbol::Mod,
        }
    }
}

impl Token {
    pub fn leaf(kind: LeafKind, text: impl Into<String>) -> Self {
        Token::Leaf(Leaf {
            kind,
            text: text.into(),
        })
    }

    /// Builds a parent whose text is the concatenation of its children's text.
    pub fn parent(kind: ParentKind, children: Vec<Token>) -> Self {
        let text = children.iter().map(Token::text).collect();
        Token::Parent(Parent {
            kind,
            children,
            text,
        })
    }

    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        Token::leaf(LeafKind::Name(name.clone()), name)
    }

    pub fn number(value: Numeric, text: impl Into<String>) -> Self {
        Token::leaf(LeafKind::Number(value), text)
    }

    /// Quoted text using `quote` as delimiter.
    pub fn quoted(value: impl Into<String>, quote: char) -> Self {
        let value = value.into();
        let text = format!("{quote}{value}{quote}");
        Token::leaf(LeafKind::Text(value), text)
    }

    pub fn axis(axis: AxisKeyword) -> Self {
        Token::leaf(LeafKind::Axis(axis), axis.as_str())
    }

    pub fn wildcard() -> Self {
        Token::leaf(LeafKind::Wildcard, "*")
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Token::leaf(LeafKind::Symbol(symbol), symbol.as_str())
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Token::leaf(LeafKind::Whitespace, text)
    }

    /// The exact source text this token covers.
    pub fn text(&self) -> &str {
        match self {
            Token::Leaf(leaf) => &leaf.text,
            Token::Parent(parent) => &parent.text,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Token::Leaf(leaf) => Some(leaf),
            Token::Parent(_) => None,
        }
    }

    pub fn as_parent(&self) -> Option<&Parent> {
        match self {
            Token::Parent(parent) => Some(parent),
            Token::Leaf(_) => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Leaf(Leaf { kind: LeafKind::Whitespace, .. }))
    }
}

impl Leaf {
    pub fn kind(&self) -> &LeafKind {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Parent {
    pub fn kind(&self) -> ParentKind {
        self.kind
    }

    pub fn children(&self) -> &[Token] {
        &self.children
    }

    /// Children other than whitespace.
    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter(|child| !child.is_whitespace())
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl LeafKind {
    pub fn label(&self) -> &'static str {
        match self {
            LeafKind::Name(_) => "Name",
            LeafKind::Number(_) => "Number",
            LeafKind::Text(_) => "Text",
            LeafKind::Axis(_) => "Axis",
            LeafKind::Wildcard => "Wildcard",
            LeafKind::Symbol(_) => "Symbol",
            LeafKind::Whitespace => "Whitespace",
        }
    }
}

impl ParentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ParentKind::Path { absolute: true } => "AbsolutePath",
            ParentKind::Path { absolute: false } => "Path",
            ParentKind::Step => "Step",
            ParentKind::Predicate => "Predicate",
            ParentKind::Binary(_) => "Binary",
            ParentKind::Negation => "Negation",
            ParentKind::FunctionCall => "FunctionCall",
            ParentKind::Group => "Group",
            ParentKind::Attribute => "Attribute",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_text_is_concatenation() {
        let token = Token::parent(
            ParentKind::Step,
            vec![
                Token::axis(AxisKeyword::Child),
                Token::name("a"),
                Token::whitespace("  "),
            ],
        );
        assert_eq!(token.text(), "child::a  ");
        assert_eq!(token.to_string(), "child::a  ");
    }

    #[test]
    fn test_structural_equality() {
        let a = Token::parent(ParentKind::Group, vec![Token::symbol(Symbol::OpenParen)]);
        let b = Token::parent(ParentKind::Group, vec![Token::symbol(Symbol::OpenParen)]);
        let c = Token::parent(ParentKind::Negation, vec![Token::symbol(Symbol::OpenParen)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(Token::name("a"), Token::leaf(LeafKind::Name("a".into()), "A"));
    }

    #[test]
    fn test_significant_children_skip_whitespace() {
        let token = Token::parent(
            ParentKind::Group,
            vec![
                Token::symbol(Symbol::OpenParen),
                Token::whitespace(" "),
                Token::quoted("v", '\''),
                Token::symbol(Symbol::CloseParen),
            ],
        );
        let parent = token.as_parent().unwrap();
        assert_eq!(parent.children().len(), 4);
        assert_eq!(parent.significant().count(), 3);
        assert_eq!(token.text(), "( 'v')");
    }

    #[test]
    fn test_symbol_operator_mapping() {
        for op in [
            BinaryOperator::Or,
            BinaryOperator::And,
            BinaryOperator::Equal,
            BinaryOperator::NotEqual,
            BinaryOperator::Less,
            BinaryOperator::LessOrEqual,
            BinaryOperator::Greater,
            BinaryOperator::GreaterOrEqual,
            BinaryOperator::Add,
            BinaryOperator::Subtract,
            BinaryOperator::Multiply,
            BinaryOperator::Divide,
            BinaryOperator::Modulo,
        ] {
            assert_eq!(op.symbol().binary_operator(), Some(op));
        }
        assert_eq!(Symbol::Comma.binary_operator(), None);
    }
}
