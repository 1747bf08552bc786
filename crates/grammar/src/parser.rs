//! A `nom` grammar that turns query text into a lossless [`Token`] tree.
//!
//! Input is a [`LocatedSpan`] whose extra state carries the numeric settings for
//! literals and a tracker of the furthest position any alternative failed at.
//! When the parse fails, that tracker becomes the [`SyntaxError`]: the offending
//! character, its line and column, and every production attempted there.

use crate::error::{Production, SyntaxError};
use crate::syntax::{AxisKeyword, BinaryOperator, LeafKind, ParentKind, Symbol, Token};
use log::{debug, trace};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{eof, not, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, terminated},
};
use nom_locate::LocatedSpan;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use thicket_types::{Numeric, NumericConfig};

/// How deeply expressions may nest inside one another (groups, predicates,
/// function arguments and negations all count).
pub const MAX_NESTING: usize = 32;

#[derive(Debug)]
struct State {
    numeric: NumericConfig,
    furthest: RefCell<Option<Failure>>,
    rejected: RefCell<Option<SyntaxError>>,
    depth: Cell<usize>,
}

#[derive(Debug)]
struct Failure {
    offset: usize,
    line: u32,
    column: usize,
    found: Option<char>,
    expected: BTreeSet<Production>,
}

type Span<'a> = LocatedSpan<&'a str, &'a State>;
type Fail<'a> = nom::error::Error<Span<'a>>;
type PResult<'a, T> = IResult<Span<'a>, T, Fail<'a>>;

impl State {
    fn record(&self, at: &Span<'_>, production: Production) {
        let offset = at.location_offset();
        let mut furthest = self.furthest.borrow_mut();
        if let Some(failure) = furthest.as_mut() {
            if failure.offset > offset {
                return;
            }
            if failure.offset == offset {
                failure.expected.insert(production);
                return;
            }
        }
        *furthest = Some(Failure {
            offset,
            line: at.location_line(),
            column: at.get_utf8_column(),
            found: at.fragment().chars().next(),
            expected: BTreeSet::from([production]),
        });
    }

    /// Replaces whatever was expected so far: the parse cannot recover from here.
    fn abort(&self, at: &Span<'_>, production: Production) {
        *self.furthest.borrow_mut() = Some(Failure {
            offset: at.location_offset(),
            line: at.location_line(),
            column: at.get_utf8_column(),
            found: at.fragment().chars().next(),
            expected: BTreeSet::from([production]),
        });
    }

    fn error(&self, text: &str) -> SyntaxError {
        if let Some(rejected) = self.rejected.borrow_mut().take() {
            return rejected;
        }
        match self.furthest.borrow_mut().take() {
            Some(failure) => SyntaxError {
                found: failure.found,
                line: failure.line,
                column: failure.column,
                expected: failure.expected,
                numeric: None,
            },
            None => SyntaxError::new(text.chars().next(), 1, 1, [Production::EndOfInput]),
        }
    }
}

/// Parses a query with the default numeric settings.
pub fn parse(text: &str) -> Result<Token, SyntaxError> {
    parse_with(text, &NumericConfig::default())
}

/// Parses a query, reading number literals under `numeric`.
pub fn parse_with(text: &str, numeric: &NumericConfig) -> Result<Token, SyntaxError> {
    let state = State {
        numeric: *numeric,
        furthest: RefCell::new(None),
        rejected: RefCell::new(None),
        depth: Cell::new(0),
    };
    let outcome = path(Span::new_extra(text, &state)).map(|(_, token)| token);
    match outcome {
        Ok(token) => {
            trace!("parsed {text:?}");
            Ok(token)
        }
        Err(_) => {
            let error = state.error(text);
            debug!("rejected {text:?}: {error}");
            Err(error)
        }
    }
}

// --- Helpers ---

fn fail<'a, T>(input: Span<'a>, production: Production) -> PResult<'a, T> {
    input.extra.record(&input, production);
    Err(nom::Err::Error(Fail::new(input, ErrorKind::Tag)))
}

/// Runs `parser`, noting `production` as expected at the input position if it fails.
fn expect<'a, O, P>(production: Production, mut parser: P) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    P: Parser<Span<'a>, Output = O, Error = Fail<'a>>,
{
    move |input: Span<'a>| {
        let result = parser.parse(input);
        if result.is_err() {
            input.extra.record(&input, production);
        }
        result
    }
}

/// Runs `parser` one nesting level deeper, failing outright past [`MAX_NESTING`].
fn nested<'a, T>(input: Span<'a>, parser: impl FnOnce(Span<'a>) -> PResult<'a, T>) -> PResult<'a, T> {
    let depth = &input.extra.depth;
    if depth.get() >= MAX_NESTING {
        input.extra.abort(&input, Production::ShallowerNesting);
        return Err(nom::Err::Failure(Fail::new(input, ErrorKind::TooLarge)));
    }
    depth.set(depth.get() + 1);
    let result = parser(input);
    depth.set(depth.get() - 1);
    result
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn leaf(kind: LeafKind, span: Span<'_>) -> Token {
    Token::leaf(kind, *span.fragment())
}

fn whitespace(input: Span<'_>) -> PResult<'_, Option<Token>> {
    let (rest, space) = multispace0(input)?;
    let text = *space.fragment();
    Ok((rest, (!text.is_empty()).then(|| Token::whitespace(text))))
}

fn symbol(input: Span<'_>, symbol: Symbol, production: Production) -> PResult<'_, Token> {
    let (rest, matched) = expect(production, tag(symbol.as_str())).parse(input)?;
    Ok((rest, leaf(LeafKind::Symbol(symbol), matched)))
}

fn name_span(input: Span<'_>) -> PResult<'_, Span<'_>> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn name(input: Span<'_>) -> PResult<'_, Token> {
    let (rest, span) = expect(Production::Name, name_span).parse(input)?;
    let text = *span.fragment();
    Ok((rest, Token::leaf(LeafKind::Name(text.to_string()), text)))
}

// --- Paths and steps ---

fn path(input: Span<'_>) -> PResult<'_, Token> {
    let mut children = Vec::new();
    let (input, space) = whitespace(input)?;
    children.extend(space);

    let (input, root) = opt(root_slash).parse(input)?;
    let absolute = root.is_some();
    children.extend(root);

    let input = if absolute {
        let (after_space, space) = whitespace(input)?;
        match opt(steps).parse(after_space)? {
            (rest, Some(steps)) => {
                children.extend(space);
                children.extend(steps);
                rest
            }
            (_, None) => input,
        }
    } else {
        let (rest, steps) = steps(input)?;
        children.extend(steps);
        rest
    };

    let (input, space) = whitespace(input)?;
    children.extend(space);
    let (input, _) = expect(Production::EndOfInput, eof).parse(input)?;
    Ok((input, Token::parent(ParentKind::Path { absolute }, children)))
}

/// A single leading `/`; `//` is an axis prefix instead.
fn root_slash(input: Span<'_>) -> PResult<'_, Token> {
    if input.fragment().starts_with("//") {
        return fail(input, Production::Slash);
    }
    symbol(input, Symbol::Slash, Production::Slash)
}

fn steps(input: Span<'_>) -> PResult<'_, Vec<Token>> {
    let (input, first) = step(input)?;
    let (input, rest) = many0((whitespace, separated_step)).parse(input)?;
    let mut tokens = vec![first];
    for (space, more) in rest {
        tokens.extend(space);
        tokens.extend(more);
    }
    Ok((input, tokens))
}

/// `/` followed by a step, or a step introduced by `//`.
fn separated_step(input: Span<'_>) -> PResult<'_, Vec<Token>> {
    if input.fragment().starts_with("//") {
        let (rest, step) = step(input)?;
        return Ok((rest, vec![step]));
    }
    let (input, slash) = symbol(input, Symbol::Slash, Production::Slash)?;
    let (input, space) = whitespace(input)?;
    let (input, step) = step(input)?;
    let mut tokens = vec![slash];
    tokens.extend(space);
    tokens.push(step);
    Ok((input, tokens))
}

fn step(input: Span<'_>) -> PResult<'_, Token> {
    let mut children = Vec::new();
    let (input, prefix) = opt(axis_prefix).parse(input)?;
    let stands_alone = prefix
        .as_ref()
        .is_some_and(|(keyword, _)| keyword.stands_alone());
    children.extend(prefix.map(|(_, token)| token));

    let input = if stands_alone {
        let (input, test) = opt(node_test).parse(input)?;
        children.extend(test);
        input
    } else {
        let (input, test) = node_test(input)?;
        children.push(test);
        input
    };

    let (input, predicates) = many0(spaced_predicate).parse(input)?;
    children.extend(predicates.into_iter().flatten());
    Ok((input, Token::parent(ParentKind::Step, children)))
}

fn axis_prefix(input: Span<'_>) -> PResult<'_, (AxisKeyword, Token)> {
    for keyword in AxisKeyword::ALL {
        let attempt: PResult<'_, Span<'_>> = tag_no_case(keyword.as_str()).parse(input);
        if let Ok((rest, matched)) = attempt {
            return Ok((rest, (keyword, leaf(LeafKind::Axis(keyword), matched))));
        }
    }
    fail(input, Production::AxisPrefix)
}

fn node_test(input: Span<'_>) -> PResult<'_, Token> {
    alt((wildcard, name)).parse(input)
}

fn wildcard(input: Span<'_>) -> PResult<'_, Token> {
    let (rest, star) = expect(Production::Wildcard, tag("*")).parse(input)?;
    Ok((rest, leaf(LeafKind::Wildcard, star)))
}

fn spaced_predicate(input: Span<'_>) -> PResult<'_, Vec<Token>> {
    let (input, space) = whitespace(input)?;
    let (input, predicate) = enclosed(
        input,
        (Symbol::OpenBracket, Production::OpenBracket),
        (Symbol::CloseBracket, Production::CloseBracket),
        ParentKind::Predicate,
    )?;
    Ok((input, space.into_iter().chain([predicate]).collect()))
}

/// `open`, optional whitespace, an expression, optional whitespace, `close`.
fn enclosed<'a>(
    input: Span<'a>,
    open: (Symbol, Production),
    close: (Symbol, Production),
    kind: ParentKind,
) -> PResult<'a, Token> {
    let (input, opening) = symbol(input, open.0, open.1)?;
    let (input, before) = whitespace(input)?;
    let (input, inner) = expression(input)?;
    let (input, after) = whitespace(input)?;
    let (input, closing) = symbol(input, close.0, close.1)?;

    let mut children = vec![opening];
    children.extend(before);
    children.push(inner);
    children.extend(after);
    children.push(closing);
    Ok((input, Token::parent(kind, children)))
}

// --- Expressions (in order of precedence) ---

/// Folds `operand (operator operand)*` into left-associative binary tokens.
fn binary_level<'a, F, G>(operand: F, operator: G) -> impl FnMut(Span<'a>) -> PResult<'a, Token>
where
    F: Parser<Span<'a>, Output = Token, Error = Fail<'a>> + Clone,
    G: Parser<Span<'a>, Output = (BinaryOperator, Token), Error = Fail<'a>> + Clone,
{
    move |input: Span<'a>| {
        let (input, first) = operand.clone().parse(input)?;
        let (input, rest) =
            many0((whitespace, operator.clone(), whitespace, operand.clone())).parse(input)?;
        let folded = rest
            .into_iter()
            .fold(first, |left, (before, (op, symbol), after, right)| {
                let mut children = vec![left];
                children.extend(before);
                children.push(symbol);
                children.extend(after);
                children.push(right);
                Token::parent(ParentKind::Binary(op), children)
            });
        Ok((input, folded))
    }
}

fn expression(input: Span<'_>) -> PResult<'_, Token> {
    nested(input, or_expr)
}

fn or_expr(input: Span<'_>) -> PResult<'_, Token> {
    binary_level(and_expr, or_operator)(input)
}

fn and_expr(input: Span<'_>) -> PResult<'_, Token> {
    binary_level(comparison_expr, and_operator)(input)
}

fn comparison_expr(input: Span<'_>) -> PResult<'_, Token> {
    binary_level(additive_expr, comparison_operator)(input)
}

fn additive_expr(input: Span<'_>) -> PResult<'_, Token> {
    binary_level(multiplicative_expr, additive_operator)(input)
}

fn multiplicative_expr(input: Span<'_>) -> PResult<'_, Token> {
    binary_level(unary_expr, multiplicative_operator)(input)
}

/// The first of `choices` found at the input. Keywords must not run on into a name.
fn operator<'a>(input: Span<'a>, choices: &[Symbol]) -> PResult<'a, (BinaryOperator, Token)> {
    for &symbol in choices {
        let text = symbol.as_str();
        let attempt: PResult<'a, Span<'a>> = if text.starts_with(is_name_start) {
            terminated(tag_no_case(text), not(take_while1(is_name_char))).parse(input)
        } else {
            tag(text).parse(input)
        };
        if let (Ok((rest, matched)), Some(op)) = (attempt, symbol.binary_operator()) {
            return Ok((rest, (op, leaf(LeafKind::Symbol(symbol), matched))));
        }
    }
    fail(input, Production::Operator)
}

fn or_operator(input: Span<'_>) -> PResult<'_, (BinaryOperator, Token)> {
    operator(input, &[Symbol::Or])
}

fn and_operator(input: Span<'_>) -> PResult<'_, (BinaryOperator, Token)> {
    operator(input, &[Symbol::And])
}

fn comparison_operator(input: Span<'_>) -> PResult<'_, (BinaryOperator, Token)> {
    operator(
        input,
        &[
            Symbol::NotEqual,
            Symbol::LessOrEqual,
            Symbol::GreaterOrEqual,
            Symbol::Equal,
            Symbol::Less,
            Symbol::Greater,
        ],
    )
}

fn additive_operator(input: Span<'_>) -> PResult<'_, (BinaryOperator, Token)> {
    operator(input, &[Symbol::Plus, Symbol::Minus])
}

fn multiplicative_operator(input: Span<'_>) -> PResult<'_, (BinaryOperator, Token)> {
    operator(input, &[Symbol::Star, Symbol::Div, Symbol::Mod])
}

fn unary_expr(input: Span<'_>) -> PResult<'_, Token> {
    let Ok((rest, minus)) = symbol(input, Symbol::Minus, Production::Minus) else {
        return primary_expr(input);
    };
    let (rest, space) = whitespace(rest)?;
    let (rest, operand) = nested(rest, unary_expr)?;
    let mut children = vec![minus];
    children.extend(space);
    children.push(operand);
    Ok((rest, Token::parent(ParentKind::Negation, children)))
}

fn primary_expr(input: Span<'_>) -> PResult<'_, Token> {
    alt((number, quoted_text, attribute, function_call, group)).parse(input)
}

fn number(input: Span<'_>) -> PResult<'_, Token> {
    let (rest, digits) = expect(
        Production::Number,
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    )
    .parse(input)?;
    let text = *digits.fragment();
    match Numeric::parse(text, &input.extra.numeric) {
        Ok(value) => Ok((rest, Token::number(value, text))),
        Err(err) => {
            debug!("numeric literal {text:?} rejected: {err}");
            let rejected = SyntaxError::numeric(
                input.fragment().chars().next(),
                input.location_line(),
                input.get_utf8_column(),
                err,
            );
            *input.extra.rejected.borrow_mut() = Some(rejected);
            Err(nom::Err::Failure(Fail::new(input, ErrorKind::Float)))
        }
    }
}

fn quoted_text(input: Span<'_>) -> PResult<'_, Token> {
    let (rest, literal) = expect(
        Production::QuotedText,
        recognize(alt((
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        ))),
    )
    .parse(input)?;
    let text = *literal.fragment();
    let value = &text[1..text.len() - 1];
    Ok((rest, Token::leaf(LeafKind::Text(value.to_string()), text)))
}

fn attribute(input: Span<'_>) -> PResult<'_, Token> {
    let (rest, at) = symbol(input, Symbol::At, Production::At)?;
    let (rest, name) = name(rest)?;
    Ok((rest, Token::parent(ParentKind::Attribute, vec![at, name])))
}

fn function_call(input: Span<'_>) -> PResult<'_, Token> {
    let (input, function) = name(input)?;
    let mut children = vec![function];
    let (input, space) = whitespace(input)?;
    children.extend(space);
    let (input, open) = symbol(input, Symbol::OpenParen, Production::OpenParen)?;
    children.push(open);
    let (input, space) = whitespace(input)?;
    children.extend(space);
    let (input, arguments) = opt(arguments).parse(input)?;
    children.extend(arguments.into_iter().flatten());
    let (input, close) = symbol(input, Symbol::CloseParen, Production::CloseParen)?;
    children.push(close);
    Ok((input, Token::parent(ParentKind::FunctionCall, children)))
}

fn arguments(input: Span<'_>) -> PResult<'_, Vec<Token>> {
    let (input, first) = expression(input)?;
    let (input, rest) = many0((whitespace, comma, whitespace, expression)).parse(input)?;
    let (input, trailing) = whitespace(input)?;
    let mut tokens = vec![first];
    for (before, comma, after, argument) in rest {
        tokens.extend(before);
        tokens.push(comma);
        tokens.extend(after);
        tokens.push(argument);
    }
    tokens.extend(trailing);
    Ok((input, tokens))
}

fn comma(input: Span<'_>) -> PResult<'_, Token> {
    symbol(input, Symbol::Comma, Production::Comma)
}

fn group(input: Span<'_>) -> PResult<'_, Token> {
    enclosed(
        input,
        (Symbol::OpenParen, Production::OpenParen),
        (Symbol::CloseParen, Production::CloseParen),
        ParentKind::Group,
    )
}
