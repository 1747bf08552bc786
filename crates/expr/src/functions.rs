//! The function registry and the built-in functions available to predicates.

use crate::engine::EvaluationContext;
use crate::error::ExprError;
use crate::operators;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use thicket_tree::TreeNode;
use thicket_types::Numeric;

/// A callable function. Arguments arrive already evaluated, in call order.
pub type Function<N> = fn(&EvaluationContext<'_, N>, Vec<Value>) -> Result<Value, ExprError>;

pub struct FunctionRegistry<N> {
    functions: HashMap<String, Function<N>>,
}

impl<N> FunctionRegistry<N> {
    /// A registry without any functions, not even the built-ins.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Adds or replaces a function.
    pub fn register(&mut self, name: impl Into<String>, function: Function<N>) {
        self.functions.insert(name.into(), function);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Function<N>> {
        self.functions.get(name).copied()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<N: TreeNode> FunctionRegistry<N> {
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        // Context
        registry.register("position", func_position::<N>);
        registry.register("name", func_name::<N>);
        registry.register("child-count", func_child_count::<N>);
        registry.register("has-attribute", func_has_attribute::<N>);
        // Conversion
        registry.register("string", func_string::<N>);
        registry.register("number", func_number::<N>);
        registry.register("boolean", func_boolean::<N>);
        // Boolean
        registry.register("not", func_not::<N>);
        registry.register("true", func_true::<N>);
        registry.register("false", func_false::<N>);
        // String
        registry.register("concat", func_concat::<N>);
        registry.register("contains", func_contains::<N>);
        registry.register("starts-with", func_starts_with::<N>);
        registry.register("ends-with", func_ends_with::<N>);
        registry.register("string-length", func_string_length::<N>);
        registry.register("normalize-space", func_normalize_space::<N>);
        registry.register("upper-case", func_upper_case::<N>);
        registry.register("lower-case", func_lower_case::<N>);
        // Number
        registry.register("floor", func_floor::<N>);
        registry.register("ceiling", func_ceiling::<N>);
        registry.register("round", func_round::<N>);
        registry.register("abs", func_abs::<N>);
        registry
    }
}

impl<N: TreeNode> Default for FunctionRegistry<N> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<N> fmt::Debug for FunctionRegistry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn check_arity(function: &str, args: &[Value], min: usize, max: Option<usize>) -> Result<(), ExprError> {
    let found = args.len();
    let ok = found >= min && max.is_none_or(|max| found <= max);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) if max == min + 1 => format!("{min} or {max}"),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(ExprError::Arity {
        function: function.to_string(),
        expected,
        found,
    })
}

/// The single argument, or the node's own value when called without one.
fn argument_or_value<N: TreeNode>(
    function: &str,
    mut args: Vec<Value>,
    e_ctx: &EvaluationContext<'_, N>,
) -> Result<Value, ExprError> {
    check_arity(function, &args, 0, Some(1))?;
    Ok(match args.pop() {
        Some(value) => value,
        None => e_ctx.node.value().map_or(Value::Absent, Value::Text),
    })
}

fn single(function: &str, mut args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity(function, &args, 1, Some(1))?;
    Ok(args.remove(0))
}

fn pair(function: &str, mut args: Vec<Value>) -> Result<(String, String), ExprError> {
    check_arity(function, &args, 2, Some(2))?;
    let second = args.remove(1).to_text();
    let first = args.remove(0).to_text();
    Ok((first, second))
}

// --- Context Functions ---

fn func_position<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("position", &args, 0, Some(0))?;
    let position = i64::try_from(e_ctx.position).unwrap_or(i64::MAX);
    Ok(Value::Number(Numeric::integer(position, e_ctx.numeric.kind)))
}

fn func_name<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("name", &args, 0, Some(0))?;
    Ok(Value::Text(e_ctx.node.name().to_string()))
}

fn func_child_count<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("child-count", &args, 0, Some(0))?;
    let count = i64::try_from(e_ctx.node.children().len()).unwrap_or(i64::MAX);
    Ok(Value::Number(Numeric::integer(count, e_ctx.numeric.kind)))
}

fn func_has_attribute<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let name = single("has-attribute", args)?.to_text();
    Ok(Value::Boolean(e_ctx.node.attribute(&name).is_some()))
}

// --- Conversion Functions ---

fn func_string<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    Ok(Value::Text(argument_or_value("string", args, e_ctx)?.to_text()))
}

fn func_number<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let value = argument_or_value("number", args, e_ctx)?;
    Ok(Value::Number(value.to_number(&e_ctx.numeric)?))
}

fn func_boolean<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    Ok(Value::Boolean(single("boolean", args)?.to_boolean()))
}

// --- Boolean Functions ---

fn func_not<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    Ok(Value::Boolean(!single("not", args)?.to_boolean()))
}

fn func_true<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("true", &args, 0, Some(0))?;
    Ok(Value::Boolean(true))
}

fn func_false<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("false", &args, 0, Some(0))?;
    Ok(Value::Boolean(false))
}

// --- String Functions ---

fn func_concat<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    check_arity("concat", &args, 2, None)?;
    Ok(Value::Text(args.iter().map(Value::to_text).collect()))
}

fn func_contains<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let (haystack, needle) = pair("contains", args)?;
    Ok(Value::Boolean(haystack.contains(&needle)))
}

fn func_starts_with<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let (text, prefix) = pair("starts-with", args)?;
    Ok(Value::Boolean(text.starts_with(&prefix)))
}

fn func_ends_with<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let (text, suffix) = pair("ends-with", args)?;
    Ok(Value::Boolean(text.ends_with(&suffix)))
}

fn func_string_length<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let text = argument_or_value("string-length", args, e_ctx)?.to_text();
    let length = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);
    Ok(Value::Number(Numeric::integer(length, e_ctx.numeric.kind)))
}

fn func_normalize_space<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    let text = argument_or_value("normalize-space", args, e_ctx)?.to_text();
    Ok(Value::Text(text.split_whitespace().collect::<Vec<_>>().join(" ")))
}

fn func_upper_case<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    Ok(Value::Text(single("upper-case", args)?.to_text().to_uppercase()))
}

fn func_lower_case<N: TreeNode>(_e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    Ok(Value::Text(single("lower-case", args)?.to_text().to_lowercase()))
}

// --- Number Functions ---

fn func_floor<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    operators::map_number(&single("floor", args)?, &e_ctx.numeric, Numeric::floor)
}

fn func_ceiling<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    operators::map_number(&single("ceiling", args)?, &e_ctx.numeric, Numeric::ceiling)
}

fn func_round<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    operators::map_number(&single("round", args)?, &e_ctx.numeric, Numeric::round)
}

fn func_abs<N: TreeNode>(e_ctx: &EvaluationContext<'_, N>, args: Vec<Value>) -> Result<Value, ExprError> {
    operators::map_number(&single("abs", args)?, &e_ctx.numeric, Numeric::abs)
}
