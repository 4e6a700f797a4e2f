//! Rule evaluation
//!
//! Runs a preprocessed rule against a copy of the context variables:
//! 1. Every statement but the last runs for its side effects
//! 2. The last statement's value is classified
//! 3. Fee items and pending assignments are returned as a [`RuleResult`]
//!
//! Nothing is written to the shared context here; the engine merges the
//! result only once the whole rule succeeded.

use crate::coercion::to_decimal;
use crate::error::ExpressionError;
use crate::expression::ast::BinaryOperator;
use crate::expression::interpreter::decimal_arithmetic;
use crate::expression::{compile, Environment};
use crate::{FeeItem, ResourceLimits, RuleResult, Value, Variables};

/// What a rule's result value means
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A single fee item
    Fee(FeeItem),
    /// An array holding fee items directly; other elements are ignored
    Fees(Vec<FeeItem>),
    /// An array of strings, each evaluated as a further expression
    Expressions(Vec<String>),
    /// Anything else, including nil: no fee items
    Opaque,
}

pub fn classify(value: Value) -> Outcome {
    match value {
        Value::Fee(item) => Outcome::Fee(item),
        Value::Array(items)
            if !items.is_empty() && items.iter().all(|item| matches!(item, Value::String(_))) =>
        {
            Outcome::Expressions(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )
        }
        Value::Array(items) => Outcome::Fees(fee_items_in(items)),
        _ => Outcome::Opaque,
    }
}

fn fee_items_in(items: Vec<Value>) -> Vec<FeeItem> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Fee(fee) => Some(fee),
            _ => None,
        })
        .collect()
}

/// Evaluate a preprocessed rule
///
/// Returns `Ok(None)` when the rule neither emitted a fee item nor assigned
/// a variable.
pub fn evaluate(
    statements: &[String],
    variables: Variables,
    limits: &ResourceLimits,
) -> Result<Option<RuleResult>, ExpressionError> {
    let Some((result_expression, side_effects)) = statements.split_last() else {
        return Ok(None);
    };

    let mut env = RuleEnvironment::new(variables);
    for statement in side_effects {
        run(statement, &mut env, limits)?;
    }

    let mut fee_items = Vec::new();
    match classify(run(result_expression, &mut env, limits)?) {
        Outcome::Fee(item) => fee_items.push(item),
        Outcome::Fees(items) => fee_items.extend(items),
        Outcome::Expressions(expressions) => {
            if expressions.len() > limits.max_fanout_expressions {
                return Err(ExpressionError::ResourceLimitExceeded {
                    limit_name: "max_fanout_expressions".to_string(),
                    limit_value: limits.max_fanout_expressions.to_string(),
                    actual_value: expressions.len().to_string(),
                });
            }
            // Fan-out expressions are not preprocessed again
            for expression in &expressions {
                match run(expression, &mut env, limits)? {
                    Value::Fee(item) => fee_items.push(item),
                    Value::Array(items) => fee_items.extend(fee_items_in(items)),
                    _ => {}
                }
            }
        }
        Outcome::Opaque => {}
    }

    let result = RuleResult {
        fee_items,
        mutations: env.into_mutations(),
    };
    Ok((!result.is_empty()).then_some(result))
}

fn run(
    text: &str,
    env: &mut RuleEnvironment,
    limits: &ResourceLimits,
) -> Result<Value, ExpressionError> {
    compile(text, limits)?.run(env)
}

/// Variables plus the built-in functions available to rules
///
/// - `emit(amount, currency)` / `$(amount, currency)`: create a fee item
/// - `assign(name, value)` / `Set(name, value)`: write a variable
/// - `add`, `sub`, `mul`, `div` (two operands) and `neg` (one operand):
///   decimal arithmetic on coerced operands, also spelled `Add`, `Sub`,
///   `Mul`, `Div`, `Neg`
pub struct RuleEnvironment {
    variables: Variables,
    mutations: Vec<(String, Value)>,
}

impl RuleEnvironment {
    pub fn new(variables: Variables) -> Self {
        Self {
            variables,
            mutations: Vec::new(),
        }
    }

    /// Pending assignments, in the order their names were first assigned
    pub fn into_mutations(self) -> Vec<(String, Value)> {
        self.mutations
    }

    fn assign(&mut self, name: String, value: Value) {
        match self.mutations.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, pending)) => *pending = value.clone(),
            None => self.mutations.push((name.clone(), value.clone())),
        }
        // Later statements in the same rule see the new value
        self.variables.insert(name, value);
    }
}

impl Environment for RuleEnvironment {
    fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    fn call(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value, ExpressionError> {
        match name {
            "emit" | "$" => {
                let [amount, currency] = expect_arguments::<2>(name, arguments)?;
                match currency {
                    Value::String(currency) => {
                        Ok(Value::Fee(FeeItem::new(to_decimal(&amount), currency)))
                    }
                    other => Err(ExpressionError::type_mismatch(
                        &format!("{} currency", name),
                        "string",
                        &other,
                    )),
                }
            }
            "assign" | "Set" => {
                let [variable, value] = expect_arguments::<2>(name, arguments)?;
                match variable {
                    Value::String(variable) => {
                        self.assign(variable, value);
                        Ok(Value::Null)
                    }
                    other => Err(ExpressionError::type_mismatch(
                        &format!("{} name", name),
                        "string",
                        &other,
                    )),
                }
            }
            "add" | "Add" => decimal_operation(name, BinaryOperator::Add, arguments),
            "sub" | "Sub" => decimal_operation(name, BinaryOperator::Subtract, arguments),
            "mul" | "Mul" => decimal_operation(name, BinaryOperator::Multiply, arguments),
            "div" | "Div" => decimal_operation(name, BinaryOperator::Divide, arguments),
            "neg" | "Neg" => {
                let [value] = expect_arguments::<1>(name, arguments)?;
                Ok(Value::Decimal(-to_decimal(&value)))
            }
            _ => Err(ExpressionError::runtime(format!("unknown function {}", name))),
        }
    }
}

fn decimal_operation(
    function: &str,
    operator: BinaryOperator,
    arguments: Vec<Value>,
) -> Result<Value, ExpressionError> {
    let [left, right] = expect_arguments::<2>(function, arguments)?;
    decimal_arithmetic(to_decimal(&left), operator, to_decimal(&right)).map(Value::Decimal)
}

fn expect_arguments<const N: usize>(
    function: &str,
    arguments: Vec<Value>,
) -> Result<[Value; N], ExpressionError> {
    let count = arguments.len();
    <[Value; N]>::try_from(arguments).map_err(|_| {
        ExpressionError::runtime(format!(
            "{} expects {} arguments, got {}",
            function, N, count
        ))
    })
}
