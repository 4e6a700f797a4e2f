//! Tree-walking evaluation
//!
//! Arithmetic follows native numeric rules: integers stay integers (checked
//! for overflow) except under `/`, floats win over integers, and a decimal
//! operand turns the whole operation decimal.

use super::ast::{BinaryOperator, Expression, LogicalOperator, UnaryOperator};
use super::Environment;
use crate::error::ExpressionError;
use crate::Value;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

pub fn evaluate(expr: &Expression, env: &mut dyn Environment) -> Result<Value, ExpressionError> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),

        Expression::Variable(name) => env
            .variable(name)
            .cloned()
            .ok_or_else(|| ExpressionError::runtime(format!("unknown name {}", name))),

        Expression::Array(elements) => elements
            .iter()
            .map(|element| evaluate(element, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        Expression::Call { name, arguments } => {
            let values = arguments
                .iter()
                .map(|argument| evaluate(argument, env))
                .collect::<Result<Vec<_>, _>>()?;
            env.call(name, values)
        }

        Expression::Unary { operator, operand } => {
            let value = evaluate(operand, env)?;
            unary_operation(*operator, value)
        }

        Expression::Binary {
            left,
            operator,
            right,
        } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            binary_operation(&left, *operator, &right)
        }

        Expression::Logical {
            left,
            operator,
            right,
        } => {
            let left = expect_bool(evaluate(left, env)?, operator)?;
            match (operator, left) {
                (LogicalOperator::And, false) => Ok(Value::Bool(false)),
                (LogicalOperator::Or, true) => Ok(Value::Bool(true)),
                _ => expect_bool(evaluate(right, env)?, operator).map(Value::Bool),
            }
        }

        Expression::Conditional {
            condition,
            then_branch,
            else_branch,
        } => match evaluate(condition, env)? {
            Value::Bool(true) => evaluate(then_branch, env),
            Value::Bool(false) => evaluate(else_branch, env),
            other => Err(ExpressionError::type_mismatch(
                "ternary condition",
                "bool",
                &other,
            )),
        },
    }
}

fn expect_bool(value: Value, operator: &LogicalOperator) -> Result<bool, ExpressionError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExpressionError::type_mismatch(
            &format!("operator {}", operator),
            "bool",
            &other,
        )),
    }
}

pub fn unary_operation(operator: UnaryOperator, value: Value) -> Result<Value, ExpressionError> {
    match (operator, value) {
        (UnaryOperator::Negate, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ExpressionError::runtime(format!("integer overflow negating {}", i))),
        (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::Negate, Value::Decimal(d)) => Ok(Value::Decimal(-d)),
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Negate, other) => Err(ExpressionError::type_mismatch(
            "operator -",
            "a number",
            &other,
        )),
        (UnaryOperator::Not, other) => {
            Err(ExpressionError::type_mismatch("operator !", "bool", &other))
        }
    }
}

pub fn binary_operation(
    left: &Value,
    operator: BinaryOperator,
    right: &Value,
) -> Result<Value, ExpressionError> {
    match operator {
        BinaryOperator::Equal => Ok(Value::Bool(values_equal(left, right))),
        BinaryOperator::NotEqual => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => comparison(left, operator, right),
        _ => arithmetic(left, operator, right),
    }
}

fn invalid_operation(left: &Value, operator: BinaryOperator, right: &Value) -> ExpressionError {
    ExpressionError::runtime(format!(
        "invalid operation: {} {} {}",
        left.describe(),
        operator,
        right.describe()
    ))
}

fn arithmetic(
    left: &Value,
    operator: BinaryOperator,
    right: &Value,
) -> Result<Value, ExpressionError> {
    match (left, right) {
        (Value::String(l), Value::String(r)) if operator == BinaryOperator::Add => {
            Ok(Value::String(format!("{}{}", l, r)))
        }
        (Value::Int(l), Value::Int(r)) => integer_arithmetic(*l, operator, *r),
        (Value::Decimal(_), _) | (_, Value::Decimal(_))
            if left.is_numeric() && right.is_numeric() =>
        {
            let l = promote_to_decimal(left)?;
            let r = promote_to_decimal(right)?;
            decimal_arithmetic(l, operator, r).map(Value::Decimal)
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => float_arithmetic(l, operator, r),
            _ => Err(invalid_operation(left, operator, right)),
        },
    }
}

fn integer_arithmetic(l: i64, operator: BinaryOperator, r: i64) -> Result<Value, ExpressionError> {
    let result = match operator {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide => {
            if r == 0 {
                return Err(ExpressionError::runtime("division by zero"));
            }
            return Ok(Value::Float(l as f64 / r as f64));
        }
        BinaryOperator::Modulo => {
            if r == 0 {
                return Err(ExpressionError::runtime("modulo by zero"));
            }
            l.checked_rem(r)
        }
        _ => None,
    };
    result.map(Value::Int).ok_or_else(|| {
        ExpressionError::runtime(format!("integer overflow in {} {} {}", l, operator, r))
    })
}

fn float_arithmetic(l: f64, operator: BinaryOperator, r: f64) -> Result<Value, ExpressionError> {
    let result = match operator {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide if r == 0.0 => {
            return Err(ExpressionError::runtime("division by zero"))
        }
        BinaryOperator::Divide => l / r,
        BinaryOperator::Modulo if r == 0.0 => {
            return Err(ExpressionError::runtime("modulo by zero"))
        }
        BinaryOperator::Modulo => l % r,
        other => {
            return Err(ExpressionError::runtime(format!(
                "operator {} is not arithmetic",
                other
            )))
        }
    };
    Ok(Value::Float(result))
}

/// Checked decimal arithmetic shared with the decimal helper functions
pub fn decimal_arithmetic(
    l: Decimal,
    operator: BinaryOperator,
    r: Decimal,
) -> Result<Decimal, ExpressionError> {
    if r.is_zero() && matches!(operator, BinaryOperator::Divide | BinaryOperator::Modulo) {
        return Err(ExpressionError::runtime("division by zero"));
    }
    let result = match operator {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide => l.checked_div(r),
        BinaryOperator::Modulo => l.checked_rem(r),
        other => {
            return Err(ExpressionError::runtime(format!(
                "operator {} is not arithmetic",
                other
            )))
        }
    };
    result.ok_or_else(|| {
        ExpressionError::runtime(format!("decimal overflow in {} {} {}", l, operator, r))
    })
}

fn promote_to_decimal(value: &Value) -> Result<Decimal, ExpressionError> {
    match value {
        Value::Decimal(d) => Ok(*d),
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f)
            .ok_or_else(|| ExpressionError::runtime(format!("cannot represent {} as decimal", f))),
        other => Err(ExpressionError::type_mismatch(
            "decimal arithmetic",
            "a number",
            other,
        )),
    }
}

fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            let l = promote_to_decimal(left).ok()?;
            let r = promote_to_decimal(right).ok()?;
            Some(l.cmp(&r))
        }
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return compare_numbers(left, right) == Some(Ordering::Equal);
    }
    left == right
}

fn comparison(
    left: &Value,
    operator: BinaryOperator,
    right: &Value,
) -> Result<Value, ExpressionError> {
    let ordering = match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ if left.is_numeric() && right.is_numeric() => compare_numbers(left, right),
        _ => return Err(invalid_operation(left, operator, right)),
    };

    // NaN compares false against everything
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };

    let result = match operator {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        other => {
            return Err(ExpressionError::runtime(format!(
                "operator {} is not a comparison",
                other
            )))
        }
    };
    Ok(Value::Bool(result))
}
