//! Numeric coercion to the canonical decimal type
//!
//! Every monetary amount is a `Decimal`. Integers and decimal strings convert
//! without loss; floats convert to the shortest decimal that round-trips to
//! the same `f64`. Anything that cannot be read as a number becomes zero.

use crate::Value;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Coerce a value to a decimal, falling back to zero
pub fn to_decimal(value: &Value) -> Decimal {
    try_to_decimal(value).unwrap_or(Decimal::ZERO)
}

/// Coerce a value to a decimal, returning `None` when it is not numeric
pub fn try_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(d) => Some(*d),
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f),
        Value::String(s) => parse_decimal(s),
        Value::Null | Value::Bool(_) | Value::Fee(_) | Value::Array(_) => None,
    }
}

/// Parse a decimal literal, accepting plain and scientific notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
