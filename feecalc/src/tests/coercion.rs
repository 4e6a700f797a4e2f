use crate::coercion::{parse_decimal, to_decimal, try_to_decimal};
use crate::Value;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_integers_convert_exactly() {
    assert_eq!(to_decimal(&Value::from(42i8)), dec("42"));
    assert_eq!(to_decimal(&Value::from(-7i32)), dec("-7"));
    assert_eq!(to_decimal(&Value::from(i64::MAX)), Decimal::from(i64::MAX));
    assert_eq!(to_decimal(&Value::from(u64::MAX)), Decimal::from(u64::MAX));
}

#[test]
fn test_unsigned_above_i64_stays_decimal() {
    assert_eq!(Value::from(u64::MAX), Value::Decimal(Decimal::from(u64::MAX)));
    assert_eq!(Value::from(7u64), Value::Int(7));
}

#[test]
fn test_floats_convert_to_shortest_decimal() {
    assert_eq!(to_decimal(&Value::from(20.0)), dec("20"));
    assert_eq!(to_decimal(&Value::from(0.5)), dec("0.5"));
    assert_eq!(to_decimal(&Value::from(-1.25f32)), dec("-1.25"));
}

#[test]
fn test_decimal_strings_convert_exactly() {
    assert_eq!(to_decimal(&Value::from("123.45")), dec("123.45"));
    assert_eq!(
        to_decimal(&Value::from("0.1234567890123456789")),
        dec("0.1234567890123456789")
    );
    assert_eq!(to_decimal(&Value::from("  10  ")), dec("10"));
    assert_eq!(parse_decimal("1.5e3"), Some(dec("1500")));
}

#[test]
fn test_unparsable_input_coerces_to_zero() {
    assert_eq!(to_decimal(&Value::from("not a number")), Decimal::ZERO);
    assert_eq!(to_decimal(&Value::from("")), Decimal::ZERO);
    assert_eq!(to_decimal(&Value::Null), Decimal::ZERO);
    assert_eq!(to_decimal(&Value::Bool(true)), Decimal::ZERO);
    assert_eq!(to_decimal(&Value::Float(f64::NAN)), Decimal::ZERO);
    assert_eq!(to_decimal(&Value::Float(f64::INFINITY)), Decimal::ZERO);
}

#[test]
fn test_try_to_decimal_distinguishes_failure() {
    assert_eq!(try_to_decimal(&Value::from("abc")), None);
    assert_eq!(try_to_decimal(&Value::from("0")), Some(Decimal::ZERO));
}

#[test]
fn test_decimal_passes_through() {
    let d = dec("99.990");
    assert_eq!(to_decimal(&Value::from(d)), d);
}

#[test]
fn test_option_converts_to_null() {
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
}
