use crate::error::ExpressionError;
use crate::evaluator::{classify, evaluate, Outcome};
use crate::preprocess::preprocess;
use crate::{FeeItem, ResourceLimits, RuleResult, Value, Variables};
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn vars(pairs: &[(&str, Value)]) -> Variables {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn run_rule(rule: &str, variables: Variables) -> Result<Option<RuleResult>, ExpressionError> {
    evaluate(&preprocess(rule), variables, &ResourceLimits::default())
}

#[test]
fn test_classify() {
    let fee = FeeItem::new(dec("1"), "USD");
    assert_eq!(classify(Value::Fee(fee.clone())), Outcome::Fee(fee.clone()));
    assert_eq!(
        classify(Value::from(vec!["a", "b"])),
        Outcome::Expressions(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(
        classify(Value::Array(vec![Value::Fee(fee.clone()), Value::Int(3)])),
        Outcome::Fees(vec![fee])
    );
    assert_eq!(classify(Value::Array(Vec::new())), Outcome::Fees(Vec::new()));
    assert_eq!(classify(Value::Null), Outcome::Opaque);
    assert_eq!(classify(Value::Int(5)), Outcome::Opaque);
}

#[test]
fn test_emit_produces_fee_item() {
    let result = run_rule(
        r#"emit(amount * rate, "USD")"#,
        vars(&[("amount", Value::from(1000.0)), ("rate", Value::from(0.02))]),
    )
    .unwrap()
    .unwrap();

    assert_eq!(result.fee_items, vec![FeeItem::new(dec("20"), "USD")]);
    assert!(result.mutations.is_empty());
}

#[test]
fn test_dollar_alias_accepts_string_amount() {
    let result = run_rule(r#"$("123.45", "USD")"#, Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(result.fee_items, vec![FeeItem::new(dec("123.45"), "USD")]);
}

#[test]
fn test_emit_requires_string_currency() {
    let err = run_rule("emit(1, 2)", Variables::new()).unwrap_err();
    assert!(matches!(err, ExpressionError::Runtime(_)));
}

#[test]
fn test_emit_arity_is_checked() {
    let err = run_rule("emit(1)", Variables::new()).unwrap_err();
    match err {
        ExpressionError::Runtime(message) => assert!(message.contains("expects 2 arguments")),
        other => panic!("Expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_assignment_is_visible_to_later_statements() {
    let result = run_rule(
        r#"amount = amount * 2; emit(amount * rate, "USD")"#,
        vars(&[("amount", Value::from(1000.0)), ("rate", Value::from(0.02))]),
    )
    .unwrap()
    .unwrap();

    assert_eq!(result.fee_items, vec![FeeItem::new(dec("40"), "USD")]);
    assert_eq!(
        result.mutations,
        vec![("amount".to_string(), Value::Float(2000.0))]
    );
}

#[test]
fn test_repeated_assignment_keeps_one_mutation() {
    let result = run_rule("x = 1; y = 2; x = x + 10", Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(
        result.mutations,
        vec![
            ("x".to_string(), Value::Int(11)),
            ("y".to_string(), Value::Int(2)),
        ]
    );
    assert!(result.fee_items.is_empty());
}

#[test]
fn test_explicit_assign_and_set_aliases() {
    let result = run_rule(r#"assign("a", 1); Set("b", "two")"#, Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(
        result.mutations,
        vec![
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::from("two")),
        ]
    );
}

#[test]
fn test_array_of_fee_items() {
    let result = run_rule(r#"[emit(100, "USD"), emit(200, "EUR")]"#, Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(
        result.fee_items,
        vec![
            FeeItem::new(dec("100"), "USD"),
            FeeItem::new(dec("200"), "EUR"),
        ]
    );
}

#[test]
fn test_array_of_expression_strings_fans_out() {
    let result = run_rule(
        r#"['emit(amount * 0.01, "USD")', 'emit(5, "EUR")']"#,
        vars(&[("amount", Value::Int(1000))]),
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        result.fee_items,
        vec![FeeItem::new(dec("10"), "USD"), FeeItem::new(dec("5"), "EUR")]
    );
}

#[test]
fn test_fan_out_expressions_are_not_preprocessed() {
    let err = run_rule(r#"["x = 1"]"#, Variables::new()).unwrap_err();
    assert!(matches!(err, ExpressionError::Parse(_)));
}

#[test]
fn test_fan_out_limit() {
    let limits = ResourceLimits {
        max_fanout_expressions: 2,
        ..ResourceLimits::default()
    };
    let statements = preprocess(r#"["nil", "nil", "nil"]"#);
    match evaluate(&statements, Variables::new(), &limits) {
        Err(ExpressionError::ResourceLimitExceeded { limit_name, .. }) => {
            assert_eq!(limit_name, "max_fanout_expressions");
        }
        other => panic!("Expected ResourceLimitExceeded, got {:?}", other),
    }
}

#[test]
fn test_conditional_emission() {
    let rule = r#"coupon > 0 ? emit(coupon, "USD") : nil"#;

    let skipped = run_rule(rule, vars(&[("coupon", Value::Int(0))])).unwrap();
    assert_eq!(skipped, None);

    let taken = run_rule(rule, vars(&[("coupon", Value::Int(5))]))
        .unwrap()
        .unwrap();
    assert_eq!(taken.fee_items, vec![FeeItem::new(dec("5"), "USD")]);
}

#[test]
fn test_opaque_result_is_no_op() {
    assert_eq!(run_rule("1 + 1", Variables::new()).unwrap(), None);
    assert_eq!(run_rule("", Variables::new()).unwrap(), None);
}

#[test]
fn test_side_effect_statement_values_are_discarded() {
    let result = run_rule(r#"emit(1, "USD"); emit(2, "USD")"#, Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(result.fee_items, vec![FeeItem::new(dec("2"), "USD")]);
}

#[test]
fn test_decimal_helpers_are_exact() {
    let result = run_rule(r#"emit(add("0.1", "0.2"), "USD")"#, Variables::new())
        .unwrap()
        .unwrap();
    assert_eq!(result.fee_items[0].amount, dec("0.3"));

    let result = run_rule(
        r#"total = Mul("19.99", 3); emit(Sub(total, Neg("-0.97")), "USD")"#,
        Variables::new(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(result.fee_items[0].amount, dec("59"));
    assert_eq!(
        result.mutations,
        vec![("total".to_string(), Value::Decimal(dec("59.97")))]
    );
}

#[test]
fn test_decimal_division_by_zero() {
    let err = run_rule("div(1, 0)", Variables::new()).unwrap_err();
    assert!(matches!(err, ExpressionError::Runtime(_)));
}

#[test]
fn test_integer_counter_stays_integer() {
    let result = run_rule("counter = counter + 1", vars(&[("counter", Value::Int(41))]))
        .unwrap()
        .unwrap();
    assert_eq!(
        result.mutations,
        vec![("counter".to_string(), Value::Int(42))]
    );
}

#[test]
fn test_missing_and_nil_variables_fail() {
    let missing = run_rule(r#"emit(amount * missing, "USD")"#, vars(&[("amount", Value::Int(1))]));
    assert!(matches!(missing, Err(ExpressionError::Runtime(_))));

    let nil = run_rule(r#"emit(amount * 2, "USD")"#, vars(&[("amount", Value::Null)]));
    assert!(matches!(nil, Err(ExpressionError::Runtime(_))));
}

#[test]
fn test_unknown_function() {
    let err = run_rule("launch(1)", Variables::new()).unwrap_err();
    match err {
        ExpressionError::Runtime(message) => assert!(message.contains("unknown function launch")),
        other => panic!("Expected runtime error, got {:?}", other),
    }
}
