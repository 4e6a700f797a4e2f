use feecalc::{Context, Engine, FeeError, FeeItem, Value};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn engine_with_amount_and_rate() -> Engine {
    let context = Context::with_variables([("amount", 1000.0), ("rate", 0.02)]);
    Engine::with_context(Arc::new(context))
}

#[test]
fn test_single_percentage_fee() {
    let mut engine = engine_with_amount_and_rate();
    engine.queue([r#"emit(amount * rate, "USD")"#]);

    let result = engine.run_all().unwrap();
    assert_eq!(result.processed, 1);
    assert_eq!(result.fee_items, vec![FeeItem::new(dec("20"), "USD")]);
    assert_eq!(result.summary, vec![FeeItem::new(dec("20"), "USD")]);
}

#[test]
fn test_three_rules_then_exhausted_queue() {
    let mut engine = Engine::new();
    engine.queue([
        r#"emit(10, "USD")"#,
        r#"emit(10, "USD")"#,
        r#"emit(10, "USD")"#,
    ]);

    assert_eq!(engine.run(3).unwrap().processed, 3);

    let result = engine.run(2).unwrap();
    assert_eq!(result.processed, 0);
    assert_eq!(result.total("USD"), Some(dec("30")));
}

#[test]
fn test_assignment_then_emission() {
    let mut engine = engine_with_amount_and_rate();
    engine.queue([r#"amount = amount * 2; emit(amount * rate, "USD")"#]);

    let result = engine.run_all().unwrap();
    assert_eq!(engine.variable("amount"), Some(Value::Float(2000.0)));
    assert_eq!(result.fee_items, vec![FeeItem::new(dec("40"), "USD")]);
}

#[test]
fn test_multi_currency_rule() {
    let mut engine = Engine::new();
    engine.queue([r#"[emit(100, "USD"), emit(200, "EUR")]"#]);

    let result = engine.run_all().unwrap();
    assert_eq!(
        result.fee_items,
        vec![
            FeeItem::new(dec("100"), "USD"),
            FeeItem::new(dec("200"), "EUR"),
        ]
    );
    assert_eq!(result.total("USD"), Some(dec("100")));
    assert_eq!(result.total("EUR"), Some(dec("200")));
    assert_eq!(result.total("GBP"), None);
}

#[test]
fn test_undefined_variable_stops_the_run() {
    let mut engine = engine_with_amount_and_rate();
    engine.queue([
        r#"emit(amount * rate, "USD")"#,
        r#"emit(amount * missing, "USD")"#,
    ]);

    let err = engine.run_all().unwrap_err();
    assert!(matches!(err, FeeError::Evaluation { index: 1, .. }));
    assert_eq!(engine.context().cursor(), 1);
    assert_eq!(
        engine.context().fee_items(),
        vec![FeeItem::new(dec("20"), "USD")]
    );
}

#[test]
fn test_on_ramp_fee_schedule() {
    let context = Context::with_variables([
        ("amount", Value::from(1000)),
        ("network_fee", Value::from("2.50")),
        ("coupon", Value::from(0)),
    ]);
    let mut engine = Engine::with_context(Arc::new(context));
    engine.enable_logging().queue([
        r#"processing = Mul(amount, "0.015"); $(processing, "USD")"#,
        r#"$(network_fee, "USD")"#,
        r#"coupon > 0 ? $(Neg(coupon), "USD") : nil"#,
        r#"amount >= 500 ? ['emit(1, "POINTS")', 'emit(amount / 100, "POINTS")'] : nil"#,
    ]);

    let first = engine.run(2).unwrap();
    assert_eq!(first.processed, 2);
    assert_eq!(first.total("USD"), Some(dec("17.50")));
    assert_eq!(engine.variable("processing"), Some(Value::Decimal(dec("15"))));

    engine.set_variable("coupon", 5);
    let rest = engine.run_all().unwrap();
    assert_eq!(rest.processed, 2);
    assert_eq!(rest.total("USD"), Some(dec("12.50")));
    assert_eq!(rest.total("POINTS"), Some(dec("11")));
    assert_eq!(rest.fee_items.len(), 5);
    assert_eq!(rest.logs.len(), 4);
}

#[test]
fn test_fee_inclusive_amount_search() {
    // Find the gross amount whose 2% fee plus 1 USD flat fee leaves 1000 net
    let mut engine = Engine::new();
    engine.queue([r#"[emit(Mul(gross, "0.02"), "USD"), emit(1, "USD")]"#]);

    let target = dec("1000");
    let mut gross = target;
    for _ in 0..50 {
        let result = engine
            .reset()
            .set_variable("gross", gross)
            .run_all()
            .unwrap();
        let fees = result.total("USD").unwrap();
        let next = target + fees;
        if next == gross {
            break;
        }
        gross = next;
    }

    let fees = gross * dec("0.02") + Decimal::ONE;
    assert!((gross - fees - target).abs() < dec("0.000001"));
}

#[test]
fn test_string_amounts_keep_precision() {
    let mut engine = Engine::new();
    engine.queue([
        r#"$("123.45", "USD")"#,
        r#"$("0.000000000000000001", "USD")"#,
    ]);
    let result = engine.run_all().unwrap();
    assert_eq!(result.total("USD"), Some(dec("123.450000000000000001")));
}

#[test]
fn test_variable_roundtrip_between_runs() {
    let mut engine = Engine::new();
    engine.set_variable("counter", 0);
    engine.queue(["counter = counter + 1", "counter = counter + 1"]);

    engine.run(1).unwrap();
    assert_eq!(engine.variable("counter"), Some(Value::Int(1)));
    engine.run(1).unwrap();
    assert_eq!(engine.variable("counter"), Some(Value::Int(2)));
}

#[test]
fn test_results_serialize() {
    let mut engine = Engine::new();
    engine.enable_logging().queue([r#"fee = 2; emit(fee, "USD")"#]);
    let result = engine.run_all().unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["processed"], 1);
    assert_eq!(json["fee_items"][0]["currency"], "USD");
    assert_eq!(json["logs"][0]["variables"]["fee"], 2);
    assert!(json.get("context").is_none());
}
