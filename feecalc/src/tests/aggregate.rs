use crate::{summarize, FeeItem};
use rust_decimal::Decimal;
use std::str::FromStr;

fn fee(amount: &str, currency: &str) -> FeeItem {
    FeeItem::new(Decimal::from_str(amount).unwrap(), currency)
}

#[test]
fn test_summarize_groups_by_currency() {
    let summary = summarize(&[
        fee("10", "USD"),
        fee("5.5", "EUR"),
        fee("0.25", "USD"),
    ]);
    assert_eq!(summary, vec![fee("5.5", "EUR"), fee("10.25", "USD")]);
}

#[test]
fn test_summarize_is_case_sensitive() {
    let summary = summarize(&[fee("1", "usd"), fee("2", "USD")]);
    assert_eq!(summary.len(), 2);
}

#[test]
fn test_summarize_is_exact() {
    let items: Vec<FeeItem> = (0..10).map(|_| fee("0.1", "USD")).collect();
    assert_eq!(summarize(&items), vec![fee("1", "USD")]);
}

#[test]
fn test_summarize_empty() {
    assert!(summarize(&[]).is_empty());
}
