//! Per-currency aggregation of fee items

use crate::FeeItem;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Sum fee items by currency code
///
/// Currency codes match exactly (case-sensitive). Totals use decimal
/// addition only. The output is ordered by currency code.
pub fn summarize(items: &[FeeItem]) -> Vec<FeeItem> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for item in items {
        *totals.entry(item.currency.as_str()).or_insert(Decimal::ZERO) += item.amount;
    }

    totals
        .into_iter()
        .map(|(currency, amount)| FeeItem::new(amount, currency))
        .collect()
}
