use crate::{Context, Value, Variables};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A monetary effect emitted by a rule
///
/// Fee items are immutable once created. Their order in a result follows
/// rule execution order, then emission order within the rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FeeItem {
    pub amount: Decimal,
    pub currency: String,
}

impl FeeItem {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for FeeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// One execution log entry, recorded per rule when logging is enabled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Rule text as queued
    pub rule: String,
    /// All variables after the rule's mutations were applied
    pub variables: Variables,
    /// Fee items produced by this rule only
    pub fee_items: Vec<FeeItem>,
}

/// What a single rule contributed
///
/// A rule that neither emits nor assigns produces no `RuleResult` at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleResult {
    pub fee_items: Vec<FeeItem>,
    /// Pending variable writes in assignment order; a name appears at most once
    pub mutations: Vec<(String, Value)>,
}

impl RuleResult {
    pub fn is_empty(&self) -> bool {
        self.fee_items.is_empty() && self.mutations.is_empty()
    }
}

/// Snapshot returned from a run call
///
/// Fee items, summary and logs are copies taken when the call finished.
/// `context` is the live shared context, so variable reads through it see
/// later changes.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResult {
    /// Rules processed by this call only
    pub processed: usize,
    /// Every fee item accumulated so far, in execution order
    pub fee_items: Vec<FeeItem>,
    /// Per-currency totals of `fee_items`
    pub summary: Vec<FeeItem>,
    /// Every log entry accumulated so far
    pub logs: Vec<LogEntry>,
    #[serde(skip)]
    pub context: Arc<Context>,
}

impl ExecuteResult {
    /// Total for a currency, if any fee item used it
    pub fn total(&self, currency: &str) -> Option<Decimal> {
        self.summary
            .iter()
            .find(|item| item.currency == currency)
            .map(|item| item.amount)
    }
}
