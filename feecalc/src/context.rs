//! Shared execution state
//!
//! A [`Context`] holds the variables rules read and write, the fee items
//! they emitted, the optional execution log and the cursor. It is shared
//! through an `Arc` and guarded by a single reader/writer lock. The lock
//! protects individual reads and writes; it does not make a whole `run`
//! call atomic, so only one run or reset per context should be in flight.

use crate::{FeeItem, LogEntry, RuleResult, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Variable name to value
pub type Variables = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default)]
struct ContextState {
    variables: Variables,
    fee_items: Vec<FeeItem>,
    logs: Vec<LogEntry>,
    cursor: usize,
}

#[derive(Default)]
pub struct Context {
    state: RwLock<ContextState>,
    logging: AtomicBool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with variables
    pub fn with_variables<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let variables = variables
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self {
            state: RwLock::new(ContextState {
                variables,
                ..ContextState::default()
            }),
            logging: AtomicBool::new(false),
        }
    }

    /// Seed fee items carried over from earlier work
    ///
    /// They are included in every result's fee items and summary until the
    /// engine is reset.
    pub fn with_fee_items<I>(mut self, fee_items: I) -> Self
    where
        I: IntoIterator<Item = FeeItem>,
    {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .fee_items
            .extend(fee_items);
        self
    }

    // Every write leaves the state consistent, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, ContextState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContextState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.read().variables.get(name).cloned()
    }

    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().variables.insert(name.into(), value.into());
    }

    /// Copy of all variables
    pub fn variables(&self) -> Variables {
        self.read().variables.clone()
    }

    /// Copy of every fee item emitted so far, in execution order
    pub fn fee_items(&self) -> Vec<FeeItem> {
        self.read().fee_items.clone()
    }

    /// Copy of the execution log
    pub fn logs(&self) -> Vec<LogEntry> {
        self.read().logs.clone()
    }

    /// Number of queued rules already executed
    pub fn cursor(&self) -> usize {
        self.read().cursor
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }

    pub(crate) fn enable_logging(&self) {
        self.logging.store(true, Ordering::Relaxed);
    }

    /// Apply a successful rule's result
    ///
    /// Fee items are appended and mutations written in order. When logging
    /// is on, a log entry with the post-merge variables is appended as well.
    /// A rule without a result still gets a log entry.
    pub(crate) fn commit(&self, rule: &str, result: Option<RuleResult>) {
        let logging = self.logging_enabled();
        let mut state = self.write();

        let fee_items = match result {
            Some(RuleResult {
                fee_items,
                mutations,
            }) => {
                for (name, value) in mutations {
                    state.variables.insert(name, value);
                }
                state.fee_items.extend(fee_items.iter().cloned());
                fee_items
            }
            None => Vec::new(),
        };

        if logging {
            let entry = LogEntry {
                rule: rule.to_string(),
                variables: state.variables.clone(),
                fee_items,
            };
            state.logs.push(entry);
        }
    }

    pub(crate) fn set_cursor(&self, cursor: usize) {
        self.write().cursor = cursor;
    }

    /// Replace the variables and clear fee items, logs and cursor
    pub(crate) fn reset_to(&self, variables: Variables) {
        let mut state = self.write();
        *state = ContextState {
            variables,
            ..ContextState::default()
        };
    }
}

impl Clone for Context {
    /// Deep copy; the clone shares nothing with the original
    fn clone(&self) -> Self {
        Self {
            state: RwLock::new(self.read().clone()),
            logging: AtomicBool::new(self.logging_enabled()),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Context")
            .field("variables", &state.variables)
            .field("fee_items", &state.fee_items.len())
            .field("logs", &state.logs.len())
            .field("cursor", &state.cursor)
            .field("logging", &self.logging_enabled())
            .finish()
    }
}
