//! # Feecalc Engine
//!
//! **Fee rules you can pause and resume**
//!
//! Feecalc runs a queue of small rule expressions against a shared set of
//! variables, collects the monetary effects (fee items) they emit, and
//! totals them per currency. Execution is cursor based: run a few rules,
//! inspect the state, adjust a variable, and continue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feecalc::{Context, Engine, FeeResult};
//! use std::sync::Arc;
//!
//! fn main() -> FeeResult<()> {
//!     let context = Context::with_variables([("amount", 1000.0), ("rate", 0.02)]);
//!     let mut engine = Engine::with_context(Arc::new(context));
//!
//!     engine.queue([
//!         r#"emit(amount * rate, "USD")"#,
//!         r#"amount = amount * 2; emit(amount * rate, "USD")"#,
//!     ]);
//!
//!     let result = engine.run_all()?;
//!     assert_eq!(result.processed, 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rules
//! A rule is one or more `;`-separated statements. `name = expr` assigns a
//! variable; any other statement is evaluated for its value. The value of
//! the last statement decides which fee items the rule emits.
//!
//! ### Fee items
//! `emit(amount, currency)` produces an immutable `(amount, currency)`
//! pair. Amounts are exact decimals regardless of the input scalar kind.
//!
//! ### Cursor
//! The engine remembers how many queued rules have run. `run(n)` continues
//! from there; `reset()` rewinds to the variables the engine was built with.

pub mod aggregate;
pub mod coercion;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod preprocess;
pub mod resource_limits;
pub mod response;
pub mod value;

pub use aggregate::summarize;
pub use coercion::to_decimal;
pub use context::{Context, Variables};
pub use engine::Engine;
pub use error::{ExpressionError, FeeError};
pub use resource_limits::ResourceLimits;
pub use response::{ExecuteResult, FeeItem, LogEntry, RuleResult};
pub use value::Value;

/// Result type for feecalc operations
pub type FeeResult<T> = Result<T, FeeError>;

#[cfg(test)]
mod tests;
