use crate::error::ExpressionError;
use crate::evaluator;
use crate::preprocess::preprocess;
use crate::{
    summarize, Context, ExecuteResult, FeeError, FeeResult, ResourceLimits, Value, Variables,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The fee rule engine.
///
/// Owns an ordered queue of rule texts and runs them against a shared
/// [`Context`]. Execution is resumable: the context's cursor records how
/// many queued rules have run, and each `run` call continues from there.
pub struct Engine {
    context: Arc<Context>,
    /// Variables as they were when the engine was built; `reset` restores these
    initial_variables: Variables,
    rules: Vec<String>,
    limits: ResourceLimits,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_context(Arc::new(Context::new()))
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine on top of an existing context
    ///
    /// The context's variables at this moment become the reset snapshot.
    pub fn with_context(context: Arc<Context>) -> Self {
        let initial_variables = context.variables();
        Self {
            context,
            initial_variables,
            rules: Vec::new(),
            limits: ResourceLimits::default(),
        }
    }

    /// Create an engine with custom resource limits
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Replace the resource limits
    pub fn set_limits(&mut self, limits: ResourceLimits) -> &mut Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// The shared context; variable reads through it are live
    pub fn context(&self) -> Arc<Context> {
        Arc::clone(&self.context)
    }

    /// Append rules to the queue
    ///
    /// Allowed at any time, including after the queue was fully executed.
    pub fn queue<I, S>(&mut self, rules: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Queued rules in queue order
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Record a log entry for every rule executed from now on
    pub fn enable_logging(&mut self) -> &mut Self {
        self.context.enable_logging();
        self
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.context.set_variable(name, value);
        self
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.context.variable(name)
    }

    /// Restore the construction-time variables and clear fee items, logs
    /// and cursor. The queue is kept.
    pub fn reset(&mut self) -> &mut Self {
        self.context.reset_to(self.initial_variables.clone());
        debug!(rules = self.rules.len(), "Engine reset");
        self
    }

    /// Run up to `count` queued rules from the cursor
    ///
    /// Running past the end of the queue stops at the end; a call on an
    /// exhausted queue succeeds with zero rules processed. If a rule fails,
    /// the rules before it stay committed and the cursor stays on the
    /// failing rule.
    pub fn run(&mut self, count: usize) -> FeeResult<ExecuteResult> {
        if count == 0 {
            return Err(FeeError::InvalidArgument(
                "count must be greater than zero".to_string(),
            ));
        }

        let start = self.checked_cursor()?;
        let end = start.saturating_add(count).min(self.rules.len());

        for index in start..end {
            let rule = &self.rules[index];
            if let Err(err) = self.execute_rule(index, rule) {
                let err = err.at_rule(index);
                warn!(index, error = %err, "Rule failed");
                return Err(err);
            }
            self.context.set_cursor(index + 1);
        }

        let processed = end - start;
        info!(processed, cursor = end, queued = self.rules.len(), "Run finished");
        Ok(self.snapshot(processed))
    }

    /// Run every rule left in the queue
    ///
    /// Fails with `InvalidArgument` when nothing is left to run, the same
    /// way `run(0)` does.
    pub fn run_all(&mut self) -> FeeResult<ExecuteResult> {
        let remaining = self.rules.len() - self.checked_cursor()?;
        if remaining == 0 {
            return Err(FeeError::InvalidArgument(
                "no queued rules left to run".to_string(),
            ));
        }
        self.run(remaining)
    }

    /// The context's cursor, validated against this engine's queue
    fn checked_cursor(&self) -> FeeResult<usize> {
        let cursor = self.context.cursor();
        if cursor > self.rules.len() {
            return Err(FeeError::InvalidState(format!(
                "context cursor {} is past the end of a queue of {} rules",
                cursor,
                self.rules.len()
            )));
        }
        Ok(cursor)
    }

    fn execute_rule(&self, index: usize, rule: &str) -> Result<(), ExpressionError> {
        if rule.len() > self.limits.max_rule_bytes {
            return Err(ExpressionError::ResourceLimitExceeded {
                limit_name: "max_rule_bytes".to_string(),
                limit_value: self.limits.max_rule_bytes.to_string(),
                actual_value: rule.len().to_string(),
            });
        }

        let statements = preprocess(rule);
        let result = evaluator::evaluate(&statements, self.context.variables(), &self.limits)?;

        debug!(
            index,
            statements = statements.len(),
            fee_items = result.as_ref().map_or(0, |r| r.fee_items.len()),
            mutations = result.as_ref().map_or(0, |r| r.mutations.len()),
            "Rule executed"
        );

        self.context.commit(rule, result);
        Ok(())
    }

    fn snapshot(&self, processed: usize) -> ExecuteResult {
        let fee_items = self.context.fee_items();
        ExecuteResult {
            processed,
            summary: summarize(&fee_items),
            fee_items,
            logs: self.context.logs(),
            context: Arc::clone(&self.context),
        }
    }
}
