use thiserror::Error;

/// Errors raised while compiling or running a single expression
///
/// These carry no rule position; the engine attaches one with
/// [`ExpressionError::at_rule`] before handing the error to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The text does not follow the expression grammar
    #[error("Parse error: {0}")]
    Parse(String),

    /// The expression compiled but failed while running
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A configured resource limit was exceeded
    #[error("Resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})")]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
    },
}

impl ExpressionError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    pub fn type_mismatch(operation: &str, expected: &str, actual: &crate::Value) -> Self {
        Self::Runtime(format!(
            "{} expects {}, got {}",
            operation,
            expected,
            actual.describe()
        ))
    }

    /// Attach the queue index of the rule that produced this error
    pub fn at_rule(self, index: usize) -> FeeError {
        match self {
            ExpressionError::Parse(message) => FeeError::Compile { index, message },
            ExpressionError::Runtime(message) => FeeError::Evaluation { index, message },
            ExpressionError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => FeeError::ResourceLimitExceeded {
                index,
                limit_name,
                limit_value,
                actual_value,
            },
        }
    }
}

/// Errors returned by the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeeError {
    /// The caller passed an argument the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine or its context is not in a state that allows the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rule text failed to compile
    #[error("Compile error in rule at index {index}: {message}")]
    Compile { index: usize, message: String },

    /// A compiled rule failed while evaluating
    #[error("Evaluation error in rule at index {index}: {message}")]
    Evaluation { index: usize, message: String },

    /// A rule exceeded one of the configured resource limits
    #[error(
        "Resource limit exceeded in rule at index {index}: {limit_name} (limit: {limit_value}, actual: {actual_value})"
    )]
    ResourceLimitExceeded {
        index: usize,
        limit_name: String,
        limit_value: String,
        actual_value: String,
    },
}

impl FeeError {
    /// Queue index of the rule that failed, if the error came from a rule
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            FeeError::Compile { index, .. }
            | FeeError::Evaluation { index, .. }
            | FeeError::ResourceLimitExceeded { index, .. } => Some(*index),
            FeeError::InvalidArgument(_) | FeeError::InvalidState(_) => None,
        }
    }
}
