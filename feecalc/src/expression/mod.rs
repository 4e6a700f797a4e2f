//! Expression language used inside rules
//!
//! A small, loop-free language: literals, variables, arrays, function calls,
//! arithmetic, comparisons, boolean logic and the ternary operator. Compiling
//! produces a [`Program`]; running it needs an [`Environment`] that resolves
//! variables and host functions.

pub mod ast;
pub mod interpreter;
pub mod parser;

use crate::error::ExpressionError;
use crate::resource_limits::ResourceLimits;
use crate::Value;
use ast::Expression;

/// Variables and host functions visible to a running program
pub trait Environment {
    fn variable(&self, name: &str) -> Option<&Value>;

    fn call(&mut self, name: &str, arguments: Vec<Value>) -> Result<Value, ExpressionError>;
}

/// A compiled expression
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    source: String,
    root: Expression,
}

impl Program {
    pub fn run(&self, env: &mut dyn Environment) -> Result<Value, ExpressionError> {
        interpreter::evaluate(&self.root, env)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.root
    }
}

/// Compile expression text
pub fn compile(text: &str, limits: &ResourceLimits) -> Result<Program, ExpressionError> {
    let root = parser::parse(text, limits)?;
    Ok(Program {
        source: text.to_string(),
        root,
    })
}
