//! Runtime errors.

use thiserror::Error;

use crate::ast::Statement;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The interpreter mutates its state while running and cannot be
    /// re-entered.
    #[error("Interpreter has already run")]
    AlreadyRun,
    /// No reduction or focusing rule applied. Unreachable on programs that
    /// passed the typer.
    #[error("No reduction or focusing rule found for statement:\n{0}")]
    StuckComputation(Box<Statement>),
}

impl RuntimeError {
    pub fn name(&self) -> &'static str {
        "Interpreter error"
    }

    pub(crate) fn stuck(statement: Statement) -> Self {
        RuntimeError::StuckComputation(Box::new(statement))
    }
}
