//! Errors of the type layer.
//!
//! Unification failures carry the two offending handles; the typer renders
//! them (and the syntax element it was checking) into owned strings, so the
//! error types stay free of borrows into the typing context.

use std::fmt;

use thiserror::Error;

use super::context::TypingContext;
use super::ty::TypeHandle;

/// How a unification attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnifyErrorKind {
    /// One side is a variable occurring inside the other (infinite type).
    Occurs,
    /// Both sides are concrete with different type constructors.
    Mismatch,
}

/// A failed unification of two type terms.
#[derive(Debug, Clone, Copy)]
pub struct UnifyError {
    pub kind: UnifyErrorKind,
    pub left: TypeHandle,
    pub right: TypeHandle,
}

impl UnifyError {
    pub fn name(&self) -> &'static str {
        "Unification error"
    }

    /// Render the failure with both type terms printed through `ctx`.
    pub fn describe(&self, ctx: &TypingContext) -> String {
        let left = crate::fmt::type_to_string(self.left, ctx);
        let right = crate::fmt::type_to_string(self.right, ctx);
        match self.kind {
            UnifyErrorKind::Occurs => format!("type {left} occurs in {right}"),
            UnifyErrorKind::Mismatch => {
                format!("{left} and {right} have different type constructors")
            }
        }
    }
}

/// A type error pinned to one syntax element.
#[derive(Debug, Clone, Error)]
#[error("While typing {item}: {detail}")]
pub struct TypingError {
    /// Printed form of the syntax element under check.
    pub item: String,
    /// Rendered unification failure.
    pub detail: String,
}

/// All type errors of a program, one per failing definition or statement.
#[derive(Debug, Clone, Error)]
pub struct TypeErrors(pub Vec<TypingError>);

impl TypeErrors {
    pub fn name(&self) -> &'static str {
        "Type error"
    }
}

impl fmt::Display for TypeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{single}");
        }
        for error in &self.0 {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}
