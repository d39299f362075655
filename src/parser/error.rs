//! Parse errors.
//!
//! Every error records the line it was raised on and the line where the
//! enclosing construct began, so `(case` three screens above a missing
//! clause is still findable.

use std::fmt;

use thiserror::Error;

use crate::ast::Polarity;

#[derive(Debug, Clone, Error)]
#[error("On line {cause_line}, while parsing a {context} (starting on line {context_line}): {kind}")]
pub struct ParseError {
    /// Line of the failing token.
    pub cause_line: usize,
    /// Line where the enclosing construct began.
    pub context_line: usize,
    /// Name of the syntax element being parsed.
    pub context: String,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// An unexpected character, or `None` for end of input.
    UnexpectedChar(Option<char>),
    /// A free (co)variable, unknown structor or undefined definition.
    UnknownName { syntax_kind: String, name: String },
    /// Wrong number of arguments (producer polarity) or coarguments
    /// (consumer polarity).
    ArityMismatch {
        name: String,
        polarity: Polarity,
        expected: usize,
        actual: usize,
    },
    /// A structural problem: duplicate definition, reserved name,
    /// bad literal, non-total clause set.
    Invalid(String),
}

impl ParseError {
    pub fn name(&self) -> &'static str {
        "Parse error"
    }

    pub fn unexpected(
        cause_line: usize,
        context_line: usize,
        context: impl Into<String>,
        unexpected: Option<char>,
    ) -> Self {
        ParseError {
            cause_line,
            context_line,
            context: context.into(),
            kind: ParseErrorKind::UnexpectedChar(unexpected),
        }
    }

    pub fn unknown_name(
        cause_line: usize,
        context_line: usize,
        context: impl Into<String>,
        syntax_kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ParseError {
            cause_line,
            context_line,
            context: context.into(),
            kind: ParseErrorKind::UnknownName {
                syntax_kind: syntax_kind.into(),
                name: name.into(),
            },
        }
    }

    pub fn arity_mismatch(
        cause_line: usize,
        context_line: usize,
        context: impl Into<String>,
        name: impl Into<String>,
        polarity: Polarity,
        expected: usize,
        actual: usize,
    ) -> Self {
        ParseError {
            cause_line,
            context_line,
            context: context.into(),
            kind: ParseErrorKind::ArityMismatch {
                name: name.into(),
                polarity,
                expected,
                actual,
            },
        }
    }

    pub fn invalid(
        cause_line: usize,
        context_line: usize,
        context: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        ParseError {
            cause_line,
            context_line,
            context: context.into(),
            kind: ParseErrorKind::Invalid(explanation.into()),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedChar(Some(c)) => write!(f, "unexpected '{c}'"),
            ParseErrorKind::UnexpectedChar(None) => write!(f, "unexpected end of input"),
            ParseErrorKind::UnknownName { syntax_kind, name } => {
                write!(f, "unknown {syntax_kind}: {name}")
            }
            ParseErrorKind::ArityMismatch {
                name,
                polarity,
                expected,
                actual,
            } => {
                let which = match polarity {
                    Polarity::Producer => "arity",
                    Polarity::Consumer => "coarity",
                };
                write!(f, "{which} mismatch: {name} expects {expected}, got {actual}")
            }
            ParseErrorKind::Invalid(explanation) => write!(f, "{explanation}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_both_lines() {
        let error = ParseError::unexpected(7, 3, "case expression", Some('}'));
        assert_eq!(
            error.to_string(),
            "On line 7, while parsing a case expression (starting on line 3): unexpected '}'"
        );
    }

    #[test]
    fn eof_renders_specially() {
        let error = ParseError::unexpected(1, 1, "cut statement", None);
        assert!(error.to_string().ends_with("unexpected end of input"));
    }

    #[test]
    fn arity_and_coarity_are_distinguished() {
        let error = ParseError::arity_mismatch(2, 2, "constructor", "Cons", Polarity::Producer, 2, 1);
        assert!(error.to_string().contains("arity mismatch: Cons expects 2, got 1"));
        let error =
            ParseError::arity_mismatch(2, 2, "destructor", "Ap", Polarity::Consumer, 1, 0);
        assert!(error.to_string().contains("coarity mismatch: Ap expects 1, got 0"));
    }
}
