//! Error kinds: a `thiserror`-derived enum per subsystem, interpolated
//! `#[error("...")]` messages, `#[from]` conversions at the boundary, and a
//! `pub type XResult<T> = Result<T, XError>` alias alongside each.

use thiserror::Error;

/// Raised by the parser. Wraps the underlying `pest` error with the
/// offending source text.
#[derive(Error, Debug)]
#[error("parse error: {0}")]
pub struct ParseError(pub String);

impl From<pest::error::Error<crate::parser::Rule>> for ParseError {
    fn from(e: pest::error::Error<crate::parser::Rule>) -> Self {
        ParseError(e.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Typecheck failures, one variant per invariant check, each citing the
/// offending rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("predicate '{predicate}' has inconsistent arities: {first_arity} and {second_arity}")]
    InconsistentArity { predicate: String, first_arity: usize, second_arity: usize },

    #[error("rule \"{rule}\" is not range restricted: variables {unrestricted_vars:?} do not appear in any positive body literal")]
    NotRangeRestricted { rule: String, unrestricted_vars: Vec<String> },

    #[error("constant-time rule \"{rule}\" has a non-empty body")]
    ConstantTimeWithBody { rule: String },

    #[error("rule \"{rule}\" violates location placement: {reason}")]
    LocationViolation { rule: String, reason: String },
}

pub type TypeResult<T> = Result<T, TypeError>;

/// REPL-only failures, plus the typecheck/parse errors a REPL command can
/// surface while loading or appending a rule.
#[derive(Error, Debug)]
pub enum ReplError {
    #[error("no program loaded")]
    NoProgramLoaded,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("{0}")]
    Io(String),
}

pub type ReplResult<T> = Result<T, ReplError>;
