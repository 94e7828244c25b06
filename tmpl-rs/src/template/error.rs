//! Template error types.
//!
//! [`SyntaxError`] covers everything that can be wrong with a template or with
//! the references it makes into the [`Context`](super::Context): malformed
//! directive lines, unknown names and bad indices.  [`Error`] is what the
//! instantiation entry points return; it pins a [`SyntaxError`] to the input
//! line it came from, or carries an I/O failure on either stream.

use std::io;

/// A malformed directive or an unresolvable reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// A directive line with nothing after the prefix.
    #[error("empty directive")]
    EmptyDirective,

    /// The first word of a directive line is not a known keyword.
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    /// The directive was given the wrong number of arguments.
    #[error("directive '{keyword}' takes {expected} argument(s), got {found}")]
    WrongArity {
        keyword: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown vector '{0}'")]
    UnknownVector(String),

    /// The index variable does not hold a non-negative integer.
    #[error("index '{index}' is not an integer (value '{value}')")]
    IndexNotInteger { index: String, value: String },

    #[error("index '{index}' out of range at position {position}")]
    IndexOutOfRange { index: String, position: usize },

    /// A loop tried to bind its iterator over an existing vector.
    #[error("loop iterator '{0}' is already defined as a vector")]
    IteratorIsVector(String),

    #[error("endif without a matching if")]
    UnbalancedEndIf,

    #[error("endloop without a matching loop")]
    UnbalancedEndLoop,
}

/// Failure of a whole instantiation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The directive read from `line` (1-based) could not be processed.
    #[error("line {line}: {kind}")]
    Syntax { line: usize, kind: SyntaxError },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The syntax error behind this failure, if it was not an I/O problem.
    pub fn syntax(&self) -> Option<&SyntaxError> {
        match self {
            Error::Syntax { kind, .. } => Some(kind),
            Error::Io(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
