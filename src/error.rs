use std::fmt;

use crate::host::HostError;

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// The single structural error: loops were not balanced.
///
/// `ip` indexes the filtered command sequence, not the raw source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unmatched bracket {kind} at instruction {ip}")]
pub struct SyntaxError {
    pub ip: usize,
    pub kind: UnmatchedBracketKind,
}

/// Errors surfaced by the public operations of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The program failed bracket validation; nothing was executed or generated.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A tape needs at least one cell.
    #[error("Invalid tape length {0}: the tape needs at least one cell")]
    InvalidTapeLength(usize),

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout).
    #[error("Execution aborted: cancelled")]
    Canceled,

    /// Evaluating generated source failed in the host.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl Error {
    /// The structural error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Error::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
