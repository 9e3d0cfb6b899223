//! Error types for JSON scene loading

use thiserror::Error;

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("dimension must be {expected}, found {found}")]
    Dimension { expected: usize, found: u64 },

    #[error("unknown mirror type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Syntax(#[from] serde_json::Error),
}

impl JsonError {
    #[inline]
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}
