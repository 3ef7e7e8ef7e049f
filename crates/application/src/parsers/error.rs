use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Resumable(String),

    #[error("non resumable parse error: {0}")]
    NonResumable(String),

    #[error("{position}: {inner}")]
    Positioned {
        position: String,
        inner: Box<ParseError>,
    },

    #[error("too many parse errors ({count}), last error: {last}")]
    TooManyErrors { count: usize, last: Box<ParseError> },

    #[error("parsing cancelled")]
    Cancelled,
}

impl ParseError {
    pub fn resumable(msg: impl Into<String>) -> Self {
        ParseError::Resumable(msg.into())
    }

    pub fn non_resumable(msg: impl Into<String>) -> Self {
        ParseError::NonResumable(msg.into())
    }

    /// True when the source must be abandoned. Sees through position wrappers.
    pub fn is_non_resumable(&self) -> bool {
        match self {
            ParseError::Resumable(_) => false,
            ParseError::Positioned { inner, .. } => inner.is_non_resumable(),
            ParseError::NonResumable(_)
            | ParseError::TooManyErrors { .. }
            | ParseError::Cancelled => true,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            ParseError::Cancelled => true,
            ParseError::Positioned { inner, .. } => inner.is_cancelled(),
            _ => false,
        }
    }

    /// Prefixes the error with `position` unless it already carries one.
    pub fn at(self, position: impl Into<String>) -> Self {
        match self {
            ParseError::Positioned { .. } | ParseError::Cancelled => self,
            ParseError::TooManyErrors { .. } => self,
            other => ParseError::Positioned {
                position: position.into(),
                inner: Box::new(other),
            },
        }
    }
}
