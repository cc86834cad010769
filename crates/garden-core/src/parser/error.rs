//! Parser error types

use thiserror::Error;

/// Parser error type
#[derive(Debug, Error)]
pub enum ParserError {
    /// Frontmatter parsing failed
    #[error("Frontmatter parse error: {0}")]
    FrontmatterError(String),

    /// File content is not valid UTF-8
    #[error("Invalid UTF-8 encoding at byte {valid_up_to}")]
    EncodingError {
        /// Length of the valid prefix
        valid_up_to: usize,
    },

    /// General parsing failure
    #[error("Parsing failed: {0}")]
    ParseFailed(String),

    /// Unknown or malformed template selector
    #[error("Invalid template '{0}'")]
    InvalidTemplate(String),
}

/// Specialized Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    /// Create a frontmatter error
    pub fn frontmatter(msg: impl Into<String>) -> Self {
        Self::FrontmatterError(msg.into())
    }

    /// Create a parse failure error
    pub fn parse_failed(msg: impl Into<String>) -> Self {
        Self::ParseFailed(msg.into())
    }

    /// Check if this error is recoverable (the rest of the document is usable)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidTemplate(_))
    }
}

impl From<std::str::Utf8Error> for ParserError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            valid_up_to: err.valid_up_to(),
        }
    }
}
