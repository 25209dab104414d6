//! Error types for saxtree

use std::fmt;
use thiserror::Error;

/// Position in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source input
///
/// Decoder errors carry an empty span when the failure is about event
/// ordering rather than a byte position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// End-element name does not match the open frame, or the document
    /// ended with elements still open
    UnbalancedTags { expected: String, found: String },
    /// Characters or end-element received before any start-element
    EventBeforeStart,
    /// Any event received after the root element closed
    EventAfterFinish,
    /// Non-whitespace text under a frame that already holds child elements
    MixedContent { element: String },
    /// `finish()` called before any start-element
    EmptyDocument,
    MaxDepthExceeded { max: u16 },
    // Tokenizer-level kinds
    InvalidToken,
    UnterminatedElement,
    InvalidEntity { entity: String },
    DuplicateAttribute { name: String },
    InvalidUtf8,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedTags { expected, found } => {
                write!(f, "unbalanced tags: expected </{expected}>, found {found}")
            }
            Self::EventBeforeStart => write!(f, "event received before document start"),
            Self::EventAfterFinish => write!(f, "event received after document end"),
            Self::MixedContent { element } => {
                write!(f, "mixed content under element <{element}>")
            }
            Self::EmptyDocument => write!(f, "document contains no elements"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnterminatedElement => write!(f, "unterminated element"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity: &{entity};"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
        }
    }
}

/// Main error type for saxtree
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, offset: usize, line: u32, col: u32) -> Self {
        let pos = Pos::new(offset, line, col);
        Self::new(kind, Span::new(pos, pos))
    }

    /// Create error with no position (decoder session errors)
    pub fn unpositioned(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.span.start, self.message)
    }
}

/// Result type alias for saxtree
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "42:10:5");
    }

    #[test]
    fn test_error_creation() {
        let err = Error::at(ErrorKind::InvalidToken, 0, 1, 1);
        assert_eq!(err.kind(), &ErrorKind::InvalidToken);
    }

    #[test]
    fn test_error_display() {
        let err = Error::unpositioned(ErrorKind::UnbalancedTags {
            expected: "a".to_string(),
            found: "b".to_string(),
        });
        let display = err.to_string();
        assert!(display.contains("unbalanced tags"));
        assert!(display.contains("</a>"));
    }

    #[test]
    fn test_mixed_content_display() {
        let err = Error::unpositioned(ErrorKind::MixedContent {
            element: "person".to_string(),
        });
        assert!(err.to_string().contains("<person>"));
    }
}
