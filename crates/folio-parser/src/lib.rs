//! folio parser library
//!
//! Markdown rendering with heading anchors, table of contents extraction and
//! syntect code highlighting.

pub mod markdown;
pub mod syntax;

pub use markdown::{MarkdownRenderer, RenderedMarkdown};
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The configured highlighting theme does not exist.
    #[error("unknown syntax theme `{name}` (available: {available})")]
    UnknownTheme { name: String, available: String },
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
