//! Error types for the markup engine
//!
//! Ordering and bracket problems are *health classifications* (see
//! `validate`), not errors: they are queryable states, never raised by the
//! call that produced them.

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, MarkupError>;

/// Unified markup error type
#[derive(Error, Debug)]
pub enum MarkupError {
    /// A mark of this kind already exists for the paragraph; the call was a no-op
    #[error("Paragraph {paragraph_id} already has a {kind} mark")]
    DuplicateMark { paragraph_id: String, kind: String },

    /// An end mark was requested before the paragraph has a start mark
    #[error("Paragraph {0} has no start mark yet")]
    MissingStart(String),

    /// A zone add or an export needs both boundary marks
    #[error("Incomplete mark pair for paragraph(s): {}", paragraphs.join(", "))]
    IncompletePair { paragraphs: Vec<String> },

    /// Underlying document or markup file cannot be opened
    #[error("Source load failed: {0}")]
    SourceLoad(String),

    /// Required site configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cooperative cancellation observed during the TOC fetch
    #[error("Cancelled by operator")]
    Cancelled,

    /// Course-system fetch failed
    #[error("TOC fetch error: {0}")]
    TocFetch(String),

    /// XML error in the markup record layer
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 error when decoding a record file
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<reqwest::Error> for MarkupError {
    fn from(err: reqwest::Error) -> Self {
        MarkupError::TocFetch(err.to_string())
    }
}
