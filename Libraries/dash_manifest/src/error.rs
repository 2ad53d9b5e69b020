//! Error types for dash_manifest.
//!
//! Only conditions that make a manifest unusable are errors. Everything the player is
//! expected to branch on (a missing segment, an unresolvable template token, an
//! unavailable index range) is reported through return values instead.

use thiserror::Error;

/// Result type for manifest parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A manifest parse failed. No partial graph is ever returned alongside it.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The raw document could not be turned into an attribute tree.
    #[error("failed to read manifest document: {0}")]
    DocumentRead(String),

    /// The attribute tree lacks structure that no attribute map can supply.
    #[error("failed to normalize manifest: {0}")]
    Normalization(String),
}

impl ParseError {
    pub fn document_read(msg: impl Into<String>) -> Self {
        Self::DocumentRead(msg.into())
    }

    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        Self::DocumentRead(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::DocumentRead(e.to_string())
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::DocumentRead(e.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::DocumentRead(e.to_string())
    }
}
