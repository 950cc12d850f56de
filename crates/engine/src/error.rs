use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while building a [`crate::properties::PropertyStore`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed dataset entry {location}: {message}")]
    Malformed { location: String, message: String },

    #[error("codepoint {0:#X} is outside the Unicode range")]
    CodepointOutOfRange(u32),

    #[error("invalid codepoint range {start:04X}..{end:04X}")]
    InvalidRange { start: u32, end: u32 },

    #[error("codepoint U+{0:04X} is defined more than once")]
    DuplicateCodepoint(u32),

    #[error("skeleton of U+{source_codepoint:04X} references unassigned codepoint U+{target:04X}")]
    SkeletonReferencesUnassigned { source_codepoint: u32, target: u32 },

    #[error("skeleton of U+{0:04X} is not idempotent")]
    NonIdempotentSkeleton(u32),
}

impl DatasetError {
    pub(crate) fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Per-document rejection. Every variant names the offending document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDocumentError {
    #[error("document has an empty source id")]
    EmptySourceId,

    #[error("document '{source_id}' contains an unpaired surrogate {value:#06X} at offset {offset}")]
    UnpairedSurrogate {
        source_id: String,
        offset: usize,
        value: u32,
    },

    #[error("document '{source_id}' contains out-of-range codepoint {value:#X} at offset {offset}")]
    CodepointOutOfRange {
        source_id: String,
        offset: usize,
        value: u32,
    },
}

impl InvalidDocumentError {
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::EmptySourceId => None,
            Self::UnpairedSurrogate { source_id, .. }
            | Self::CodepointOutOfRange { source_id, .. } => Some(source_id),
        }
    }
}

/// Failure to turn raw input bytes into documents.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{source_name} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        source_name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{source_name} is not valid JSON: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source_name}: entry {index} has neither 'text' nor 'codepoints'")]
    MissingText { source_name: String, index: usize },

    #[error("{source_name}: unsupported document layout")]
    UnsupportedLayout { source_name: String },
}

/// Failure to read back a tabular report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("table is missing its header row")]
    MissingHeader,

    #[error("unexpected table header: {0}")]
    UnexpectedHeader(String),

    #[error("row {line} has {found} fields, expected {expected}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {line} contains an invalid escape sequence")]
    InvalidEscape { line: usize },
}
