//! Input parsers
//!
//! Parsers turn the raw bytes of an input file into unvalidated
//! [`RawDocument`]s. Validation happens later, per document, so one bad
//! entry never sinks the rest of its file.

pub mod json_entries;
pub mod plain_text;

pub use json_entries::JsonEntriesParser;
pub use plain_text::PlainTextParser;

use crate::document::RawDocument;
use crate::error::ParseError;
use std::path::Path;

pub trait DocumentParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// File extensions this parser claims, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError>;
}

/// Picks a parser by file extension.
pub fn parser_for_path(path: &Path) -> Option<Box<dyn DocumentParser>> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let candidates: [Box<dyn DocumentParser>; 3] = [
        Box::new(PlainTextParser::new()),
        Box::new(JsonEntriesParser::new()),
        Box::new(JsonEntriesParser::line_delimited()),
    ];
    candidates
        .into_iter()
        .find(|parser| parser.extensions().contains(&extension.as_str()))
}
