use crate::error::InvalidDocumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance attached by whoever produced the document. Detectors never
/// look at it; reports use `file`, `line` and `column` to place findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Line of the document's first codepoint (1-based).
    #[serde(default = "one")]
    pub line: usize,

    /// Column of the document's first codepoint (1-based).
    #[serde(default = "one")]
    pub column: usize,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

fn one() -> usize {
    1
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            collector: None,
            file: None,
            line: 1,
            column: 1,
            extra: BTreeMap::new(),
        }
    }
}

impl Origin {
    pub fn with_collector(mut self, collector: &str) -> Self {
        self.collector = Some(collector.to_string());
        self
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = line.max(1);
        self.column = column.max(1);
        self
    }

    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key.to_string(), value.to_string());
        self
    }
}

/// Text as produced by a parser, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub source_id: String,
    pub codepoints: Vec<u32>,
    pub origin: Origin,
}

impl RawDocument {
    pub fn new(source_id: impl Into<String>, codepoints: Vec<u32>, origin: Origin) -> Self {
        Self {
            source_id: source_id.into(),
            codepoints,
            origin,
        }
    }

    pub fn from_text(source_id: impl Into<String>, text: &str, origin: Origin) -> Self {
        Self::new(source_id, text.chars().map(u32::from).collect(), origin)
    }

    /// Decodes UTF-16, keeping unpaired surrogates as their raw value so
    /// that validation can reject them with an offset.
    pub fn from_utf16(source_id: impl Into<String>, units: &[u16], origin: Origin) -> Self {
        let codepoints = char::decode_utf16(units.iter().copied())
            .map(|unit| match unit {
                Ok(c) => c as u32,
                Err(e) => u32::from(e.unpaired_surrogate()),
            })
            .collect();
        Self::new(source_id, codepoints, origin)
    }
}

/// A validated, immutable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source_id: String,
    text: Vec<char>,
    origin: Origin,
}

impl Document {
    pub fn new(source_id: impl Into<String>, text: &str) -> Result<Self, InvalidDocumentError> {
        Self::with_origin(source_id, text, Origin::default())
    }

    pub fn with_origin(
        source_id: impl Into<String>,
        text: &str,
        origin: Origin,
    ) -> Result<Self, InvalidDocumentError> {
        let source_id = source_id.into();
        if source_id.is_empty() {
            return Err(InvalidDocumentError::EmptySourceId);
        }
        Ok(Self {
            source_id,
            text: text.chars().collect(),
            origin,
        })
    }

    pub fn try_from_raw(raw: RawDocument) -> Result<Self, InvalidDocumentError> {
        let RawDocument {
            source_id,
            codepoints,
            origin,
        } = raw;

        if source_id.is_empty() {
            return Err(InvalidDocumentError::EmptySourceId);
        }

        let mut text = Vec::with_capacity(codepoints.len());
        for (offset, value) in codepoints.into_iter().enumerate() {
            match char::from_u32(value) {
                Some(c) => text.push(c),
                None if (0xD800..=0xDFFF).contains(&value) => {
                    return Err(InvalidDocumentError::UnpairedSurrogate {
                        source_id,
                        offset,
                        value,
                    });
                }
                None => {
                    return Err(InvalidDocumentError::CodepointOutOfRange {
                        source_id,
                        offset,
                        value,
                    });
                }
            }
        }

        Ok(Self {
            source_id,
            text,
            origin,
        })
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn text(&self) -> &[char] {
        &self.text
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl TryFrom<RawDocument> for Document {
    type Error = InvalidDocumentError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        Self::try_from_raw(raw)
    }
}

/// Codepoint offsets at which each line of a text begins.
///
/// Line breaks are LF, CR, CRLF (counted once), NEL, LS and PS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &[char]) -> Self {
        let mut starts = vec![0];
        let mut i = 0;
        while i < text.len() {
            match text[i] {
                '\r' if text.get(i + 1) == Some(&'\n') => {
                    i += 1;
                    starts.push(i + 1);
                }
                '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}' => starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self { starts }
    }

    /// Zero-based (line, column) of a codepoint offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset).saturating_sub(1);
        (line, offset - self.starts[line])
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
