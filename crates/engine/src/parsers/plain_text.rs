use crate::document::{Origin, RawDocument};
use crate::error::ParseError;
use crate::parsers::DocumentParser;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// One document per non-blank line.
///
/// UTF-8 is the default. A UTF-16 byte order mark switches to UTF-16, where
/// unpaired surrogates are kept as raw values so that validation can report
/// them with their position.
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    pub fn new() -> Self {
        Self
    }

    fn origin(source_name: &str, line: usize) -> Origin {
        Origin::default()
            .with_collector("text")
            .with_file(source_name)
            .with_position(line, 1)
    }

    fn parse_utf8(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError> {
        let content = std::str::from_utf8(bytes).map_err(|source| ParseError::InvalidUtf8 {
            source_name: source_name.to_string(),
            source,
        })?;

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let line_number = index + 1;
                RawDocument::from_text(
                    format!("{}:{}", source_name, line_number),
                    line,
                    Self::origin(source_name, line_number),
                )
            })
            .collect())
    }

    fn parse_utf16(&self, source_name: &str, bytes: &[u8], little_endian: bool) -> Vec<RawDocument> {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| {
                let pair = [pair[0], pair[1]];
                if little_endian {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                }
            })
            .collect();

        units
            .split(|&unit| unit == 0x000A)
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.strip_suffix(&[0x000D]).unwrap_or(line);
                let blank = line
                    .iter()
                    .all(|&unit| char::from_u32(unit as u32).map_or(false, char::is_whitespace));
                if blank {
                    return None;
                }
                let line_number = index + 1;
                Some(RawDocument::from_utf16(
                    format!("{}:{}", source_name, line_number),
                    line,
                    Self::origin(source_name, line_number),
                ))
            })
            .collect()
    }
}

impl DocumentParser for PlainTextParser {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "text", "md"]
    }

    fn parse(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError> {
        if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
            return Ok(self.parse_utf16(source_name, rest, true));
        }
        if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
            return Ok(self.parse_utf16(source_name, rest, false));
        }
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        self.parse_utf8(source_name, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_document_per_line() {
        let documents = PlainTextParser::new()
            .parse("input.txt", "first\n\n  \nthird\r\n".as_bytes())
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_id, "input.txt:1");
        assert_eq!(documents[1].source_id, "input.txt:4");
        assert_eq!(documents[1].origin.line, 4);
        assert_eq!(documents[1].origin.file.as_deref(), Some("input.txt"));
        assert_eq!(documents[1].codepoints, vec![0x74, 0x68, 0x69, 0x72, 0x64]);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = PlainTextParser::new()
            .parse("broken.txt", &[0x61, 0xFF, 0x62])
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_utf16_keeps_unpaired_surrogates() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in [0x0061u16, 0xD800, 0x000A, 0x0062] {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let documents = PlainTextParser::new().parse("wide.txt", &bytes).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].codepoints, vec![0x61, 0xD800]);
        assert_eq!(documents[1].codepoints, vec![0x62]);
        assert_eq!(documents[1].origin.line, 2);
    }
}
