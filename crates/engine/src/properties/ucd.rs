//! Readers for the Unicode Character Database text formats.
//!
//! Both `confusables.txt` and `IdentifierStatus.txt` from UTS #39 share the
//! same line grammar: semicolon-separated fields, `#` comments, hex
//! codepoints, and `XXXX..YYYY` ranges.

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};

pub const MAX_CODEPOINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodepointRange {
    pub start: u32,
    pub end: u32,
}

impl CodepointRange {
    pub fn single(codepoint: u32) -> Self {
        Self {
            start: codepoint,
            end: codepoint,
        }
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        self.start <= codepoint && codepoint <= self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

/// One `source ; target` line of `confusables.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusableMapping {
    pub source: u32,
    pub target: Vec<u32>,
}

pub fn parse_codepoint(field: &str, location: &str) -> Result<u32, DatasetError> {
    let field = field.trim();
    let field = field
        .strip_prefix("U+")
        .or_else(|| field.strip_prefix("u+"))
        .unwrap_or(field);
    let value = u32::from_str_radix(field, 16).map_err(|_| {
        DatasetError::malformed(location, format!("'{}' is not a hex codepoint", field))
    })?;
    if value > MAX_CODEPOINT {
        return Err(DatasetError::CodepointOutOfRange(value));
    }
    Ok(value)
}

pub fn parse_codepoint_range(field: &str, location: &str) -> Result<CodepointRange, DatasetError> {
    let range = match field.trim().split_once("..") {
        Some((start, end)) => CodepointRange {
            start: parse_codepoint(start, location)?,
            end: parse_codepoint(end, location)?,
        },
        None => CodepointRange::single(parse_codepoint(field, location)?),
    };
    if range.start > range.end {
        return Err(DatasetError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(range)
}

/// Space-separated hex codepoints, e.g. `0072 006E`.
pub fn parse_hex_sequence(field: &str, location: &str) -> Result<Vec<u32>, DatasetError> {
    field
        .split_whitespace()
        .map(|part| parse_codepoint(part, location))
        .collect()
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(index, line)| {
        let line = line.trim_start_matches('\u{FEFF}');
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            None
        } else {
            Some((index + 1, content))
        }
    })
}

pub fn parse_confusables(text: &str) -> Result<Vec<ConfusableMapping>, DatasetError> {
    let mut mappings = Vec::new();

    for (line_number, content) in data_lines(text) {
        let location = format!("confusables line {}", line_number);
        let fields: Vec<&str> = content.split(';').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(DatasetError::malformed(
                location,
                "expected 'source ; target ; type'",
            ));
        }

        let source = parse_codepoint(fields[0], &location)?;
        let target = parse_hex_sequence(fields[1], &location)?;
        if target.is_empty() {
            return Err(DatasetError::malformed(location, "empty target sequence"));
        }

        mappings.push(ConfusableMapping { source, target });
    }

    Ok(mappings)
}

/// Returns the ranges marked `Allowed`; every other status line is skipped.
pub fn parse_identifier_status(text: &str) -> Result<Vec<CodepointRange>, DatasetError> {
    let mut allowed = Vec::new();

    for (line_number, content) in data_lines(text) {
        let location = format!("identifier status line {}", line_number);
        let (range_field, status_field) = content.split_once(';').ok_or_else(|| {
            DatasetError::malformed(location.clone(), "expected 'range ; status'")
        })?;

        let range = parse_codepoint_range(range_field, &location)?;
        if status_field.trim() == "Allowed" {
            allowed.push(range);
        }
    }

    Ok(allowed)
}

/// Sorts and coalesces adjacent or overlapping ranges.
pub fn normalize_ranges(mut ranges: Vec<CodepointRange>) -> Vec<CodepointRange> {
    ranges.sort();
    let mut merged: Vec<CodepointRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

pub fn ranges_contain(ranges: &[CodepointRange], codepoint: u32) -> bool {
    let index = ranges.partition_point(|range| range.end < codepoint);
    ranges
        .get(index)
        .map_or(false, |range| range.contains(codepoint))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFUSABLES_SAMPLE: &str = "\u{FEFF}# confusables.txt\n\
        # Version: 14.0.0\n\
        \n\
        0430 ;\t0061 ;\tMA\t# ( а → a ) CYRILLIC SMALL LETTER A → LATIN SMALL LETTER A\n\
        006D ;\t0072 006E ;\tMA\t# ( m → rn )\n";

    const STATUS_SAMPLE: &str = "# IdentifierStatus.txt\n\
        0030..0039    ; Allowed    # 1.1  [10] DIGIT ZERO..DIGIT NINE\n\
        0041..005A    ; Allowed    # 1.1  [26] LATIN CAPITAL LETTER A..Z\n\
        00B7          ; Allowed    # 1.1       MIDDLE DOT\n\
        2160..2188    ; Restricted # legacy line\n";

    #[test]
    fn test_parse_confusables() {
        let mappings = parse_confusables(CONFUSABLES_SAMPLE).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0], ConfusableMapping { source: 0x430, target: vec![0x61] });
        assert_eq!(mappings[1].target, vec![0x72, 0x6E]);
    }

    #[test]
    fn test_parse_confusables_reports_line() {
        let err = parse_confusables("0430 0061\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_identifier_status_keeps_allowed() {
        let ranges = parse_identifier_status(STATUS_SAMPLE).unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], CodepointRange { start: 0x30, end: 0x39 });
        assert!(ranges[2].is_single());
    }

    #[test]
    fn test_parse_range_rejects_reversed_and_out_of_range() {
        assert!(matches!(
            parse_codepoint_range("0050..0040", "test"),
            Err(DatasetError::InvalidRange { .. })
        ));
        assert!(matches!(
            parse_codepoint("110000", "test"),
            Err(DatasetError::CodepointOutOfRange(0x110000))
        ));
    }

    #[test]
    fn test_normalize_and_contains() {
        let ranges = normalize_ranges(vec![
            CodepointRange { start: 10, end: 20 },
            CodepointRange { start: 0, end: 4 },
            CodepointRange { start: 21, end: 25 },
        ]);
        assert_eq!(ranges.len(), 2);
        assert!(ranges_contain(&ranges, 25));
        assert!(!ranges_contain(&ranges, 5));
    }
}
