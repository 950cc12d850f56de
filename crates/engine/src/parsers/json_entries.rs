use crate::document::{Origin, RawDocument};
use crate::error::ParseError;
use crate::parsers::DocumentParser;
use serde::Deserialize;
use serde_json::Value;

/// A document entry: `text` is the usual form, `codepoints` carries values
/// JSON strings cannot hold (lone surrogates).
#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    codepoints: Option<Vec<u32>>,
}

/// Entry of a collector dump: `{"text_entries": [{"value": ..., "json_path": ...}]}`.
#[derive(Debug, Deserialize)]
struct TextEntry {
    value: String,
    #[serde(default)]
    json_path: Option<String>,
    #[serde(default)]
    field_type: Option<String>,
}

/// Reads JSON inputs.
///
/// Accepted layouts: an array of `{id, text}` / `{id, codepoints}` objects,
/// a collector dump with a `text_entries` list, or any other object, from
/// which every string value is taken. The line-delimited variant reads one
/// entry object per line.
#[derive(Debug, Clone, Default)]
pub struct JsonEntriesParser {
    line_delimited: bool,
}

impl JsonEntriesParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_delimited() -> Self {
        Self {
            line_delimited: true,
        }
    }

    fn origin(source_name: &str) -> Origin {
        Origin::default().with_collector("json").with_file(source_name)
    }

    fn json_error(source_name: &str, source: serde_json::Error) -> ParseError {
        ParseError::Json {
            source_name: source_name.to_string(),
            source,
        }
    }

    fn from_entry(source_name: &str, index: usize, entry: Entry, origin: Origin) -> Result<RawDocument, ParseError> {
        let source_id = entry
            .id
            .unwrap_or_else(|| format!("{}#{}", source_name, index));

        match (entry.text, entry.codepoints) {
            (Some(text), _) => Ok(RawDocument::from_text(source_id, &text, origin)),
            (None, Some(codepoints)) => Ok(RawDocument::new(source_id, codepoints, origin)),
            (None, None) => Err(ParseError::MissingText {
                source_name: source_name.to_string(),
                index,
            }),
        }
    }

    fn parse_entries(&self, source_name: &str, entries: Vec<Value>) -> Result<Vec<RawDocument>, ParseError> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let entry: Entry =
                    serde_json::from_value(value).map_err(|e| Self::json_error(source_name, e))?;
                Self::from_entry(source_name, index, entry, Self::origin(source_name))
            })
            .collect()
    }

    fn parse_text_entries(&self, source_name: &str, entries: Value) -> Result<Vec<RawDocument>, ParseError> {
        let entries: Vec<TextEntry> =
            serde_json::from_value(entries).map_err(|e| Self::json_error(source_name, e))?;

        Ok(entries
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| !entry.value.trim().is_empty())
            .map(|(index, entry)| {
                let mut origin = Self::origin(source_name);
                if let Some(path) = &entry.json_path {
                    origin = origin.with_extra("json_path", path);
                }
                if let Some(field_type) = &entry.field_type {
                    origin = origin.with_extra("field_type", field_type);
                }
                let source_id = match &entry.json_path {
                    Some(path) => format!("{}:{}", source_name, path),
                    None => format!("{}#{}", source_name, index),
                };
                RawDocument::from_text(source_id, &entry.value, origin)
            })
            .collect())
    }

    fn collect_strings(value: &Value, path: String, out: &mut Vec<(String, String)>) {
        match value {
            Value::String(s) if !s.trim().is_empty() => out.push((path, s.clone())),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    Self::collect_strings(item, format!("{}[{}]", path, index), out);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    Self::collect_strings(item, child, out);
                }
            }
            _ => {}
        }
    }

    fn parse_document(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| Self::json_error(source_name, e))?;

        match value {
            Value::Array(entries) => self.parse_entries(source_name, entries),
            Value::Object(mut map) => {
                if let Some(entries) = map.remove("text_entries") {
                    return self.parse_text_entries(source_name, entries);
                }

                let mut strings = Vec::new();
                Self::collect_strings(&Value::Object(map), String::new(), &mut strings);
                Ok(strings
                    .into_iter()
                    .map(|(path, text)| {
                        let origin = Self::origin(source_name).with_extra("json_path", &path);
                        RawDocument::from_text(format!("{}:{}", source_name, path), &text, origin)
                    })
                    .collect())
            }
            _ => Err(ParseError::UnsupportedLayout {
                source_name: source_name.to_string(),
            }),
        }
    }

    fn parse_lines(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError> {
        let content = std::str::from_utf8(bytes).map_err(|source| ParseError::InvalidUtf8 {
            source_name: source_name.to_string(),
            source,
        })?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let entry: Entry =
                    serde_json::from_str(line).map_err(|e| Self::json_error(source_name, e))?;
                let origin = Self::origin(source_name).with_position(index + 1, 1);
                Self::from_entry(source_name, index, entry, origin)
            })
            .collect()
    }
}

impl DocumentParser for JsonEntriesParser {
    fn name(&self) -> &'static str {
        if self.line_delimited {
            "jsonl"
        } else {
            "json"
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        if self.line_delimited {
            &["jsonl", "ndjson"]
        } else {
            &["json"]
        }
    }

    fn parse(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<RawDocument>, ParseError> {
        if self.line_delimited {
            self.parse_lines(source_name, bytes)
        } else {
            self.parse_document(source_name, bytes)
        }
    }
}
