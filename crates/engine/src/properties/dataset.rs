use crate::error::DatasetError;
use crate::properties::ucd::{self, CodepointRange, ConfusableMapping};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_DATASET: &str = include_str!("../../data/builtin.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub unicode_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One dataset line: a codepoint or `XXXX..YYYY` range and its properties.
///
/// Fields stay textual until the store is built so that every validation
/// failure can name the entry it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetEntry {
    pub codepoints: String,
    pub script: String,
    pub category: String,
    pub bidi_class: String,

    #[serde(default = "default_identifier_status")]
    pub identifier_status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<String>,
}

fn default_identifier_status() -> String {
    "Restricted".to_string()
}

impl DatasetEntry {
    pub fn new(codepoints: &str, script: &str, category: &str, bidi_class: &str) -> Self {
        Self {
            codepoints: codepoints.to_string(),
            script: script.to_string(),
            category: category.to_string(),
            bidi_class: bidi_class.to_string(),
            identifier_status: default_identifier_status(),
            skeleton: None,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.identifier_status = status.to_string();
        self
    }

    pub fn with_skeleton(mut self, skeleton: &str) -> Self {
        self.skeleton = Some(skeleton.to_string());
        self
    }
}

/// Unvalidated property data, turned into a [`super::PropertyStore`] by
/// [`super::PropertyStore::from_dataset`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub metadata: DatasetMetadata,

    pub entries: Vec<DatasetEntry>,

    #[serde(skip)]
    pub(crate) confusables: Vec<ConfusableMapping>,

    #[serde(skip)]
    pub(crate) allowed_ranges: Option<Vec<CodepointRange>>,
}

impl Dataset {
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn builtin() -> Result<Self, DatasetError> {
        Self::from_json_str(BUILTIN_DATASET)
    }

    pub fn from_json_str(content: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Replaces skeletons with the mappings of a UTS #39 `confusables.txt`.
    /// Returns the number of mappings read.
    pub fn overlay_confusables(&mut self, text: &str) -> Result<usize, DatasetError> {
        let mappings = ucd::parse_confusables(text)?;
        let count = mappings.len();
        self.confusables.extend(mappings);
        Ok(count)
    }

    pub fn overlay_confusables_file(&mut self, path: impl AsRef<Path>) -> Result<usize, DatasetError> {
        let text = read_text(path.as_ref())?;
        self.overlay_confusables(&text)
    }

    /// Applies a UTS #39 `IdentifierStatus.txt`: listed ranges become
    /// `Allowed`, every other non-disallowed codepoint becomes `Restricted`.
    pub fn overlay_identifier_status(&mut self, text: &str) -> Result<usize, DatasetError> {
        let ranges = ucd::parse_identifier_status(text)?;
        let count = ranges.len();
        self.allowed_ranges
            .get_or_insert_with(Vec::new)
            .extend(ranges);
        Ok(count)
    }

    pub fn overlay_identifier_status_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<usize, DatasetError> {
        let text = read_text(path.as_ref())?;
        self.overlay_identifier_status(&text)
    }

    pub fn to_json(&self) -> Result<String, DatasetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn read_text(path: &Path) -> Result<String, DatasetError> {
    std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
