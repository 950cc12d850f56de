use crate::core::{MergeStats, Severity, ThreatRecord, ThreatType};
use crate::document::{Document, LineIndex, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Zero-width and invisible formatting characters.
const INVISIBLE_CODEPOINTS: [u32; 8] = [
    0x200B, 0x200C, 0x200D, 0x2060, 0xFEFF, 0x180E, 0xFE0E, 0xFE0F,
];

fn is_invisible(codepoint: u32) -> bool {
    INVISIBLE_CODEPOINTS.contains(&codepoint)
}

fn is_tag(codepoint: u32) -> bool {
    (0xE0000..=0xE007F).contains(&codepoint)
}

/// Coarse classification of a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatClass {
    Bidi,
    Combined,
    Confusables,
    InvisibleCharacters,
    TagCharacters,
}

impl ThreatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bidi => "bidi",
            Self::Combined => "combined",
            Self::Confusables => "confusables",
            Self::InvisibleCharacters => "invisible_characters",
            Self::TagCharacters => "tag_characters",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCount {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    pub fn merge(&mut self, other: &SeverityCount) {
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatSummary {
    pub total: usize,
    pub by_type: BTreeMap<ThreatType, usize>,
    pub by_severity: SeverityCount,
}

impl ThreatSummary {
    pub fn from_records(records: &[ThreatRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total += 1;
            *summary.by_type.entry(record.threat_type).or_insert(0) += 1;
            summary.by_severity.add(record.severity);
        }
        summary
    }

    pub fn merge(&mut self, other: &ThreatSummary) {
        self.total += other.total;
        for (threat_type, count) in &other.by_type {
            *self.by_type.entry(*threat_type).or_insert(0) += count;
        }
        self.by_severity.merge(&other.by_severity);
    }
}

/// Ordered findings for one document. Carries the document's provenance
/// and line layout so that reports can be rendered without the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    source_id: String,
    origin: Origin,
    length: usize,
    line_index: LineIndex,
    records: Vec<ThreatRecord>,
    merge_stats: MergeStats,
}

impl AnalysisResult {
    pub fn new(document: &Document, records: Vec<ThreatRecord>, merge_stats: MergeStats) -> Self {
        Self {
            source_id: document.source_id().to_string(),
            origin: document.origin().clone(),
            length: document.len(),
            line_index: LineIndex::new(document.text()),
            records,
            merge_stats,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn document_len(&self) -> usize {
        self.length
    }

    pub fn records(&self) -> &[ThreatRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn merge_stats(&self) -> &MergeStats {
        &self.merge_stats
    }

    pub fn records_of(&self, threat_type: ThreatType) -> impl Iterator<Item = &ThreatRecord> {
        self.records
            .iter()
            .filter(move |r| r.threat_type == threat_type)
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.records.iter().map(|r| r.severity).max()
    }

    pub fn summary(&self) -> ThreatSummary {
        ThreatSummary::from_records(&self.records)
    }

    /// 1-based line and column of a codepoint offset, shifted by the
    /// origin's starting position.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let (line, column) = self.line_index.position(offset);
        if line == 0 {
            (self.origin.line, self.origin.column + column)
        } else {
            (self.origin.line + line, column + 1)
        }
    }

    pub fn location(&self, offset: usize) -> String {
        let (line, column) = self.line_column(offset);
        match &self.origin.file {
            Some(file) => format!("{}: line {}, column {}", file, line, column),
            None => format!("line {}, column {}", line, column),
        }
    }

    pub fn threat_class(&self) -> Option<ThreatClass> {
        if self.records_of(ThreatType::BidiOverride).next().is_some() {
            return Some(ThreatClass::Bidi);
        }

        let visual = self.records.iter().any(|r| r.threat_type.is_visual());
        let involved = || self.records.iter().flat_map(|r| r.involved_codepoints.iter().copied());
        let invisible = involved().any(is_invisible);
        let tags = involved().any(is_tag);

        match (visual, invisible || tags) {
            (true, true) => Some(ThreatClass::Combined),
            (true, false) => Some(ThreatClass::Confusables),
            (false, true) if invisible => Some(ThreatClass::InvisibleCharacters),
            (false, true) => Some(ThreatClass::TagCharacters),
            (false, false) => None,
        }
    }
}
