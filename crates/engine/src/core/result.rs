use crate::core::Severity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Threat taxonomy. Declaration order is the tie-break order of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Homograph,
    Confusable,
    BidiOverride,
    IdentifierSpoof,
    MixedScript,
}

impl ThreatType {
    pub const ALL: [ThreatType; 5] = [
        Self::Homograph,
        Self::Confusable,
        Self::BidiOverride,
        Self::IdentifierSpoof,
        Self::MixedScript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homograph => "homograph",
            Self::Confusable => "confusable",
            Self::BidiOverride => "bidi_override",
            Self::IdentifierSpoof => "identifier_spoof",
            Self::MixedScript => "mixed_script",
        }
    }

    /// Homograph and Confusable describe the same visual-similarity attack.
    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Homograph | Self::Confusable)
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Homograph => write!(f, "Homograph"),
            Self::Confusable => write!(f, "Confusable"),
            Self::BidiOverride => write!(f, "BidiOverride"),
            Self::IdentifierSpoof => write!(f, "IdentifierSpoof"),
            Self::MixedScript => write!(f, "MixedScript"),
        }
    }
}

impl FromStr for ThreatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown threat type '{}'", s))
    }
}

/// Half-open range of codepoint offsets into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub source_id: String,

    pub span: Span,

    pub threat_type: ThreatType,

    pub severity: Severity,

    pub involved_codepoints: Vec<u32>,

    pub description: String,

    pub detector_id: String,
}

impl ThreatRecord {
    pub fn new(source_id: &str, threat_type: ThreatType, severity: Severity, span: Span) -> Self {
        Self {
            source_id: source_id.to_string(),
            span,
            threat_type,
            severity,
            involved_codepoints: Vec::new(),
            description: String::new(),
            detector_id: String::new(),
        }
    }

    pub fn with_codepoint(mut self, codepoint: u32) -> Self {
        self.involved_codepoints.push(codepoint);
        self
    }

    pub fn with_codepoints(mut self, codepoints: Vec<u32>) -> Self {
        self.involved_codepoints = codepoints;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_detector(mut self, detector_id: &str) -> Self {
        self.detector_id = detector_id.to_string();
        self
    }

    /// First involved codepoint, falling back to nothing for records built
    /// without one.
    pub fn primary_codepoint(&self) -> Option<u32> {
        self.involved_codepoints.first().copied()
    }

    /// Report order: span start, taxonomy, span end, then the remaining
    /// fields so that the order is total.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.span
            .start
            .cmp(&other.span.start)
            .then(self.threat_type.cmp(&other.threat_type))
            .then(self.span.end.cmp(&other.span.end))
            .then_with(|| self.involved_codepoints.cmp(&other.involved_codepoints))
            .then(other.severity.cmp(&self.severity))
            .then_with(|| self.description.cmp(&other.description))
            .then_with(|| self.detector_id.cmp(&other.detector_id))
    }

    /// Identity used to collapse exact duplicates.
    pub fn dedup_key(&self) -> (ThreatType, Span, &[u32]) {
        (self.threat_type, self.span, &self.involved_codepoints)
    }
}
