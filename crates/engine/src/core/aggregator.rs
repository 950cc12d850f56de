//! Threat aggregation
//!
//! Merges the per-detector lists into one ordered report. Homograph and
//! Confusable records whose spans overlap describe the same visual
//! substitution and collapse to the stronger one; the bidi and identifier
//! classes are orthogonal and are never merged with them. Exact duplicates
//! from any detector collapse regardless of class.

use crate::core::{AnalysisResult, Severity, Span, ThreatRecord, ThreatType};
use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub original_count: usize,
    pub merged_count: usize,
    pub removed_count: usize,
    pub filtered_count: usize,
}

impl MergeStats {
    pub fn reduction_percentage(&self) -> f64 {
        if self.original_count == 0 {
            0.0
        } else {
            (self.removed_count as f64 / self.original_count as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    min_severity: Option<Severity>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_severity(mut self, min_severity: Option<Severity>) -> Self {
        self.min_severity = min_severity;
        self
    }

    pub fn aggregate<I>(&self, document: &Document, lists: I) -> AnalysisResult
    where
        I: IntoIterator<Item = Vec<ThreatRecord>>,
    {
        let (mut records, mut stats) = merge(lists.into_iter().flatten().collect());

        if let Some(min) = self.min_severity {
            let before = records.len();
            records.retain(|r| r.severity >= min);
            stats.filtered_count = before - records.len();
        }

        AnalysisResult::new(document, records, stats)
    }
}

/// Lower sorts first: the record kept when two visual records overlap.
fn visual_priority(a: &ThreatRecord, b: &ThreatRecord) -> Ordering {
    let detector_rank = |t: ThreatType| match t {
        ThreatType::Confusable => 0,
        _ => 1,
    };
    b.severity
        .cmp(&a.severity)
        .then(detector_rank(a.threat_type).cmp(&detector_rank(b.threat_type)))
        .then_with(|| a.report_order(b))
}

/// Spans of the visual records kept so far. They never overlap one another,
/// so ordered by `(start, end)` their ends ascend too, and the last span
/// starting before a candidate's end is the only one that needs checking.
#[derive(Debug, Default)]
struct KeptSpans {
    spans: BTreeSet<Span>,
}

impl KeptSpans {
    fn overlaps(&self, span: Span) -> bool {
        self.spans
            .range(..Span::new(span.end, 0))
            .next_back()
            .map_or(false, |kept| kept.overlaps(&span))
    }

    fn insert_if_free(&mut self, span: Span) -> bool {
        if self.overlaps(span) {
            return false;
        }
        self.spans.insert(span);
        true
    }
}

pub fn merge(mut records: Vec<ThreatRecord>) -> (Vec<ThreatRecord>, MergeStats) {
    let original_count = records.len();

    records.sort_by(ThreatRecord::report_order);
    records.dedup_by(|later, earlier| later.dedup_key() == earlier.dedup_key());

    let (mut visual, mut merged): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| r.threat_type.is_visual());

    visual.sort_by(visual_priority);
    let mut kept_spans = KeptSpans::default();
    for candidate in visual {
        if kept_spans.insert_if_free(candidate.span) {
            merged.push(candidate);
        }
    }

    merged.sort_by(ThreatRecord::report_order);

    let merged_count = merged.len();
    let stats = MergeStats {
        original_count,
        merged_count,
        removed_count: original_count - merged_count,
        filtered_count: 0,
    };

    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(threat_type: ThreatType, severity: Severity, span: Span) -> ThreatRecord {
        ThreatRecord::new("doc", threat_type, severity, span).with_codepoint(0x430)
    }

    #[test]
    fn test_overlapping_visual_records_merge_to_higher_severity() {
        let (merged, stats) = merge(vec![
            record(ThreatType::Homograph, Severity::Medium, Span::single(1)),
            record(ThreatType::Confusable, Severity::High, Span::single(1)),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].threat_type, ThreatType::Confusable);
        assert_eq!(merged[0].severity, Severity::High);
        assert_eq!(stats.removed_count, 1);
    }

    #[test]
    fn test_severity_wins_over_detector_order() {
        let (merged, _) = merge(vec![
            record(ThreatType::Homograph, Severity::High, Span::single(0)),
            record(ThreatType::Confusable, Severity::Medium, Span::single(0)),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].threat_type, ThreatType::Homograph);
    }

    #[test]
    fn test_equal_severity_prefers_confusable() {
        let (merged, _) = merge(vec![
            record(ThreatType::Homograph, Severity::Medium, Span::single(2)),
            record(ThreatType::Confusable, Severity::Medium, Span::single(2)),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].threat_type, ThreatType::Confusable);
    }

    #[test]
    fn test_other_classes_never_merge_with_visual() {
        let (merged, _) = merge(vec![
            record(ThreatType::Confusable, Severity::High, Span::single(0)),
            record(ThreatType::MixedScript, Severity::High, Span::new(0, 5)),
            record(ThreatType::BidiOverride, Severity::High, Span::new(0, 5)),
        ]);

        assert_eq!(merged.len(), 3);
        let types: Vec<_> = merged.iter().map(|r| r.threat_type).collect();
        assert_eq!(
            types,
            vec![
                ThreatType::Confusable,
                ThreatType::BidiOverride,
                ThreatType::MixedScript
            ]
        );
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let (merged, stats) = merge(vec![
            record(ThreatType::MixedScript, Severity::Medium, Span::new(0, 5)),
            record(ThreatType::MixedScript, Severity::Medium, Span::new(0, 5)),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(stats.original_count, 2);
        assert_eq!(stats.reduction_percentage(), 50.0);
    }

    #[test]
    fn test_non_overlapping_visual_records_survive() {
        let (merged, _) = merge(vec![
            record(ThreatType::Confusable, Severity::High, Span::single(3)),
            record(ThreatType::Homograph, Severity::Medium, Span::single(1)),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].span.start, 1);
    }

    #[test]
    fn test_chained_overlaps_keep_priority_order() {
        // The High record in the middle wins; both Medium neighbours touch it.
        let (merged, _) = merge(vec![
            record(ThreatType::Homograph, Severity::Medium, Span::new(0, 3)),
            record(ThreatType::Confusable, Severity::High, Span::new(2, 5)),
            record(ThreatType::Confusable, Severity::Medium, Span::new(4, 7)),
            record(ThreatType::Homograph, Severity::Medium, Span::new(7, 8)),
        ]);

        let spans: Vec<_> = merged.iter().map(|r| (r.span.start, r.span.end)).collect();
        assert_eq!(spans, vec![(2, 5), (7, 8)]);
    }

    #[test]
    fn test_kept_spans_checks_wide_neighbour() {
        let mut kept = KeptSpans::default();
        assert!(kept.insert_if_free(Span::new(0, 10)));
        assert!(kept.insert_if_free(Span::new(10, 11)));
        assert!(!kept.insert_if_free(Span::new(9, 12)));
        assert!(!kept.insert_if_free(Span::single(5)));
        assert!(kept.insert_if_free(Span::new(11, 12)));
    }

    #[test]
    fn test_many_visual_records_merge_one_per_codepoint() {
        let count = 50_000;
        let mut records = Vec::with_capacity(count * 2);
        for offset in 0..count {
            records.push(record(ThreatType::Homograph, Severity::Medium, Span::single(offset * 3)));
            records.push(record(ThreatType::Confusable, Severity::High, Span::single(offset * 3)));
        }

        let (merged, stats) = merge(records);
        assert_eq!(merged.len(), count);
        assert!(merged.iter().all(|r| r.threat_type == ThreatType::Confusable));
        assert_eq!(stats.removed_count, count);
    }

    #[test]
    fn test_min_severity_filter() {
        let document = Document::new("doc", "abc").unwrap();
        let result = Aggregator::new()
            .with_min_severity(Some(Severity::Medium))
            .aggregate(
                &document,
                vec![vec![
                    record(ThreatType::IdentifierSpoof, Severity::Low, Span::new(0, 3)),
                    record(ThreatType::Confusable, Severity::High, Span::single(1)),
                ]],
            );

        assert_eq!(result.records().len(), 1);
        assert_eq!(result.merge_stats().filtered_count, 1);
    }
}
