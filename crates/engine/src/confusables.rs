//! Confusable and homograph detection.
//!
//! Text is split into whitespace-delimited runs and each run gets a dominant
//! script: the most frequent script among its letters, ignoring Common and
//! Inherited, ties going to the script seen first. Punctuation and digits
//! never vote.
//!
//! Two detectors read those runs:
//!
//! - [`ConfusableDetector`] flags a non-ASCII codepoint from another script
//!   whose skeleton is made only of letters of the dominant script. This is
//!   the precise check, driven by the skeleton table.
//! - [`HomographDetector`] flags any codepoint from the static homoglyph
//!   source list (Cyrillic, Greek, Latin extensions, fullwidth forms,
//!   mathematical alphanumerics) sitting in a run of plain Latin text. It
//!   catches lookalikes the skeleton table does not list.
//!
//! Both findings usually land on the same codepoint; the aggregator keeps
//! the stronger one.

use crate::core::{DetectionContext, Detector, Span, ThreatRecord, ThreatType};
use crate::impl_detector;
use crate::properties::{CodepointRecord, PropertyStore};
use std::fmt;
use std::sync::Arc;
use unicode_script::Script;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomoglyphSource {
    Cyrillic,
    Greek,
    LatinExtended,
    Fullwidth,
    MathematicalAlphanumeric,
}

impl fmt::Display for HomoglyphSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cyrillic => write!(f, "Cyrillic"),
            Self::Greek => write!(f, "Greek"),
            Self::LatinExtended => write!(f, "Latin extended"),
            Self::Fullwidth => write!(f, "fullwidth"),
            Self::MathematicalAlphanumeric => write!(f, "mathematical alphanumeric"),
        }
    }
}

pub fn homoglyph_source(record: &CodepointRecord) -> Option<HomoglyphSource> {
    match record.codepoint {
        0xFF01..=0xFF5E => return Some(HomoglyphSource::Fullwidth),
        0x1D400..=0x1D7FF => return Some(HomoglyphSource::MathematicalAlphanumeric),
        0x2100..=0x214F if record.is_letter() => return Some(HomoglyphSource::LatinExtended),
        0x0131 | 0x0237 | 0x0250..=0x02AF | 0x1D00..=0x1DBF
            if record.script == Script::Latin =>
        {
            return Some(HomoglyphSource::LatinExtended)
        }
        _ => {}
    }

    match record.script {
        Script::Cyrillic => Some(HomoglyphSource::Cyrillic),
        Script::Greek => Some(HomoglyphSource::Greek),
        _ => None,
    }
}

/// A whitespace-delimited run and the script that dominates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRun {
    pub span: Span,
    pub dominant: Option<Script>,
    pub has_ascii_letter: bool,
}

fn is_run_separator(record: &CodepointRecord) -> bool {
    record.category.is_separator() || record.bidi_class.is_whitespace()
}

/// Majority script among `records`' letters; ties go to the first seen.
pub fn dominant_script<'s>(records: impl IntoIterator<Item = CodepointRecord<'s>>) -> Option<Script> {
    let mut tally: Vec<(Script, usize)> = Vec::new();
    for record in records {
        if !record.is_letter() || record.is_script_neutral() {
            continue;
        }
        match tally.iter_mut().find(|(script, _)| *script == record.script) {
            Some((_, count)) => *count += 1,
            None => tally.push((record.script, 1)),
        }
    }

    let mut best: Option<(Script, usize)> = None;
    for (script, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((script, count));
        }
    }
    best.map(|(script, _)| script)
}

pub fn word_runs(context: &DetectionContext) -> Arc<Vec<WordRun>> {
    context.get_or_compute("word_runs", || {
        let text = context.text();
        let mut runs = Vec::new();
        let mut start = None;

        for offset in 0..=text.len() {
            let separator = offset == text.len() || is_run_separator(&context.record_at(offset));
            match (start, separator) {
                (None, false) => start = Some(offset),
                (Some(run_start), true) => {
                    let records = (run_start..offset).map(|i| context.record_at(i));
                    runs.push(WordRun {
                        span: Span::new(run_start, offset),
                        dominant: dominant_script(records),
                        has_ascii_letter: text[run_start..offset]
                            .iter()
                            .any(|c| c.is_ascii_alphabetic()),
                    });
                    start = None;
                }
                _ => {}
            }
        }

        runs
    })
}

fn render(codepoints: &[u32]) -> String {
    codepoints.iter().copied().filter_map(char::from_u32).collect()
}

pub struct ConfusableDetector;

impl ConfusableDetector {
    pub fn new() -> Self {
        Self
    }

    /// Skeleton of `text` rendered back into a string.
    pub fn skeleton_string(store: &PropertyStore, text: &[char]) -> String {
        render(&store.skeleton_of(text))
    }

    /// The skeleton must be non-empty and consist solely of letters of the
    /// dominant script.
    fn imitates(store: &PropertyStore, skeleton: &[u32], dominant: Script) -> bool {
        !skeleton.is_empty()
            && skeleton.iter().all(|&target| {
                let target = store.lookup(target);
                target.is_letter() && target.script == dominant
            })
    }

    fn detect_impl(&self, context: &DetectionContext) -> Vec<ThreatRecord> {
        let bands = &context.config().severity;
        let text = context.text();
        let mut records = Vec::new();

        for run in word_runs(context).iter() {
            let Some(dominant) = run.dominant else {
                continue;
            };

            for offset in run.span.start..run.span.end {
                if text[offset].is_ascii() {
                    continue;
                }
                let record = context.record_at(offset);
                if record.script == dominant {
                    continue;
                }
                let Some(skeleton) = record.skeleton else {
                    continue;
                };
                if !Self::imitates(context.store(), skeleton, dominant) {
                    continue;
                }

                let severity = if dominant == Script::Latin {
                    bands.confusable_latin
                } else {
                    bands.confusable_other
                };

                records.push(
                    ThreatRecord::new(
                        context.source_id(),
                        ThreatType::Confusable,
                        severity,
                        Span::single(offset),
                    )
                    .with_codepoint(record.codepoint)
                    .with_description(format!(
                        "{} character '{}' imitates {} '{}'",
                        record.script.full_name(),
                        text[offset],
                        dominant.full_name(),
                        render(skeleton)
                    ))
                    .with_detector(self.id()),
                );
            }
        }

        records.sort_by(ThreatRecord::report_order);
        records
    }
}

impl Default for ConfusableDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl_detector!(
    ConfusableDetector,
    id: "confusable",
    name: "Confusable Substitution",
    threat_types: &[ThreatType::Confusable],
    description: "Codepoints from another script whose skeleton spells a letter of the surrounding text"
);

pub struct HomographDetector;

impl HomographDetector {
    pub fn new() -> Self {
        Self
    }

    fn detect_impl(&self, context: &DetectionContext) -> Vec<ThreatRecord> {
        let severity = context.config().severity.homograph;
        let mut records = Vec::new();

        for run in word_runs(context).iter() {
            if run.dominant != Some(Script::Latin) || !run.has_ascii_letter {
                continue;
            }

            for offset in run.span.start..run.span.end {
                let record = context.record_at(offset);
                let Some(source) = homoglyph_source(&record) else {
                    continue;
                };

                records.push(
                    ThreatRecord::new(
                        context.source_id(),
                        ThreatType::Homograph,
                        severity,
                        Span::single(offset),
                    )
                    .with_codepoint(record.codepoint)
                    .with_description(format!(
                        "{} lookalike '{}' in Latin text",
                        source,
                        context.text()[offset]
                    ))
                    .with_detector(self.id()),
                );
            }
        }

        records
    }
}

impl Default for HomographDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl_detector!(
    HomographDetector,
    id: "homograph",
    name: "Homoglyph Source",
    threat_types: &[ThreatType::Homograph],
    description: "Codepoints from homoglyph source blocks inside plain Latin text"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, Severity};
    use crate::document::Document;

    fn detect<D: Detector>(detector: &D, text: &str) -> Vec<ThreatRecord> {
        let store = PropertyStore::builtin().unwrap();
        let config = EngineConfig::default();
        let document = Document::new("test", text).unwrap();
        let context = DetectionContext::new(&document, &store, &config);
        detector.detect(&context)
    }

    #[test]
    fn test_cyrillic_a_in_latin_word() {
        let records = detect(&ConfusableDetector::new(), "p\u{430}ypal");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].span, Span::single(1));
        assert_eq!(records[0].severity, Severity::High);
        assert_eq!(records[0].involved_codepoints, vec![0x430]);
        assert!(records[0].description.contains("Cyrillic"));
    }

    #[test]
    fn test_dominant_script_over_whole_run() {
        let records = detect(&ConfusableDetector::new(), "\u{430}dmin");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].span.start, 0);
    }

    #[test]
    fn test_skeleton_must_match_dominant_script() {
        // Greek omicron inside a Cyrillic word: dominant script is Cyrillic.
        let records = detect(&ConfusableDetector::new(), "п\u{3BF}чта");
        assert!(records.is_empty());

        let records = detect(&ConfusableDetector::new(), "\u{3B1}\u{3B2}\u{1D41A}");
        assert!(records.is_empty());
    }

    #[test]
    fn test_fullwidth_digit_one_reads_as_l() {
        let records = detect(&ConfusableDetector::new(), "pay\u{FF11}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].involved_codepoints, vec![0xFF11]);
    }

    #[test]
    fn test_single_script_words_are_clean() {
        assert!(detect(&ConfusableDetector::new(), "\u{3B1}\u{3BB}\u{3C6}\u{3B1}").is_empty());
        assert!(detect(&ConfusableDetector::new(), "café naïve").is_empty());
        assert!(detect(&HomographDetector::new(), "café naïve").is_empty());
    }

    #[test]
    fn test_homograph_needs_plain_latin_context() {
        let records = detect(&HomographDetector::new(), "p\u{430}ypal \u{43F}\u{440}\u{438}\u{432}\u{435}\u{442}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].span, Span::single(1));
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn test_homograph_catches_unlisted_lookalikes() {
        // U+0250 has no skeleton in the bundled table.
        let records = detect(&HomographDetector::new(), "b\u{250}nk");
        assert_eq!(records.len(), 1);
        assert!(records[0].description.starts_with("Latin extended"));
        assert!(detect(&ConfusableDetector::new(), "b\u{250}nk").is_empty());
    }

    #[test]
    fn test_runs_split_on_whitespace() {
        let store = PropertyStore::builtin().unwrap();
        let config = EngineConfig::default();
        let document = Document::new("test", "ab  \u{3B1}\u{3B2}\tcd").unwrap();
        let context = DetectionContext::new(&document, &store, &config);

        let runs = word_runs(&context);
        let spans: Vec<Span> = runs.iter().map(|r| r.span).collect();
        assert_eq!(spans, vec![Span::new(0, 2), Span::new(4, 6), Span::new(7, 9)]);
        assert_eq!(runs[1].dominant, Some(Script::Greek));
        assert_eq!(context.cached_entries(), 1);
    }

    #[test]
    fn test_dominant_tie_goes_to_first_seen() {
        let store = PropertyStore::builtin().unwrap();
        let records = "\u{3B1}a".chars().map(|c| store.lookup_char(c));
        assert_eq!(dominant_script(records), Some(Script::Greek));

        let records = "1-2".chars().map(|c| store.lookup_char(c));
        assert_eq!(dominant_script(records), None);
    }

    #[test]
    fn test_skeleton_string() {
        let store = PropertyStore::builtin().unwrap();
        let text: Vec<char> = "\u{440}\u{430}y\u{440}\u{430}\u{4CF}".chars().collect();
        assert_eq!(ConfusableDetector::skeleton_string(&store, &text), "paypal");
    }
}
