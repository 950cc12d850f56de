//! Identifier-like runs: mixed scripts and UTS #39 identifier status.

use crate::confusables::{dominant_script, homoglyph_source};
use crate::core::{DetectionContext, Detector, Span, ThreatRecord, ThreatType};
use crate::impl_detector;
use crate::properties::{CodepointRecord, GeneralCategory, IdentifierStatus};
use std::sync::Arc;
use unicode_script::Script;

const AUGMENTED_SCRIPT_SETS: [&[Script]; 3] = [
    &[Script::Han, Script::Hiragana, Script::Katakana],
    &[Script::Han, Script::Bopomofo],
    &[Script::Han, Script::Hangul],
];

fn is_identifier_char(record: &CodepointRecord) -> bool {
    record.category.is_letter()
        || record.category.is_mark()
        || record.category.is_number()
        || record.category == GeneralCategory::ConnectorPunctuation
}

/// Maximal identifier-like runs. Format characters are absorbed only when
/// they sit between two identifier characters.
pub fn identifier_runs(context: &DetectionContext) -> Arc<Vec<Span>> {
    context.get_or_compute("identifier_runs", || {
        let len = context.text().len();
        let mut runs = Vec::new();
        let mut offset = 0;

        while offset < len {
            if !is_identifier_char(&context.record_at(offset)) {
                offset += 1;
                continue;
            }

            let start = offset;
            let mut end = offset + 1;
            loop {
                let mut next = end;
                while next < len && context.record_at(next).category == GeneralCategory::Format {
                    next += 1;
                }
                if next < len && is_identifier_char(&context.record_at(next)) {
                    end = next + 1;
                } else {
                    break;
                }
            }

            runs.push(Span::new(start, end));
            offset = end;
        }

        runs
    })
}

pub struct IdentifierDetector;

impl IdentifierDetector {
    pub fn new() -> Self {
        Self
    }

    /// Distinct non-neutral scripts of the run's letters, in first-seen order.
    fn letter_scripts(records: &[CodepointRecord]) -> Vec<Script> {
        let mut scripts = Vec::new();
        for record in records {
            if record.is_letter() && !record.is_script_neutral() && !scripts.contains(&record.script) {
                scripts.push(record.script);
            }
        }
        scripts
    }

    fn is_mixed(scripts: &[Script], allow_cjk_combinations: bool) -> bool {
        if scripts.len() <= 1 {
            return false;
        }
        if allow_cjk_combinations {
            let covered = AUGMENTED_SCRIPT_SETS
                .iter()
                .any(|set| scripts.iter().all(|script| set.contains(script)));
            return !covered;
        }
        true
    }

    fn mixed_script(
        &self,
        context: &DetectionContext,
        span: Span,
        records: &[CodepointRecord],
        scripts: &[Script],
    ) -> ThreatRecord {
        let bands = &context.config().severity;
        let severity = if records
            .iter()
            .any(|r| r.is_letter() && homoglyph_source(r).is_some())
        {
            bands.mixed_script_confusable
        } else {
            bands.mixed_script
        };

        let dominant = dominant_script(records.iter().copied());
        let involved: Vec<u32> = records
            .iter()
            .filter(|r| r.is_letter() && !r.is_script_neutral() && Some(r.script) != dominant)
            .map(|r| r.codepoint)
            .collect();

        let names: Vec<&str> = scripts.iter().map(|s| s.full_name()).collect();

        ThreatRecord::new(context.source_id(), ThreatType::MixedScript, severity, span)
            .with_codepoints(involved)
            .with_description(format!("identifier mixes scripts: {}", names.join(", ")))
            .with_detector(self.id())
    }

    fn identifier_status(
        &self,
        context: &DetectionContext,
        span: Span,
        records: &[CodepointRecord],
        mixed: bool,
    ) -> Option<ThreatRecord> {
        let bands = &context.config().severity;
        let with_status = |status: IdentifierStatus| -> Vec<u32> {
            records
                .iter()
                .filter(|r| r.identifier_status == status)
                .map(|r| r.codepoint)
                .collect()
        };

        let disallowed = with_status(IdentifierStatus::Disallowed);
        let (severity, involved, label) = if !disallowed.is_empty() {
            (bands.identifier_disallowed, disallowed, "disallowed")
        } else {
            let restricted = with_status(IdentifierStatus::Restricted);
            if restricted.is_empty() {
                return None;
            }
            let severity = if mixed {
                bands.identifier_restricted_mixed
            } else {
                bands.identifier_restricted
            };
            (severity, restricted, "restricted")
        };

        let listed: Vec<String> = involved.iter().map(|cp| format!("U+{:04X}", cp)).collect();

        Some(
            ThreatRecord::new(context.source_id(), ThreatType::IdentifierSpoof, severity, span)
                .with_description(format!(
                    "identifier contains {} characters: {}",
                    label,
                    listed.join(" ")
                ))
                .with_codepoints(involved)
                .with_detector(self.id()),
        )
    }

    fn detect_impl(&self, context: &DetectionContext) -> Vec<ThreatRecord> {
        let allow_cjk = context.config().identifier.allow_cjk_combinations;
        let mut records = Vec::new();

        for span in identifier_runs(context).iter() {
            let run: Vec<CodepointRecord> = (span.start..span.end)
                .map(|offset| context.record_at(offset))
                .collect();

            let scripts = Self::letter_scripts(&run);
            let mixed = Self::is_mixed(&scripts, allow_cjk);
            if mixed {
                records.push(self.mixed_script(context, *span, &run, &scripts));
            }
            if let Some(record) = self.identifier_status(context, *span, &run, mixed) {
                records.push(record);
            }
        }

        records.sort_by(ThreatRecord::report_order);
        records
    }
}

impl Default for IdentifierDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl_detector!(
    IdentifierDetector,
    id: "identifier",
    name: "Identifier Spoofing",
    threat_types: &[ThreatType::IdentifierSpoof, ThreatType::MixedScript]
);
