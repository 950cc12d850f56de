//! Bidirectional control detection (Trojan Source and friends).
//!
//! Explicit formatting characters are matched the way UAX #9 matches them:
//! a PDF closes the innermost embedding or override unless an isolate is
//! open above it, a PDI closes the innermost isolate together with anything
//! opened inside it, and unmatched terminators are ignored.

use crate::core::{DetectionContext, Detector, Severity, Span, ThreatRecord, ThreatType};
use crate::impl_detector;
use crate::properties::BidiClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Embedding,
    Override,
    Isolate,
}

impl ScopeKind {
    fn of(class: BidiClass) -> Option<Self> {
        match class {
            BidiClass::LRE | BidiClass::RLE => Some(Self::Embedding),
            BidiClass::LRO | BidiClass::RLO => Some(Self::Override),
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI => Some(Self::Isolate),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Override => "override",
            Self::Isolate => "isolate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    LeftToRight,
    RightToLeft,
    FirstStrong,
}

fn control_name(class: BidiClass) -> &'static str {
    match class {
        BidiClass::LRE => "left-to-right embedding",
        BidiClass::RLE => "right-to-left embedding",
        BidiClass::LRO => "left-to-right override",
        BidiClass::RLO => "right-to-left override",
        BidiClass::LRI => "left-to-right isolate",
        BidiClass::RLI => "right-to-left isolate",
        BidiClass::FSI => "first strong isolate",
        BidiClass::PDF => "pop directional formatting",
        BidiClass::PDI => "pop directional isolate",
        _ => "bidi control",
    }
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    start: usize,
    codepoint: u32,
    class: BidiClass,
    kind: ScopeKind,
}

impl Scope {
    fn direction(&self) -> Direction {
        match self.class {
            BidiClass::RLE | BidiClass::RLO | BidiClass::RLI => Direction::RightToLeft,
            BidiClass::FSI => Direction::FirstStrong,
            _ => Direction::LeftToRight,
        }
    }
}

/// Open scopes, innermost last. Tracks the open isolates and the number of
/// open overrides so every terminator is resolved in constant amortized time.
#[derive(Debug, Default)]
struct ScopeStack {
    scopes: Vec<Scope>,
    isolates: Vec<usize>,
    open_overrides: usize,
}

impl ScopeStack {
    fn push(&mut self, scope: Scope) {
        match scope.kind {
            ScopeKind::Isolate => self.isolates.push(self.scopes.len()),
            ScopeKind::Override => self.open_overrides += 1,
            ScopeKind::Embedding => {}
        }
        self.scopes.push(scope);
    }

    fn forget(&mut self, scope: &Scope) {
        if scope.kind == ScopeKind::Override {
            self.open_overrides -= 1;
        }
    }

    /// PDF: closes the innermost scope unless it is an isolate.
    fn pop_embedding(&mut self) -> Option<Scope> {
        if self.scopes.last()?.kind == ScopeKind::Isolate {
            return None;
        }
        let scope = self.scopes.pop()?;
        self.forget(&scope);
        Some(scope)
    }

    /// PDI: closes the innermost isolate and returns it with the scopes
    /// opened inside it, outermost first.
    fn pop_isolate(&mut self) -> Option<(Scope, Vec<Scope>)> {
        let position = self.isolates.pop()?;
        let inner = self.scopes.split_off(position + 1);
        for scope in &inner {
            self.forget(scope);
        }
        let isolate = self.scopes.pop()?;
        Some((isolate, inner))
    }
}

/// Prefix counts of strong left-to-right and right-to-left characters, so
/// the content of any scope can be classified in constant time.
struct StrongCounts {
    ltr: Vec<usize>,
    rtl: Vec<usize>,
}

impl StrongCounts {
    fn new(context: &DetectionContext) -> Self {
        let len = context.text().len();
        let mut ltr = Vec::with_capacity(len + 1);
        let mut rtl = Vec::with_capacity(len + 1);
        let (mut l, mut r) = (0, 0);
        ltr.push(0);
        rtl.push(0);

        for offset in 0..len {
            let record = context.record_at(offset);
            if record.is_assigned() {
                match record.bidi_class {
                    BidiClass::L => l += 1,
                    class if class.is_rtl() => r += 1,
                    _ => {}
                }
            }
            ltr.push(l);
            rtl.push(r);
        }

        Self { ltr, rtl }
    }

    fn has_ltr(&self, start: usize, end: usize) -> bool {
        self.ltr[end] > self.ltr[start]
    }

    fn has_rtl(&self, start: usize, end: usize) -> bool {
        self.rtl[end] > self.rtl[start]
    }
}

struct Candidate {
    record: ThreatRecord,
    /// Matched embedding or isolate that leaves strong text in order.
    benign: bool,
}

pub struct BidiDetector;

impl BidiDetector {
    pub fn new() -> Self {
        Self
    }

    fn reorders(scope: &Scope, counts: &StrongCounts, content_end: usize) -> bool {
        let content_start = scope.start + 1;
        match scope.direction() {
            Direction::LeftToRight => counts.has_rtl(content_start, content_end),
            Direction::RightToLeft => counts.has_ltr(content_start, content_end),
            Direction::FirstStrong => {
                counts.has_ltr(content_start, content_end) && counts.has_rtl(content_start, content_end)
            }
        }
    }

    fn unterminated(
        &self,
        context: &DetectionContext,
        scope: &Scope,
        end: usize,
        closed_by: Option<u32>,
    ) -> ThreatRecord {
        let mut description = format!(
            "unterminated {}: {} U+{:04X} is never closed",
            scope.kind.as_str(),
            control_name(scope.class),
            scope.codepoint
        );
        if let Some(terminator) = closed_by {
            description.push_str(&format!(" before the enclosing isolate ends at U+{:04X}", terminator));
        }

        ThreatRecord::new(
            context.source_id(),
            ThreatType::BidiOverride,
            context.config().severity.bidi_unterminated,
            Span::new(scope.start, end),
        )
        .with_codepoint(scope.codepoint)
        .with_description(description)
        .with_detector(self.id())
    }

    fn matched(
        &self,
        context: &DetectionContext,
        scope: &Scope,
        terminator_offset: usize,
        terminator: BidiClass,
        counts: &StrongCounts,
    ) -> Candidate {
        let bands = &context.config().severity;
        let reorders = Self::reorders(scope, counts, terminator_offset);
        let severity: Severity = if reorders {
            bands.bidi_reordering
        } else {
            bands.bidi_plain
        };

        let mut description = format!(
            "{} closed by {}",
            control_name(scope.class),
            control_name(terminator)
        );
        if reorders {
            description.push_str(" reorders the displayed text");
        }

        let record = ThreatRecord::new(
            context.source_id(),
            ThreatType::BidiOverride,
            severity,
            Span::new(scope.start, terminator_offset + 1),
        )
        .with_codepoints(vec![
            scope.codepoint,
            context.text()[terminator_offset] as u32,
        ])
        .with_description(description)
        .with_detector(self.id());

        Candidate {
            record,
            benign: scope.kind != ScopeKind::Override && !reorders,
        }
    }

    fn detect_impl(&self, context: &DetectionContext) -> Vec<ThreatRecord> {
        let text = context.text();
        let counts = StrongCounts::new(context);
        let mut stack = ScopeStack::default();
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut rtl_context = false;

        for (offset, &c) in text.iter().enumerate() {
            let record = context.record_at(offset);
            let class = record.bidi_class;

            if class.is_rtl() && stack.open_overrides == 0 {
                rtl_context = true;
            }

            if let Some(kind) = ScopeKind::of(class) {
                stack.push(Scope {
                    start: offset,
                    codepoint: c as u32,
                    class,
                    kind,
                });
                continue;
            }

            match class {
                BidiClass::PDF => {
                    if let Some(scope) = stack.pop_embedding() {
                        candidates.push(self.matched(context, &scope, offset, class, &counts));
                    }
                }
                BidiClass::PDI => {
                    let Some((isolate, inner)) = stack.pop_isolate() else {
                        continue;
                    };
                    for scope in inner.iter().rev() {
                        candidates.push(Candidate {
                            record: self.unterminated(context, scope, offset + 1, Some(c as u32)),
                            benign: false,
                        });
                    }
                    candidates.push(self.matched(context, &isolate, offset, class, &counts));
                }
                _ => {}
            }
        }

        for scope in &stack.scopes {
            candidates.push(Candidate {
                record: self.unterminated(context, scope, text.len(), None),
                benign: false,
            });
        }

        let report_benign = context.config().bidi.report_benign_isolates || !rtl_context;
        let mut records: Vec<ThreatRecord> = candidates
            .into_iter()
            .filter(|candidate| report_benign || !candidate.benign)
            .map(|candidate| candidate.record)
            .collect();

        records.sort_by(ThreatRecord::report_order);
        records
    }
}

impl Default for BidiDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl_detector!(
    BidiDetector,
    id: "bidi",
    name: "Bidi Control Characters",
    threat_types: &[ThreatType::BidiOverride],
    description: "Unterminated or reordering bidirectional embeddings, overrides and isolates"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::document::Document;
    use crate::properties::PropertyStore;

    fn detect_with(config: &EngineConfig, text: &str) -> Vec<ThreatRecord> {
        let store = PropertyStore::builtin().unwrap();
        let document = Document::new("test", text).unwrap();
        let context = DetectionContext::new(&document, &store, config);
        BidiDetector::new().detect(&context)
    }

    fn detect(text: &str) -> Vec<ThreatRecord> {
        detect_with(&EngineConfig::default(), text)
    }

    #[test]
    fn test_unterminated_override() {
        let records = detect("access\u{202E}level");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::High);
        assert_eq!(records[0].span, Span::new(6, 12));
        assert!(records[0].description.contains("unterminated override"));
        assert_eq!(records[0].involved_codepoints, vec![0x202E]);
    }

    #[test]
    fn test_matched_override_reordering_latin() {
        // Trojan Source: RLO ... PDF around Latin text.
        let records = detect("if (a\u{202E}b c\u{202C})");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::High);
        assert_eq!(records[0].span, Span::new(5, 10));
        assert_eq!(records[0].involved_codepoints, vec![0x202E, 0x202C]);
    }

    #[test]
    fn test_matched_override_without_strong_content_is_medium() {
        let records = detect("x\u{202E}123\u{202C}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn test_isolate_in_rtl_document_is_benign() {
        // Hebrew text with a Latin word isolated left-to-right.
        let text = "\u{5E9}\u{5DC}\u{5D5}\u{5DD} \u{2066}abc\u{2069}";
        assert!(detect(text).is_empty());

        let config = EngineConfig {
            bidi: crate::core::BidiConfig {
                report_benign_isolates: true,
            },
            ..EngineConfig::default()
        };
        let records = detect_with(&config, text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Medium);
    }

    #[test]
    fn test_overrides_always_reported_in_rtl_document() {
        let text = "\u{5D0}\u{5D1} \u{202D}12\u{202C}";
        let records = detect(text);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_override_closed_by_pdi_no_longer_masks_rtl() {
        // The RLO ends with its isolate, so the Hebrew letter after it marks
        // the text as RTL and both plain isolates are dropped as benign.
        let text = "\u{2066}\u{202E}x\u{2069} \u{5D0} \u{2066}b\u{2069}";
        let records = detect(text);
        assert_eq!(records.len(), 1);
        assert!(records[0].description.contains("unterminated override"));
        assert_eq!(records[0].span, Span::new(1, 4));
    }

    #[test]
    fn test_scope_stack_bookkeeping() {
        let scope = |start, class| Scope {
            start,
            codepoint: 0,
            class,
            kind: ScopeKind::of(class).unwrap(),
        };
        let mut stack = ScopeStack::default();
        stack.push(scope(0, BidiClass::RLI));
        stack.push(scope(1, BidiClass::RLO));
        stack.push(scope(2, BidiClass::LRI));
        stack.push(scope(3, BidiClass::LRO));
        assert_eq!(stack.open_overrides, 2);

        let (isolate, inner) = stack.pop_isolate().unwrap();
        assert_eq!(isolate.start, 2);
        assert_eq!(inner.len(), 1);
        assert_eq!(stack.open_overrides, 1);

        assert_eq!(stack.pop_embedding().map(|s| s.start), Some(1));
        assert_eq!(stack.open_overrides, 0);
        assert!(stack.pop_embedding().is_none());
        assert_eq!(stack.pop_isolate().map(|(s, _)| s.start), Some(0));
        assert!(stack.pop_isolate().is_none());
    }

    #[test]
    fn test_deep_nesting_reports_every_scope() {
        let depth = 40_000;
        let mut text = "\u{202A}".repeat(depth);
        text.push_str(&"\u{5D0}".repeat(depth));

        let records = detect(&text);
        assert_eq!(records.len(), depth);
        assert!(records.iter().all(|r| r.span.end == depth * 2));
        assert_eq!(records[0].span.start, 0);
    }

    #[test]
    fn test_pdi_closes_inner_embedding() {
        let records = detect("a\u{2067}b\u{202B}c\u{2069}d");
        assert_eq!(records.len(), 2);

        let unterminated = records
            .iter()
            .find(|r| r.description.contains("unterminated embedding"))
            .unwrap();
        assert_eq!(unterminated.span, Span::new(3, 6));

        let isolate = records.iter().find(|r| r.span.start == 1).unwrap();
        assert_eq!(isolate.involved_codepoints, vec![0x2067, 0x2069]);
        assert_eq!(isolate.severity, Severity::High);
    }

    #[test]
    fn test_pdf_does_not_close_through_isolate() {
        let records = detect("\u{2066}x\u{202C}y");
        assert_eq!(records.len(), 1);
        assert!(records[0].description.contains("unterminated isolate"));
        assert_eq!(records[0].span, Span::new(0, 4));
    }

    #[test]
    fn test_unmatched_terminators_are_ignored() {
        assert!(detect("plain\u{202C} text\u{2069}").is_empty());
        assert!(detect("plain ascii text").is_empty());
    }

    #[test]
    fn test_first_strong_isolate_needs_both_directions() {
        let records = detect("\u{2068}abc\u{2069}");
        assert_eq!(records[0].severity, Severity::Medium);

        let records = detect("\u{2068}a\u{5D0}\u{2069}");
        assert_eq!(records[0].severity, Severity::High);
    }
}
