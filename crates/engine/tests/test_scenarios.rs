//! End-to-end detection scenarios through the analysis engine.

use anyhow::Result;
use glyphscan_engine::{
    properties::DatasetEntry, AnalysisEngine, AnalysisResult, Dataset, DatasetError, Document,
    EngineConfig, PropertyStore, Severity, Span, ThreatType,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn analyze(text: &str) -> Result<AnalysisResult> {
    let store = Arc::new(PropertyStore::builtin()?);
    let engine = AnalysisEngine::new(store, EngineConfig::default());
    Ok(engine.analyze(&Document::new("scenario", text)?))
}

#[test]
fn test_cyrillic_a_in_paypal() -> Result<()> {
    let result = analyze("p\u{430}ypal")?;

    let confusables: Vec<_> = result.records_of(ThreatType::Confusable).collect();
    assert_eq!(confusables.len(), 1);
    assert_eq!(confusables[0].span, Span::new(1, 2));
    assert_eq!(confusables[0].severity, Severity::High);
    assert_eq!(confusables[0].involved_codepoints, vec![0x430]);

    // The homograph finding on the same codepoint is merged away.
    assert_eq!(result.records_of(ThreatType::Homograph).count(), 0);
    Ok(())
}

#[test]
fn test_unterminated_right_to_left_override() -> Result<()> {
    let result = analyze("user\u{202E}gnp.exe")?;

    let bidi: Vec<_> = result.records_of(ThreatType::BidiOverride).collect();
    assert_eq!(bidi.len(), 1);
    assert_eq!(bidi[0].severity, Severity::High);
    assert!(bidi[0].description.contains("unterminated override"));
    assert_eq!(bidi[0].span, Span::new(4, 12));
    Ok(())
}

#[test]
fn test_mixed_script_admin() -> Result<()> {
    let result = analyze("\u{430}dmin")?;

    let mixed: Vec<_> = result.records_of(ThreatType::MixedScript).collect();
    assert_eq!(mixed.len(), 1);
    assert_eq!(mixed[0].span, Span::new(0, 5));
    assert!(mixed[0].severity >= Severity::Medium);
    Ok(())
}

#[test]
fn test_greek_word_is_clean() -> Result<()> {
    let result = analyze("\u{3B1}\u{3BB}\u{3C6}\u{3B1}")?;
    assert!(result.is_empty());
    Ok(())
}

#[test]
fn test_skeleton_pointing_at_unassigned_codepoint_fails_to_load() {
    let dataset = Dataset::new(vec![
        DatasetEntry::new("0061", "Latin", "Ll", "L").with_status("Allowed"),
        DatasetEntry::new("0430", "Cyrillic", "Ll", "L")
            .with_status("Allowed")
            .with_skeleton("0062"),
    ]);

    let err = PropertyStore::from_dataset(dataset).unwrap_err();
    assert!(matches!(
        err,
        DatasetError::SkeletonReferencesUnassigned {
            source_codepoint: 0x430,
            target: 0x62
        }
    ));
}

#[test]
fn test_plain_ascii_has_no_findings() -> Result<()> {
    let text = "The quick brown fox jumps over the lazy dog.\n\
                fn main() { println!(\"hello, world\"); }\n\
                user_name = admin42; // 100% ASCII";
    let result = analyze(text)?;
    assert!(result.is_empty(), "unexpected findings: {:?}", result.records());
    Ok(())
}

#[test]
fn test_trojan_source_comment() -> Result<()> {
    // Early return hidden inside a comment by RLO and LRI.
    let text = "/*\u{202E} } \u{2066}if (isAdmin)\u{2069} \u{2066} begin admins only */";
    let result = analyze(text)?;

    let bidi: Vec<_> = result.records_of(ThreatType::BidiOverride).collect();
    assert!(bidi.iter().any(|r| r.description.contains("unterminated override")));
    assert!(bidi.iter().any(|r| r.description.contains("unterminated isolate")));

    let unterminated: Vec<_> = bidi
        .iter()
        .filter(|r| r.description.contains("unterminated"))
        .collect();
    assert_eq!(unterminated.len(), 2);
    assert!(unterminated.iter().all(|r| r.severity == Severity::High));
    assert!(unterminated.iter().all(|r| r.span.end == text.chars().count()));
    Ok(())
}

#[test]
fn test_zero_width_joiner_inside_identifier() -> Result<()> {
    let result = analyze("pay\u{200D}pal.com")?;

    let spoof: Vec<_> = result.records_of(ThreatType::IdentifierSpoof).collect();
    assert_eq!(spoof.len(), 1);
    assert_eq!(spoof[0].severity, Severity::High);
    assert_eq!(spoof[0].involved_codepoints, vec![0x200D]);
    assert_eq!(
        result.threat_class(),
        Some(glyphscan_engine::core::ThreatClass::InvisibleCharacters)
    );
    Ok(())
}

#[test]
fn test_min_severity_drops_low_findings() -> Result<()> {
    let store = Arc::new(PropertyStore::builtin()?);
    let config = EngineConfig {
        min_severity: Some(Severity::Medium),
        ..EngineConfig::default()
    };
    let engine = AnalysisEngine::new(store, config);

    // Fullwidth letters are restricted but single-script.
    let result = engine.analyze(&Document::new("doc", "\u{FF41}\u{FF42}\u{FF43}")?);
    assert!(result.is_empty());
    assert!(result.merge_stats().filtered_count >= 1);
    Ok(())
}

#[test]
fn test_long_substituted_run_scales_linearly() -> Result<()> {
    let store = Arc::new(PropertyStore::builtin()?);
    let engine = AnalysisEngine::new(store, EngineConfig::default());

    let timed = |repeats: usize| -> Result<(Duration, AnalysisResult)> {
        let document = Document::new("long", &"aa\u{430}".repeat(repeats))?;
        let started = Instant::now();
        let result = engine.analyze(&document);
        Ok((started.elapsed(), result))
    };

    timed(1_000)?;
    let (small, _) = timed(10_000)?;
    let (large, result) = timed(40_000)?;

    // One confusable per substitution, the homographs merged into them.
    assert_eq!(result.records_of(ThreatType::Confusable).count(), 40_000);
    assert_eq!(result.records_of(ThreatType::Homograph).count(), 0);

    // Four times the input; a quadratic merge would take about sixteen times as long.
    assert!(
        large < small * 10 + Duration::from_millis(500),
        "10k repeats took {:?}, 40k took {:?}",
        small,
        large
    );
    Ok(())
}
