//! Determinism, ordering and report stability across runs.

use anyhow::Result;
use glyphscan_engine::{
    core::ReportRow, AnalysisEngine, Document, EngineConfig, InvalidDocumentError, Origin,
    PropertyStore, RawDocument, ReportFormat, ReportGenerator, ThreatRecord,
};
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};

const CORPUS: &str = "p\u{430}ypal \u{430}dmin \u{202E}gnp.exe\n\
                      \u{5E9}\u{5DC}\u{5D5}\u{5DD} \u{2067}abc\u{2069} pay\u{200B}pal\n\
                      \u{FF10}\u{FF11} b\u{250}nk \u{1D41A}pple \u{6F22}\u{304B}";

fn engine() -> &'static AnalysisEngine {
    static ENGINE: OnceLock<AnalysisEngine> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let store = PropertyStore::builtin().expect("bundled dataset loads");
        AnalysisEngine::new(Arc::new(store), EngineConfig::default())
    })
}

fn assert_ordered(records: &[ThreatRecord]) {
    for pair in records.windows(2) {
        assert!(
            pair[0].report_order(&pair[1]).is_le(),
            "out of order: {:?} before {:?}",
            pair[0],
            pair[1]
        );
        let key = |r: &ThreatRecord| (r.span.start, r.threat_type, r.span.end);
        assert!(key(&pair[0]) <= key(&pair[1]));
    }
}

#[test]
fn test_same_document_same_result() -> Result<()> {
    let document = Document::new("corpus", CORPUS)?;

    let first = engine().analyze(&document);
    let second = engine().analyze(&document);
    assert_eq!(first, second);
    assert!(!first.is_empty());

    let json_a = ReportGenerator::generate(&first, ReportFormat::Json)?;
    let json_b = ReportGenerator::generate(&second, ReportFormat::Json)?;
    assert_eq!(json_a, json_b);
    Ok(())
}

#[test]
fn test_corpus_is_ordered() -> Result<()> {
    let result = engine().analyze(&Document::new("corpus", CORPUS)?);
    assert_ordered(result.records());
    Ok(())
}

#[test]
fn test_table_round_trip_matches_json_fields() -> Result<()> {
    let origin = Origin::default().with_file("corpus.txt").with_position(3, 1);
    let document = Document::with_origin("corpus", CORPUS, origin)?;
    let result = engine().analyze(&document);

    let table = ReportGenerator::generate(&result, ReportFormat::Table)?;
    let parsed: Vec<ReportRow> = ReportGenerator::parse_table(&table)?;
    assert_eq!(parsed, ReportGenerator::rows(&result));
    assert_eq!(parsed.len(), result.records().len());

    let json: serde_json::Value = serde_json::from_str(&ReportGenerator::records_json(&result)?)?;
    let records = json.as_array().map(Vec::len).unwrap_or_default();
    assert_eq!(records, parsed.len());
    assert!(parsed.iter().all(|row| row.location.starts_with("corpus.txt: line ")));
    Ok(())
}

#[test]
fn test_batch_preserves_order_and_isolates_errors() -> Result<()> {
    let batch = vec![
        RawDocument::from_text("one", "p\u{430}ypal", Origin::default()),
        RawDocument::new("two", vec![0x61, 0x110000], Origin::default()),
        RawDocument::from_text("three", "plain", Origin::default()),
    ];

    let results = engine().analyze_batch(batch);
    assert_eq!(results.len(), 3);

    let first = results[0].as_ref().map_err(Clone::clone)?;
    assert_eq!(first.source_id(), "one");
    assert!(!first.is_empty());

    match &results[1] {
        Err(InvalidDocumentError::CodepointOutOfRange { source_id, offset, value }) => {
            assert_eq!(source_id, "two");
            assert_eq!(*offset, 1);
            assert_eq!(*value, 0x110000);
        }
        other => panic!("expected out-of-range error, got {:?}", other),
    }

    let third = results[2].as_ref().map_err(Clone::clone)?;
    assert!(third.is_empty());
    Ok(())
}

fn interesting_char() -> impl Strategy<Value = char> {
    prop_oneof![
        proptest::char::range('a', 'z'),
        Just(' '),
        Just('\n'),
        Just('_'),
        proptest::sample::select(vec![
            '\u{430}', '\u{435}', '\u{3B1}', '\u{3BF}', '\u{5D0}', '\u{627}', '\u{202A}',
            '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}', '\u{2066}', '\u{2067}', '\u{2068}',
            '\u{2069}', '\u{200B}', '\u{200D}', '\u{FF11}', '\u{FF41}', '\u{1D41A}', '\u{250}',
            '\u{6F22}', '\u{304B}', '\u{E0041}', '\u{10FFFF}',
        ]),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_analysis_is_deterministic(chars in proptest::collection::vec(interesting_char(), 0..48)) {
        let text: String = chars.into_iter().collect();
        let document = Document::new("prop", &text).unwrap();

        let first = engine().analyze(&document);
        let second = engine().analyze(&document);
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn prop_records_are_ordered_and_in_bounds(chars in proptest::collection::vec(interesting_char(), 0..48)) {
        let text: String = chars.into_iter().collect();
        let document = Document::new("prop", &text).unwrap();
        let result = engine().analyze(&document);

        assert_ordered(result.records());
        for record in result.records() {
            prop_assert!(record.span.start < record.span.end);
            prop_assert!(record.span.end <= document.len());
            prop_assert!(!record.involved_codepoints.is_empty());
        }
    }

    #[test]
    fn prop_visual_records_never_overlap(chars in proptest::collection::vec(interesting_char(), 0..48)) {
        let text: String = chars.into_iter().collect();
        let result = engine().analyze(&Document::new("prop", &text).unwrap());

        let visual: Vec<_> = result.records().iter().filter(|r| r.threat_type.is_visual()).collect();
        for (i, a) in visual.iter().enumerate() {
            for b in &visual[i + 1..] {
                prop_assert!(!a.span.overlaps(&b.span));
            }
        }
    }
}
