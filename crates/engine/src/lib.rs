//! Glyphscan - Unicode Threat Detection
//!
//! This crate inspects text for Unicode tricks that make it read differently
//! from what it contains: confusable and homoglyph substitutions, bidirectional
//! control abuse (Trojan Source), and spoofed or mixed-script identifiers.
//! Detectors share an immutable property store and run in parallel; their
//! findings are merged into one deterministic, ordered report.

pub mod bidi;
pub mod confusables;
pub mod core;
pub mod document;
pub mod error;
pub mod identifier;
pub mod parsers;
pub mod properties;
pub mod runner;

pub use crate::core::{
    AnalysisResult, Detector, EngineConfig, ReportFormat, ReportGenerator, Severity, Span,
    ThreatRecord, ThreatType,
};
pub use bidi::BidiDetector;
pub use confusables::{ConfusableDetector, HomographDetector, HomoglyphSource};
pub use document::{Document, Origin, RawDocument};
pub use error::{DatasetError, InvalidDocumentError, ParseError, ReportError};
pub use identifier::IdentifierDetector;
pub use parsers::{parser_for_path, DocumentParser, JsonEntriesParser, PlainTextParser};
pub use properties::{CodepointRecord, Dataset, PropertyStore};
pub use runner::{AnalysisEngine, DetectorRegistry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
