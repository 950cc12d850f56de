//! Core abstractions shared by every detector
//!
//! The [`Detector`] trait is the seam each threat detector implements; a
//! [`DetectionContext`] hands it the document, the property store and the
//! configuration. Detectors emit [`ThreatRecord`]s, the [`Aggregator`] merges
//! them into an [`AnalysisResult`], and the [`ReportGenerator`] renders that
//! result as JSON, a tab-separated table, plain text or Markdown.

pub mod aggregator;
pub mod analysis_result;
pub mod config;
pub mod context;
pub mod detector;
pub mod report_generator;
pub mod result;
pub mod severity;

pub use aggregator::{merge, Aggregator, MergeStats};
pub use analysis_result::{AnalysisResult, SeverityCount, ThreatClass, ThreatSummary};
pub use config::{BidiConfig, EngineConfig, IdentifierConfig, SeverityBands};
pub use context::{DerivedCache, DetectionContext};
pub use detector::Detector;
pub use report_generator::{BatchSummary, ReportFormat, ReportGenerator, ReportRow, SourceCount};
pub use result::{Span, ThreatRecord, ThreatType};
pub use severity::Severity;
