//! Detector execution and orchestration
//!
//! The analysis engine runs every enabled detector over a document, in
//! parallel or sequentially, and hands their lists to the aggregator. The
//! registry holds the detectors by id so callers can add their own or narrow
//! the set through configuration without touching the execution path.

pub mod engine;
pub mod registry;

pub use engine::{AnalysisEngine, DetectorInfo};
pub use registry::{DetectorRegistry, DetectorRegistryBuilder};
