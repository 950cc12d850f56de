use crate::core::{Aggregator, AnalysisResult, DetectionContext, Detector, EngineConfig, ThreatRecord, ThreatType};
use crate::document::{Document, RawDocument};
use crate::error::InvalidDocumentError;
use crate::properties::PropertyStore;
use crate::runner::DetectorRegistry;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AnalysisEngine {
    store: Arc<PropertyStore>,
    registry: DetectorRegistry,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(store: Arc<PropertyStore>, config: EngineConfig) -> Self {
        Self {
            store,
            registry: DetectorRegistry::with_defaults(),
            config,
        }
    }

    pub fn with_registry(mut self, registry: DetectorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &Arc<PropertyStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, document: &Document) -> AnalysisResult {
        let context = DetectionContext::new(document, &self.store, &self.config);
        let detectors = self.registry.enabled(&self.config);

        let run = |detector: &Arc<dyn Detector>| -> Vec<ThreatRecord> {
            let records = detector.detect(&context);
            debug!(
                detector = detector.id(),
                source = document.source_id(),
                count = records.len(),
                "detector finished"
            );
            records
        };

        let lists: Vec<Vec<ThreatRecord>> = if self.config.parallel_execution {
            detectors.par_iter().map(run).collect()
        } else {
            detectors.iter().map(run).collect()
        };

        Aggregator::new()
            .with_min_severity(self.config.min_severity)
            .aggregate(document, lists)
    }

    pub fn analyze_raw(&self, raw: RawDocument) -> Result<AnalysisResult, InvalidDocumentError> {
        let document = Document::try_from_raw(raw)?;
        Ok(self.analyze(&document))
    }

    /// One result per input, in input order. An invalid document yields its
    /// error without affecting the others.
    pub fn analyze_batch(
        &self,
        documents: Vec<RawDocument>,
    ) -> Vec<Result<AnalysisResult, InvalidDocumentError>> {
        let analyze_one = |raw: RawDocument| {
            self.analyze_raw(raw).map_err(|e| {
                warn!(error = %e, "skipping invalid document");
                e
            })
        };

        if self.config.parallel_execution {
            documents.into_par_iter().map(analyze_one).collect()
        } else {
            documents.into_iter().map(analyze_one).collect()
        }
    }

    pub fn list_detectors(&self) -> Vec<DetectorInfo> {
        self.registry
            .all()
            .iter()
            .map(|d| DetectorInfo {
                id: d.id().to_string(),
                name: d.name().to_string(),
                description: d.description().to_string(),
                threat_types: d.threat_types().to_vec(),
                enabled: self.config.is_detector_enabled(d.id(), d.enabled_by_default()),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DetectorInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub threat_types: Vec<ThreatType>,
    pub enabled: bool,
}
