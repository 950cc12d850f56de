use crate::bidi::BidiDetector;
use crate::confusables::{ConfusableDetector, HomographDetector};
use crate::core::{Detector, EngineConfig};
use crate::identifier::IdentifierDetector;
use std::collections::HashMap;
use std::sync::Arc;

pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
        }
    }

    /// Every built-in detector.
    pub fn with_defaults() -> Self {
        DetectorRegistryBuilder::new().with_defaults().build()
    }

    pub fn register<D: Detector + 'static>(&mut self, detector: D) {
        let id = detector.id().to_string();
        self.detectors.insert(id, Arc::new(detector));
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.get(id).cloned()
    }

    /// All detectors, ordered by id.
    pub fn all(&self) -> Vec<Arc<dyn Detector>> {
        let mut detectors: Vec<_> = self.detectors.values().cloned().collect();
        detectors.sort_by_key(|d| d.id());
        detectors
    }

    /// Detectors the configuration turns on, ordered by id.
    pub fn enabled(&self, config: &EngineConfig) -> Vec<Arc<dyn Detector>> {
        self.all()
            .into_iter()
            .filter(|d| config.is_detector_enabled(d.id(), d.enabled_by_default()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DetectorRegistryBuilder {
    registry: DetectorRegistry,
}

impl DetectorRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: DetectorRegistry::new(),
        }
    }

    pub fn with_detector<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.registry.register(detector);
        self
    }

    pub fn with_defaults(self) -> Self {
        self.with_detector(ConfusableDetector::new())
            .with_detector(HomographDetector::new())
            .with_detector(BidiDetector::new())
            .with_detector(IdentifierDetector::new())
    }

    pub fn build(self) -> DetectorRegistry {
        self.registry
    }
}

impl Default for DetectorRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = DetectorRegistry::with_defaults();
        let ids: Vec<_> = registry.all().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["bidi", "confusable", "homograph", "identifier"]);
        assert!(registry.get("bidi").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_enabled_respects_config() {
        let registry = DetectorRegistry::with_defaults();
        let config = EngineConfig {
            enabled_detectors: vec!["bidi".to_string(), "confusable".to_string()],
            ..EngineConfig::default()
        };
        let ids: Vec<_> = registry.enabled(&config).iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["bidi", "confusable"]);
        assert_eq!(registry.enabled(&EngineConfig::default()).len(), 4);
    }
}
