use crate::core::Severity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Severity assigned to each kind of finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityBands {
    /// Confusable substitute inside Latin text.
    pub confusable_latin: Severity,
    /// Confusable substitute inside any other script.
    pub confusable_other: Severity,
    pub homograph: Severity,
    pub mixed_script: Severity,
    /// Mixed-script run containing a homoglyph source letter.
    pub mixed_script_confusable: Severity,
    pub identifier_disallowed: Severity,
    pub identifier_restricted: Severity,
    pub identifier_restricted_mixed: Severity,
    pub bidi_unterminated: Severity,
    pub bidi_reordering: Severity,
    pub bidi_plain: Severity,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            confusable_latin: Severity::High,
            confusable_other: Severity::Medium,
            homograph: Severity::Medium,
            mixed_script: Severity::Medium,
            mixed_script_confusable: Severity::High,
            identifier_disallowed: Severity::High,
            identifier_restricted: Severity::Low,
            identifier_restricted_mixed: Severity::Medium,
            bidi_unterminated: Severity::High,
            bidi_reordering: Severity::High,
            bidi_plain: Severity::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BidiConfig {
    /// Report non-reordering embeddings and isolates even in documents that
    /// already contain right-to-left text.
    pub report_benign_isolates: bool,
}

impl Default for BidiConfig {
    fn default() -> Self {
        Self {
            report_benign_isolates: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentifierConfig {
    /// Treat Han+Hiragana+Katakana, Han+Bopomofo and Han+Hangul as a single
    /// script, as UTS #39 does for its augmented script sets.
    pub allow_cjk_combinations: bool,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            allow_cjk_combinations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub parallel_execution: bool,

    /// Detector ids to run; empty runs every detector enabled by default.
    pub enabled_detectors: Vec<String>,

    /// Findings below this severity are dropped after aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,

    /// Capacity of the per-document derived-data cache.
    pub max_cache_size: usize,

    pub severity: SeverityBands,

    pub bidi: BidiConfig,

    pub identifier: IdentifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_execution: true,
            enabled_detectors: Vec::new(),
            min_severity: None,
            max_cache_size: 16,
            severity: SeverityBands::default(),
            bidi: BidiConfig::default(),
            identifier: IdentifierConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).context("invalid engine configuration")?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&content)
    }

    pub fn is_detector_enabled(&self, id: &str, enabled_by_default: bool) -> bool {
        if self.enabled_detectors.is_empty() {
            enabled_by_default
        } else {
            self.enabled_detectors.iter().any(|enabled| enabled == id)
        }
    }

    pub fn meets_threshold(&self, severity: Severity) -> bool {
        self.min_severity.map_or(true, |min| severity >= min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_takes_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"min_severity": "medium", "severity": {"homograph": "high"}}"#,
        )
        .unwrap();

        assert_eq!(config.min_severity, Some(Severity::Medium));
        assert_eq!(config.severity.homograph, Severity::High);
        assert_eq!(config.severity.confusable_latin, Severity::High);
        assert!(config.parallel_execution);
        assert!(config.identifier.allow_cjk_combinations);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EngineConfig::from_json_str(r#"{"parallel": false}"#).is_err());
    }

    #[test]
    fn test_detector_selection() {
        let mut config = EngineConfig::default();
        assert!(config.is_detector_enabled("bidi", true));
        config.enabled_detectors = vec!["bidi".to_string()];
        assert!(config.is_detector_enabled("bidi", false));
        assert!(!config.is_detector_enabled("confusable", true));
    }

    #[test]
    fn test_threshold() {
        let config = EngineConfig {
            min_severity: Some(Severity::Medium),
            ..EngineConfig::default()
        };
        assert!(config.meets_threshold(Severity::High));
        assert!(!config.meets_threshold(Severity::Low));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let config = EngineConfig {
            parallel_execution: false,
            ..EngineConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(EngineConfig::from_json_file(&path).unwrap(), config);
    }
}
