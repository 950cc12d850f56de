//! Detector trait for pluggable threat detection.
//!
//! Each detector inspects one document through a [`DetectionContext`] and
//! returns its own list of [`ThreatRecord`]s. Detectors share nothing
//! mutable: the document and the property store are read-only, and values
//! more than one detector needs (word runs, per-run script profiles) go
//! through the context's cache, so the engine may run them in parallel.
//!
//! Detection is total. Unknown or unassigned codepoints degrade to "no
//! finding", so `detect` has no error path.

use crate::core::{DetectionContext, ThreatRecord, ThreatType};

pub trait Detector: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    /// Threat types this detector can emit.
    fn threat_types(&self) -> &'static [ThreatType];

    fn detect(&self, context: &DetectionContext) -> Vec<ThreatRecord>;

    fn enabled_by_default(&self) -> bool {
        true
    }
}

#[macro_export]
macro_rules! impl_detector {
    (
        $detector:ty,
        id: $id:expr,
        name: $name:expr,
        threat_types: $types:expr
        $(, description: $description:expr)?
    ) => {
        impl $crate::core::Detector for $detector {
            fn id(&self) -> &'static str {
                $id
            }

            fn name(&self) -> &'static str {
                $name
            }

            fn threat_types(&self) -> &'static [$crate::core::ThreatType] {
                $types
            }

            $(
                fn description(&self) -> &'static str {
                    $description
                }
            )?

            fn detect(&self, context: &$crate::core::DetectionContext) -> Vec<$crate::core::ThreatRecord> {
                self.detect_impl(context)
            }
        }
    };
}
