//! Command implementations for the glyphscan CLI
//!
//! `scan` walks files and directories and reports every document found in
//! them, `check` analyses one string from the command line, and `dataset`
//! validates the property data and looks up single codepoints.

pub mod check;
pub mod dataset;
pub mod scan;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use glyphscan_engine::{Dataset, EngineConfig, PropertyStore, ReportFormat, Severity};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the Unicode property data comes from.
#[derive(Args, Clone, Debug, Default)]
pub struct StoreArgs {
    /// JSON dataset to use instead of the bundled one
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// UTS #39 confusables.txt overlaid on the dataset
    #[arg(long)]
    pub confusables: Option<PathBuf>,

    /// UTS #39 IdentifierStatus.txt overlaid on the dataset
    #[arg(long)]
    pub identifier_status: Option<PathBuf>,
}

impl StoreArgs {
    pub fn load_dataset(&self) -> Result<Dataset> {
        let mut dataset = match &self.dataset {
            Some(path) => Dataset::from_json_file(path)
                .with_context(|| format!("failed to load dataset {}", path.display()))?,
            None => Dataset::builtin().context("bundled dataset is invalid")?,
        };

        if let Some(path) = &self.confusables {
            let count = dataset
                .overlay_confusables_file(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            info!(path = %path.display(), mappings = count, "loaded confusables");
        }

        if let Some(path) = &self.identifier_status {
            let count = dataset
                .overlay_identifier_status_file(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            info!(path = %path.display(), ranges = count, "loaded identifier status");
        }

        Ok(dataset)
    }

    pub fn load_store(&self) -> Result<PropertyStore> {
        let dataset = self.load_dataset()?;
        PropertyStore::from_dataset(dataset).context("property dataset failed validation")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::default()),
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Console,
    Json,
    Table,
    Text,
    Markdown,
}

impl OutputFormat {
    /// The engine format behind this output, `None` for the console view.
    pub fn report_format(&self) -> Option<ReportFormat> {
        match self {
            OutputFormat::Console => None,
            OutputFormat::Json => Some(ReportFormat::Json),
            OutputFormat::Table => Some(ReportFormat::Table),
            OutputFormat::Text => Some(ReportFormat::Text),
            OutputFormat::Markdown => Some(ReportFormat::Markdown),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl From<SeverityLevel> for Severity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Low => Severity::Low,
            SeverityLevel::Medium => Severity::Medium,
            SeverityLevel::High => Severity::High,
        }
    }
}
