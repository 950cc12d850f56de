//! File and directory scanning.
//!
//! Inputs are turned into documents by the parser matching their extension,
//! the whole set is analysed as one batch, and the results are rendered in
//! the requested format. Unreadable files, unparsable files and invalid
//! documents are reported on stderr and skipped; they never abort the scan.

use super::{load_config, OutputFormat, SeverityLevel, StoreArgs};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::*;
use glyphscan_engine::{
    core::report_generator::display_char, parser_for_path, AnalysisEngine, AnalysisResult,
    DocumentParser, PlainTextParser, RawDocument, ReportFormat, ReportGenerator, Severity,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Exit status when `--fail-on` is given and a finding reaches it.
const FINDINGS_EXIT_CODE: u8 = 2;

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// File or directory to scan
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Engine configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityLevel>,

    /// Run detectors one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Exit with status 2 when a finding at or above this severity exists
    #[arg(long, value_enum)]
    pub fail_on: Option<SeverityLevel>,
}

/// Everything that was skipped on the way to the batch.
#[derive(Debug, Default)]
pub(super) struct Skipped {
    files: usize,
    documents: usize,
}

/// Where a parsed document came from: its file and its position in it.
#[derive(Debug, Clone)]
struct DocumentInput {
    path: PathBuf,
    entry: usize,
}

impl fmt::Display for DocumentInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entry {}", self.path.display(), self.entry)
    }
}

impl ScanArgs {
    pub fn execute(&self, verbose: bool) -> Result<ExitCode> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(level) = self.min_severity {
            config.min_severity = Some(level.into());
        }
        if self.sequential {
            config.parallel_execution = false;
        }

        let store = Arc::new(self.store.load_store()?);
        let engine = AnalysisEngine::new(store, config);

        let files = collect_input_files(&self.input)?;
        info!(files = files.len(), input = %self.input.display(), "collected input files");

        let mut skipped = Skipped::default();
        let mut documents = Vec::new();
        let mut inputs: Vec<DocumentInput> = Vec::new();
        for (path, parser) in &files {
            match read_documents(path, parser.as_ref()) {
                Ok(parsed) => {
                    debug!(path = %path.display(), documents = parsed.len(), "parsed file");
                    inputs.extend((0..parsed.len()).map(|entry| DocumentInput {
                        path: path.clone(),
                        entry,
                    }));
                    documents.extend(parsed);
                }
                Err(e) => {
                    warn!(path = %path.display(), "skipping file");
                    eprintln!("{} {:#}", "skipped:".yellow().bold(), e);
                    skipped.files += 1;
                }
            }
        }

        let mut results = Vec::with_capacity(documents.len());
        for (outcome, input) in engine.analyze_batch(documents).into_iter().zip(&inputs) {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    eprintln!("{} {}: {}", "invalid document:".yellow().bold(), input, e);
                    skipped.documents += 1;
                }
            }
        }

        let rendered = match self.format.report_format() {
            None => render_console(&results, &skipped, verbose),
            Some(format) => render_report(&results, format)?,
        };

        match &self.output {
            Some(path) => {
                fs::write(path, rendered)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                info!(path = %path.display(), "report written");
            }
            None => print!("{}", rendered),
        }

        Ok(exit_code(&results, self.fail_on.map(Severity::from)))
    }
}

pub(super) fn exit_code(results: &[AnalysisResult], fail_on: Option<Severity>) -> ExitCode {
    let Some(threshold) = fail_on else {
        return ExitCode::SUCCESS;
    };
    let failing = results
        .iter()
        .filter_map(AnalysisResult::max_severity)
        .any(|severity| severity >= threshold);
    if failing {
        ExitCode::from(FINDINGS_EXIT_CODE)
    } else {
        ExitCode::SUCCESS
    }
}

fn collect_input_files(input: &Path) -> Result<Vec<(PathBuf, Box<dyn DocumentParser>)>> {
    if input.is_file() {
        let parser = parser_for_path(input).unwrap_or_else(|| Box::new(PlainTextParser::new()));
        return Ok(vec![(input.to_path_buf(), parser)]);
    }

    if !input.is_dir() {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(parser) = parser_for_path(path) {
            files.push((path.to_path_buf(), parser));
        }
    }

    Ok(files)
}

fn read_documents(path: &Path, parser: &dyn DocumentParser) -> Result<Vec<RawDocument>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let documents = parser.parse(&path.display().to_string(), &bytes)?;
    Ok(documents)
}

pub(super) fn render_report(results: &[AnalysisResult], format: ReportFormat) -> Result<String> {
    let mut report = ReportGenerator::generate_batch(results, format)?;
    if format == ReportFormat::Markdown {
        report.push_str(&format!(
            "---\n\n*Generated by glyphscan {} on {}*\n",
            glyphscan_engine::VERSION,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
    }
    Ok(report)
}

pub(super) fn render_console(results: &[AnalysisResult], skipped: &Skipped, verbose: bool) -> String {
    let mut out = String::new();
    let with_threats: Vec<&AnalysisResult> = results.iter().filter(|r| !r.is_empty()).collect();

    out.push_str(&format!(
        "{} {}\n",
        "🔍 Unicode threat scan".bright_cyan().bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    ));

    if with_threats.is_empty() {
        out.push_str(&format!("{}\n", "✅ No threats found".bright_green()));
    }

    for result in &with_threats {
        out.push_str(&format!(
            "\n📄 {} {}\n",
            result.source_id().bold(),
            result
                .threat_class()
                .map(|c| format!("[{}]", c.as_str()))
                .unwrap_or_default()
                .dimmed()
        ));

        for (i, record) in result.records().iter().enumerate() {
            let character = record
                .primary_codepoint()
                .and_then(char::from_u32)
                .map(display_char)
                .unwrap_or_default();
            let codepoint = record
                .primary_codepoint()
                .map(|cp| format!("U+{:04X}", cp))
                .unwrap_or_default();

            out.push_str(&format!(
                "  {}. {} {} {} {} '{}' at {}\n",
                i + 1,
                record.severity.emoji(),
                record.severity.to_string().color(record.severity.color()).bold(),
                record.threat_type,
                codepoint,
                character,
                result.location(record.span.start)
            ));
            if verbose {
                out.push_str(&format!("     Detector: {}\n", record.detector_id));
                out.push_str(&format!("     Description: {}\n", record.description));
            }
        }

        let stats = result.merge_stats();
        if verbose && stats.removed_count > 0 {
            out.push_str(&format!(
                "  🔄 Merged {} overlapping findings ({:.1}%)\n",
                stats.removed_count,
                stats.reduction_percentage()
            ));
        }
    }

    let summary = glyphscan_engine::core::BatchSummary::from_results(results);
    out.push_str(&format!("\n{}\n", "📊 Summary".bright_blue().bold()));
    out.push_str(&format!("   Documents scanned: {}\n", summary.documents));
    out.push_str(&format!("   Documents with threats: {}\n", summary.documents_with_threats));
    out.push_str(&format!(
        "   Threats: {} ({} high, {} medium, {} low)\n",
        summary.threats.total,
        summary.threats.by_severity.high,
        summary.threats.by_severity.medium,
        summary.threats.by_severity.low
    ));
    if skipped.files > 0 || skipped.documents > 0 {
        out.push_str(&format!(
            "   {} {} files, {} documents\n",
            "Skipped:".yellow(),
            skipped.files,
            skipped.documents
        ));
    }

    out
}
