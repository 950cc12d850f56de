use super::scan::{exit_code, render_console, render_report, Skipped};
use super::{load_config, OutputFormat, SeverityLevel, StoreArgs};
use anyhow::Result;
use clap::Args;
use glyphscan_engine::{AnalysisEngine, ConfusableDetector, Document, Severity};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Text to analyze
    #[arg(short, long)]
    pub text: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Also print the confusable skeleton of the text
    #[arg(long)]
    pub skeleton: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub fail_on: Option<SeverityLevel>,
}

impl CheckArgs {
    pub fn execute(&self) -> Result<ExitCode> {
        let config = load_config(self.config.as_deref())?;
        let store = Arc::new(self.store.load_store()?);
        let engine = AnalysisEngine::new(Arc::clone(&store), config);

        let document = Document::new("input", &self.text)?;
        let results = vec![engine.analyze(&document)];

        let rendered = match self.format.report_format() {
            None => render_console(&results, &Skipped::default(), true),
            Some(format) => render_report(&results, format)?,
        };
        print!("{}", rendered);

        if self.skeleton {
            let skeleton = ConfusableDetector::skeleton_string(&store, document.text());
            println!("skeleton: {}", skeleton);
        }

        Ok(exit_code(&results, self.fail_on.map(Severity::from)))
    }
}
