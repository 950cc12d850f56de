use crate::core::analysis_result::{AnalysisResult, ThreatSummary};
use crate::core::{ThreatRecord, ThreatType};
use crate::error::ReportError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const TABLE_COLUMNS: [&str; 7] = [
    "character",
    "unicode_point",
    "threat_type",
    "threat_severity",
    "description",
    "source",
    "location",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Table,
    Text,
    Markdown,
}

/// The externally visible fields of one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub character: String,
    pub unicode_point: String,
    pub threat_type: String,
    pub threat_severity: String,
    pub description: String,
    pub source: String,
    pub location: String,
}

impl ReportRow {
    fn fields(&self) -> [&str; 7] {
        [
            &self.character,
            &self.unicode_point,
            &self.threat_type,
            &self.threat_severity,
            &self.description,
            &self.source,
            &self.location,
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
struct JsonRecord {
    #[serde(flatten)]
    row: ReportRow,
    span_start: usize,
    span_end: usize,
    involved_codepoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct JsonDocument<'a> {
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    threat_class: Option<&'static str>,
    summary: ThreatSummary,
    threats: Vec<JsonRecord>,
}

#[derive(Debug, Clone, Serialize)]
struct JsonReport<'a> {
    documents: Vec<JsonDocument<'a>>,
    summary: BatchSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// Totals across a batch of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub documents: usize,
    pub documents_with_threats: usize,
    pub threats: ThreatSummary,
    pub top_sources: Vec<SourceCount>,
}

impl BatchSummary {
    const TOP_SOURCES: usize = 5;

    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut summary = Self {
            documents: results.len(),
            ..Self::default()
        };

        let mut sources: Vec<SourceCount> = Vec::new();
        for result in results {
            let document_summary = result.summary();
            if document_summary.total > 0 {
                summary.documents_with_threats += 1;
                sources.push(SourceCount {
                    source: result.source_id().to_string(),
                    count: document_summary.total,
                });
            }
            summary.threats.merge(&document_summary);
        }

        sources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
        sources.truncate(Self::TOP_SOURCES);
        summary.top_sources = sources;
        summary
    }
}

pub fn format_codepoint(codepoint: u32) -> String {
    format!("U+{:04X}", codepoint)
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(result: &AnalysisResult, format: ReportFormat) -> Result<String> {
        Self::generate_batch(std::slice::from_ref(result), format)
    }

    pub fn generate_batch(results: &[AnalysisResult], format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => Self::generate_json(results),
            ReportFormat::Table => Ok(Self::generate_table(results)),
            ReportFormat::Text => Ok(Self::generate_text(results)),
            ReportFormat::Markdown => Ok(Self::generate_markdown(results)),
        }
    }

    pub fn row(result: &AnalysisResult, record: &ThreatRecord) -> ReportRow {
        let (character, unicode_point) = match record.primary_codepoint() {
            Some(codepoint) => (
                char::from_u32(codepoint).map(String::from).unwrap_or_default(),
                format_codepoint(codepoint),
            ),
            None => (String::new(), String::new()),
        };

        ReportRow {
            character,
            unicode_point,
            threat_type: record.threat_type.as_str().to_string(),
            threat_severity: record.severity.as_str().to_string(),
            description: record.description.clone(),
            source: record.source_id.clone(),
            location: result.location(record.span.start),
        }
    }

    pub fn rows(result: &AnalysisResult) -> Vec<ReportRow> {
        result
            .records()
            .iter()
            .map(|record| Self::row(result, record))
            .collect()
    }

    /// The record list of a single result as a JSON array.
    pub fn records_json(result: &AnalysisResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::json_records(result))?)
    }

    fn json_records(result: &AnalysisResult) -> Vec<JsonRecord> {
        result
            .records()
            .iter()
            .map(|record| JsonRecord {
                row: Self::row(result, record),
                span_start: record.span.start,
                span_end: record.span.end,
                involved_codepoints: record
                    .involved_codepoints
                    .iter()
                    .map(|&c| format_codepoint(c))
                    .collect(),
            })
            .collect()
    }

    fn generate_json(results: &[AnalysisResult]) -> Result<String> {
        let documents: Vec<JsonDocument> = results
            .iter()
            .map(|result| JsonDocument {
                source: result.source_id(),
                threat_class: result.threat_class().map(|c| c.as_str()),
                summary: result.summary(),
                threats: Self::json_records(result),
            })
            .collect();

        let report = JsonReport {
            documents,
            summary: BatchSummary::from_results(results),
        };

        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn generate_table(results: &[AnalysisResult]) -> String {
        let mut table = TABLE_COLUMNS.join("\t");
        table.push('\n');

        for result in results {
            for row in Self::rows(result) {
                let fields: Vec<String> = row.fields().iter().map(|f| escape_field(f)).collect();
                table.push_str(&fields.join("\t"));
                table.push('\n');
            }
        }

        table
    }

    /// Reads back the output of the `Table` format.
    pub fn parse_table(table: &str) -> Result<Vec<ReportRow>, ReportError> {
        let mut lines = table.lines();
        let header = lines.next().ok_or(ReportError::MissingHeader)?;
        if header != TABLE_COLUMNS.join("\t") {
            return Err(ReportError::UnexpectedHeader(header.to_string()));
        }

        let mut rows = Vec::new();
        for (index, line) in lines.enumerate() {
            let line_number = index + 2;
            if line.is_empty() {
                continue;
            }

            let fields = line
                .split('\t')
                .map(|f| unescape_field(f, line_number))
                .collect::<Result<Vec<_>, _>>()?;
            let [character, unicode_point, threat_type, threat_severity, description, source, location]: [String; 7] =
                fields.try_into().map_err(|fields: Vec<String>| ReportError::FieldCount {
                    line: line_number,
                    expected: TABLE_COLUMNS.len(),
                    found: fields.len(),
                })?;

            rows.push(ReportRow {
                character,
                unicode_point,
                threat_type,
                threat_severity,
                description,
                source,
                location,
            });
        }

        Ok(rows)
    }

    fn generate_text(results: &[AnalysisResult]) -> String {
        let mut text = String::new();

        for result in results {
            for (record, row) in result.records().iter().zip(Self::rows(result)) {
                let shown: String = row.character.chars().map(display_char).collect();
                let _ = writeln!(
                    text,
                    "[{}] {} {} '{}' in {} at {}: {}",
                    record.severity,
                    record.threat_type,
                    row.unicode_point,
                    shown,
                    row.source,
                    row.location,
                    row.description
                );
            }
        }

        text
    }

    fn generate_markdown(results: &[AnalysisResult]) -> String {
        let summary = BatchSummary::from_results(results);
        let mut report = String::new();

        report.push_str("# Unicode Threat Report\n\n");
        report.push_str("## Summary\n\n");
        let _ = writeln!(report, "- **Documents**: {}", summary.documents);
        let _ = writeln!(report, "- **Documents with threats**: {}", summary.documents_with_threats);
        let _ = writeln!(report, "- **Total threats**: {}", summary.threats.total);
        let _ = writeln!(report, "- **High**: {}", summary.threats.by_severity.high);
        let _ = writeln!(report, "- **Medium**: {}", summary.threats.by_severity.medium);
        let _ = writeln!(report, "- **Low**: {}", summary.threats.by_severity.low);
        report.push('\n');

        if !summary.threats.by_type.is_empty() {
            report.push_str("### By threat type\n\n");
            report.push_str("| Threat type | Count |\n");
            report.push_str("|-------------|-------|\n");
            for threat_type in ThreatType::ALL {
                if let Some(count) = summary.threats.by_type.get(&threat_type) {
                    let _ = writeln!(report, "| {} | {} |", threat_type, count);
                }
            }
            report.push('\n');
        }

        if !summary.top_sources.is_empty() {
            report.push_str("### Top sources\n\n");
            for source in &summary.top_sources {
                let _ = writeln!(report, "- `{}`: {}", source.source, source.count);
            }
            report.push('\n');
        }

        for result in results.iter().filter(|r| !r.is_empty()) {
            let _ = writeln!(report, "## {}\n", result.source_id());
            if let Some(class) = result.threat_class() {
                let _ = writeln!(report, "**Threat class**: {}\n", class.as_str());
            }
            Self::append_findings_table(&mut report, result);
        }

        report
    }

    fn append_findings_table(report: &mut String, result: &AnalysisResult) {
        report.push_str("| # | Severity | Type | Codepoint | Location | Description |\n");
        report.push_str("|---|----------|------|-----------|----------|-------------|\n");

        for (idx, (record, row)) in result.records().iter().zip(Self::rows(result)).enumerate() {
            let _ = writeln!(
                report,
                "| {} | {} {} | {} | {} | {} | {} |",
                idx + 1,
                record.severity.emoji(),
                record.severity,
                record.threat_type,
                row.unicode_point,
                row.location,
                Self::truncate(&row.description.replace('|', "\\|"), 80)
            );
        }

        report.push('\n');
    }

    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }
}

fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_field(field: &str, line: usize) -> Result<String, ReportError> {
    let mut unescaped = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('t') => unescaped.push('\t'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            _ => return Err(ReportError::InvalidEscape { line }),
        }
    }
    Ok(unescaped)
}

/// Invisible and control characters are shown as `\u{XXXX}` in text
/// output so that a line never reorders or hides itself.
pub fn display_char(c: char) -> String {
    let invisible = matches!(
        c as u32,
        0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x206F
            | 0x180E
            | 0xFE00..=0xFE0F
            | 0xFEFF
            | 0xE0000..=0xE007F
    );
    if invisible || c.is_control() {
        format!("\\u{{{:X}}}", c as u32)
    } else {
        c.to_string()
    }
}
