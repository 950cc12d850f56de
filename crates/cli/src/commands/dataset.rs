use super::StoreArgs;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use glyphscan_engine::{
    core::report_generator::display_char, properties::ucd, CodepointRecord, PropertyStore,
};

#[derive(Subcommand, Clone, Debug)]
pub enum DatasetCommand {
    /// Load and validate the dataset, then print its statistics
    Validate {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the properties of one codepoint (U+XXXX, hex, or a character)
    Lookup {
        codepoint: String,

        #[command(flatten)]
        store: StoreArgs,
    },
}

impl DatasetCommand {
    pub fn execute(&self) -> Result<()> {
        match self {
            DatasetCommand::Validate { store } => validate(store),
            DatasetCommand::Lookup { codepoint, store } => lookup(codepoint, store),
        }
    }
}

fn validate(args: &StoreArgs) -> Result<()> {
    let store = args.load_store()?;
    let metadata = store.metadata();

    println!("{}", "✅ Dataset is valid".bright_green().bold());
    println!("   Name: {}", metadata.name);
    println!("   Unicode version: {}", metadata.unicode_version);
    if let Some(description) = &metadata.description {
        println!("   Description: {}", description);
    }
    println!("   Ranges: {}", store.range_count());
    println!("   Assigned codepoints: {}", store.len());
    println!("   Skeletons: {}", store.skeleton_count());
    Ok(())
}

/// `U+0430`, `u+430` and bare hex are codepoints; any other single
/// character stands for itself.
fn parse_codepoint_arg(arg: &str) -> Result<u32> {
    let mut chars = arg.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_ascii_hexdigit() {
            return Ok(c as u32);
        }
    }
    ucd::parse_codepoint(arg, "argument").with_context(|| format!("invalid codepoint '{}'", arg))
}

fn describe(record: &CodepointRecord) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Codepoint", format!("U+{:04X}", record.codepoint)),
        (
            "Character",
            record.as_char().map(display_char).unwrap_or_else(|| "-".to_string()),
        ),
        ("Script", record.script.full_name().to_string()),
        ("Category", record.category.code().to_string()),
        ("Bidi class", record.bidi_class.code().to_string()),
        ("Identifier status", record.identifier_status.to_string()),
    ];

    if let Some(skeleton) = record.skeleton {
        let codepoints: Vec<String> = skeleton.iter().map(|cp| format!("U+{:04X}", cp)).collect();
        let rendered: String = skeleton.iter().copied().filter_map(char::from_u32).collect();
        rows.push(("Skeleton", format!("{} '{}'", codepoints.join(" "), rendered)));
    }

    rows
}

fn lookup(arg: &str, args: &StoreArgs) -> Result<()> {
    let codepoint = parse_codepoint_arg(arg)?;
    let store: PropertyStore = args.load_store()?;
    let record = store.lookup(codepoint);

    if !record.is_assigned() {
        println!("{}", "⚠️  Not in dataset (unassigned)".yellow());
    }
    for (label, value) in describe(&record) {
        println!("{:>18}: {}", label.bold(), value);
    }
    Ok(())
}
