//! Tree formatting and display
//!
//! This module provides formatters for the five output formats, in two
//! disciplines that produce identical text:
//!
//! - whole-tree formatters take a finished [`TreeReport`]
//! - [`StreamingFormatter`] consumes stream events as they arrive
//!
//! # Module Structure
//!
//! - `config` - Output configuration types
//! - `utils` - Line-level helpers shared by both disciplines
//! - `icons` - Icon lookup
//! - `tree`, `markdown`, `json`, `xml`, `csv` - Whole-tree formatters
//! - `streaming` - Incremental formatter for every format
//! - `console` - Colored terminal output

mod config;
mod console;
mod csv;
mod icons;
mod json;
mod markdown;
mod streaming;
mod tree;
mod utils;
mod xml;

use crate::error::GenerateError;
use crate::tree::{OutputFormat, TreeReport};

pub use config::{GENERATOR, OutputConfig};
pub use console::ConsoleFormatter;
pub use csv::CsvFormatter;
pub use icons::resolve_icon;
pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use streaming::StreamingFormatter;
pub use tree::TreeFormatter;
pub use utils::{csv_quote, format_date, metadata_suffix, xml_escape};
pub use xml::XmlFormatter;

/// Render a finished tree in the configured format.
pub fn render_tree(report: &TreeReport, config: &OutputConfig) -> Result<String, GenerateError> {
    let root = &report.root;
    let text = match config.format() {
        OutputFormat::Tree => TreeFormatter::new(config.clone()).format(root),
        OutputFormat::Markdown => MarkdownFormatter::new(config.clone()).format(root),
        OutputFormat::Xml => XmlFormatter::new(config.clone()).format(root),
        OutputFormat::Csv => CsvFormatter.format(root),
        OutputFormat::Json => JsonFormatter::new(config.clone()).format(
            root,
            report.total_items,
            report.duration.as_millis() as u64,
        )?,
    };
    Ok(text)
}
