//! JSON output formatting

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GenerateError;
use crate::tree::{FileEntry, StructureConfig};

use super::config::{GENERATOR, OutputConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonMeta<'a> {
    generated_at: DateTime<Utc>,
    generator: &'static str,
    total_items: usize,
    duration_ms: u64,
    config: &'a StructureConfig,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    meta: JsonMeta<'a>,
    structure: &'a FileEntry,
}

pub struct JsonFormatter {
    config: OutputConfig,
}

impl JsonFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Pretty-print the document for a finished traversal.
    pub fn format(
        &self,
        root: &FileEntry,
        total_items: usize,
        duration_ms: u64,
    ) -> Result<String, GenerateError> {
        let document = JsonDocument {
            meta: JsonMeta {
                generated_at: self.config.generated_at,
                generator: GENERATOR,
                total_items,
                duration_ms,
                config: &self.config.structure,
            },
            structure: root,
        };
        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        Ok(json)
    }
}
