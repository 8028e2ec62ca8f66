//! Output configuration types

use chrono::{DateTime, Utc};

use crate::tree::{FileEntry, OutputFormat, StructureConfig};

use super::icons::resolve_icon;

/// Name and version stamped into generated documents.
pub const GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Configuration for output formatting.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// The traversal configuration, echoed in JSON metadata.
    pub structure: StructureConfig,
    pub use_color: bool,
    pub generated_at: DateTime<Utc>,
}

impl OutputConfig {
    pub fn new(structure: StructureConfig) -> Self {
        Self {
            structure,
            use_color: false,
            generated_at: Utc::now(),
        }
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Pin the generation timestamp, e.g. for reproducible output.
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.structure.output_format
    }

    pub fn icon_for(&self, entry: &FileEntry) -> String {
        resolve_icon(
            entry,
            self.structure.icon_style,
            &self.structure.custom_icons,
        )
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(StructureConfig::default())
    }
}
