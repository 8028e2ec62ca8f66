//! Markdown output formatting
//!
//! This module provides `MarkdownFormatter` which wraps the tree layout in a
//! fenced code block under a project heading, suitable for documentation.

use crate::tree::FileEntry;

use super::config::OutputConfig;
use super::tree::TreeFormatter;
use super::utils::{markdown_footer, markdown_header};

pub struct MarkdownFormatter {
    config: OutputConfig,
}

impl MarkdownFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, root: &FileEntry) -> String {
        let mut output = markdown_header(&root.name, &self.config.generated_at);
        output.push_str(&TreeFormatter::new(self.config.clone()).format_body(root));
        let (dir_count, file_count) = root.count_descendants();
        output.push_str(&markdown_footer(dir_count, file_count));
        output
    }
}
