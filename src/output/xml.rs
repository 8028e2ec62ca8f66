//! XML output formatting

use crate::tree::FileEntry;

use super::config::OutputConfig;
use super::utils::{XML_FOOTER, xml_header, xml_node_end, xml_node_start};

pub struct XmlFormatter {
    config: OutputConfig,
}

impl XmlFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, root: &FileEntry) -> String {
        let mut output = xml_header(&root.name, &self.config.generated_at);
        write_node(root, 1, &mut output);
        output.push_str(XML_FOOTER);
        output
    }
}

fn write_node(entry: &FileEntry, depth: usize, output: &mut String) {
    output.push_str(&xml_node_start(entry, depth));
    if entry.children().is_empty() {
        output.push_str("/>\n");
        return;
    }
    output.push_str(">\n");
    for child in entry.children() {
        write_node(child, depth + 1, output);
    }
    output.push_str(&xml_node_end(depth));
}
