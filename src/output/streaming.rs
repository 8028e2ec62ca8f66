//! Streaming output formatter
//!
//! This module provides `StreamingFormatter`, which writes each format
//! incrementally as stream events arrive. Only JSON needs the whole tree, so
//! it rebuilds the tree from events and writes it on `end`.

use std::io::Write;

use crate::error::GenerateError;
use crate::tree::{EventSink, FileEntry, OutputFormat, StreamEvent};

use super::config::OutputConfig;
use super::json::JsonFormatter;
use super::utils::{
    CSV_HEADER, XML_FOOTER, count_footer, csv_row, markdown_footer, markdown_header, root_line,
    tree_line, xml_header, xml_node_end, xml_node_start,
};

/// Incremental formatter for any output format.
pub struct StreamingFormatter<W: Write> {
    config: OutputConfig,
    writer: W,
    dir_count: usize,
    file_count: usize,
    /// Depth of the innermost open XML node.
    xml_depth: usize,
    /// An XML start tag has been written without its terminator.
    xml_tag_open: bool,
    json_stack: Vec<FileEntry>,
}

impl<W: Write> StreamingFormatter<W> {
    pub fn new(config: OutputConfig, writer: W) -> Self {
        Self {
            config,
            writer,
            dir_count: 0,
            file_count: 0,
            xml_depth: 0,
            xml_tag_open: false,
            json_stack: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, text: &str) -> Result<(), GenerateError> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(GenerateError::Write)
    }

    fn tally(&mut self, entry: &FileEntry) {
        if entry.is_dir() {
            self.dir_count += 1;
        } else {
            self.file_count += 1;
        }
    }

    fn tree_event(&mut self, event: StreamEvent, markdown: bool) -> Result<(), GenerateError> {
        match event {
            StreamEvent::Start { root } => {
                if markdown {
                    let header = markdown_header(&root.name, &self.config.generated_at);
                    self.write(&header)?;
                }
                let line = root_line(&root, &self.config.icon_for(&root));
                self.write(&line)
            }
            StreamEvent::File {
                entry,
                prefix,
                is_last,
            }
            | StreamEvent::DirectoryOpen {
                entry,
                prefix,
                is_last,
            } => {
                self.tally(&entry);
                let line = tree_line(&entry, &self.config.icon_for(&entry), &prefix, is_last);
                self.write(&line)
            }
            StreamEvent::End { .. } => {
                let footer = if markdown {
                    markdown_footer(self.dir_count, self.file_count)
                } else {
                    count_footer(self.dir_count, self.file_count)
                };
                self.write(&footer)
            }
            StreamEvent::DirectoryClose | StreamEvent::Progress { .. } => Ok(()),
        }
    }

    /// Finish a pending start tag once a child is known to follow.
    fn xml_open_pending(&mut self) -> Result<(), GenerateError> {
        if self.xml_tag_open {
            self.xml_tag_open = false;
            self.write(">\n")?;
        }
        Ok(())
    }

    fn xml_close(&mut self) -> Result<(), GenerateError> {
        if self.xml_tag_open {
            self.xml_tag_open = false;
            self.write("/>\n")?;
        } else {
            let end = xml_node_end(self.xml_depth);
            self.write(&end)?;
        }
        self.xml_depth = self.xml_depth.saturating_sub(1);
        Ok(())
    }

    fn xml_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        match event {
            StreamEvent::Start { root } => {
                let header = xml_header(&root.name, &self.config.generated_at);
                self.write(&header)?;
                self.xml_depth = 1;
                let tag = xml_node_start(&root, self.xml_depth);
                self.write(&tag)?;
                self.xml_tag_open = true;
                Ok(())
            }
            StreamEvent::File { entry, .. } => {
                self.xml_open_pending()?;
                let tag = xml_node_start(&entry, self.xml_depth + 1);
                self.write(&tag)?;
                self.write("/>\n")
            }
            StreamEvent::DirectoryOpen { entry, .. } => {
                self.xml_open_pending()?;
                self.xml_depth += 1;
                let tag = xml_node_start(&entry, self.xml_depth);
                self.write(&tag)?;
                self.xml_tag_open = true;
                Ok(())
            }
            StreamEvent::DirectoryClose => self.xml_close(),
            StreamEvent::End { .. } => {
                self.xml_close()?;
                self.write(XML_FOOTER)
            }
            StreamEvent::Progress { .. } => Ok(()),
        }
    }

    fn csv_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        match event {
            StreamEvent::Start { .. } => self.write(CSV_HEADER),
            StreamEvent::File { entry, .. } | StreamEvent::DirectoryOpen { entry, .. } => {
                self.write(&csv_row(&entry))
            }
            _ => Ok(()),
        }
    }

    fn json_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        match event {
            StreamEvent::Start { mut root } => {
                root.children = Some(Vec::new());
                self.json_stack.push(root);
                Ok(())
            }
            StreamEvent::DirectoryOpen { mut entry, .. } => {
                entry.children = Some(Vec::new());
                self.json_stack.push(entry);
                Ok(())
            }
            StreamEvent::File { entry, .. } => {
                self.json_attach(entry);
                Ok(())
            }
            StreamEvent::DirectoryClose => {
                if let Some(dir) = self.json_stack.pop() {
                    self.json_attach(dir);
                }
                Ok(())
            }
            StreamEvent::End {
                duration_ms,
                total_items,
            } => {
                let root = self.json_stack.pop().ok_or_else(|| {
                    GenerateError::EventOrder("end event without a start event".to_string())
                })?;
                let json = JsonFormatter::new(self.config.clone()).format(
                    &root,
                    total_items,
                    duration_ms,
                )?;
                self.write(&json)
            }
            StreamEvent::Progress { .. } => Ok(()),
        }
    }

    fn json_attach(&mut self, entry: FileEntry) {
        if let Some(parent) = self.json_stack.last_mut() {
            parent.children.get_or_insert_with(Vec::new).push(entry);
        }
    }
}

impl<W: Write> EventSink for StreamingFormatter<W> {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        match self.config.format() {
            OutputFormat::Tree => self.tree_event(event, false),
            OutputFormat::Markdown => self.tree_event(event, true),
            OutputFormat::Xml => self.xml_event(event),
            OutputFormat::Csv => self.csv_event(event),
            OutputFormat::Json => self.json_event(event),
        }
    }
}
