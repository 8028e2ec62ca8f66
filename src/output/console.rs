//! Colored tree output for terminals

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::GenerateError;
use crate::tree::{EntryKind, EventSink, FileEntry, StreamEvent};

use super::config::OutputConfig;
use super::utils::{connector, metadata_suffix};

/// Writes tree-format events straight to stdout with colors.
pub struct ConsoleFormatter {
    config: OutputConfig,
    stdout: StandardStream,
    dir_count: usize,
    file_count: usize,
}

impl ConsoleFormatter {
    pub fn new(config: OutputConfig) -> Self {
        let choice = if config.use_color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self {
            config,
            stdout: StandardStream::stdout(choice),
            dir_count: 0,
            file_count: 0,
        }
    }

    fn write_entry(&mut self, entry: &FileEntry) -> io::Result<()> {
        let icon = self.config.icon_for(entry);
        if !icon.is_empty() {
            write!(self.stdout, "{} ", icon)?;
        }

        let mut spec = ColorSpec::new();
        match entry.kind {
            EntryKind::Directory => spec.set_fg(Some(Color::Blue)).set_bold(true),
            EntryKind::Symlink => spec.set_fg(Some(Color::Cyan)),
            EntryKind::File => spec.set_fg(None),
        };
        self.stdout.set_color(&spec)?;
        write!(self.stdout, "{}", entry.name)?;
        self.stdout.reset()?;

        if let Some(count) = entry.collapsed {
            self.stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(self.stdout, "/ ({} items collapsed)", count)?;
            self.stdout.reset()?;
        }

        let suffix = metadata_suffix(entry);
        if !suffix.is_empty() {
            self.stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(self.stdout, "{}", suffix)?;
            self.stdout.reset()?;
        }
        writeln!(self.stdout)
    }

    fn handle(&mut self, event: StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::Start { root } => self.write_entry(&root),
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
                if entry.is_dir() {
                    self.dir_count += 1;
                } else {
                    self.file_count += 1;
                }
                write!(self.stdout, "{}{}", prefix, connector(is_last))?;
                self.write_entry(&entry)
            }
            StreamEvent::End { .. } => {
                writeln!(self.stdout)?;
                writeln!(
                    self.stdout,
                    "{} directories, {} files",
                    self.dir_count, self.file_count
                )?;
                self.stdout.flush()
            }
            StreamEvent::DirectoryClose | StreamEvent::Progress { .. } => Ok(()),
        }
    }
}

impl EventSink for ConsoleFormatter {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        self.handle(event).map_err(GenerateError::Write)
    }
}
