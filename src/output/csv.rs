//! CSV output formatting

use crate::tree::FileEntry;

use super::utils::{CSV_HEADER, csv_row};

/// One row per entry below the root, in pre-order.
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn format(&self, root: &FileEntry) -> String {
        let mut output = String::from(CSV_HEADER);
        for entry in root.descendants() {
            output.push_str(&csv_row(entry));
        }
        output
    }
}
