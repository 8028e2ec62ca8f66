//! Tree formatter for buffered output
//!
//! This module provides `TreeFormatter` which formats a complete `FileEntry`
//! tree into the classic `├──`/`└──` text layout.

use crate::tree::FileEntry;

use super::config::OutputConfig;
use super::utils::{count_footer, root_line, tree_line};

/// Formatter for buffered tree output.
pub struct TreeFormatter {
    config: OutputConfig,
}

impl TreeFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, root: &FileEntry) -> String {
        let mut output = self.format_body(root);
        let (dir_count, file_count) = root.count_descendants();
        output.push_str(&count_footer(dir_count, file_count));
        output
    }

    /// The root line and every entry line, without the count footer.
    pub fn format_body(&self, root: &FileEntry) -> String {
        let mut output = root_line(root, &self.config.icon_for(root));
        self.format_children(root.children(), "", &mut output);
        output
    }

    fn format_children(&self, children: &[FileEntry], prefix: &str, output: &mut String) {
        let total = children.len();
        for (i, child) in children.iter().enumerate() {
            let is_last = i == total - 1;
            output.push_str(&tree_line(child, &self.config.icon_for(child), prefix, is_last));

            if !child.children().is_empty() {
                let new_prefix = if is_last {
                    format!("{}    ", prefix)
                } else {
                    format!("{}│   ", prefix)
                };
                self.format_children(child.children(), &new_prefix, output);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{IconStyle, StructureConfig};

    fn plain() -> OutputConfig {
        OutputConfig::new(StructureConfig {
            icon_style: IconStyle::None,
            ..Default::default()
        })
    }

    fn sample() -> FileEntry {
        FileEntry::directory(
            "project",
            ".",
            vec![
                FileEntry::directory(
                    "src",
                    "src",
                    vec![
                        FileEntry::file("lib.rs", "src/lib.rs"),
                        FileEntry::file("main.rs", "src/main.rs"),
                    ],
                ),
                FileEntry::file("README.md", "README.md"),
            ],
        )
    }

    #[test]
    fn test_format_layout() {
        let output = TreeFormatter::new(plain()).format(&sample());
        assert_eq!(
            output,
            "project\n\
             ├── src\n\
             │   ├── lib.rs\n\
             │   └── main.rs\n\
             └── README.md\n\
             \n\
             1 directories, 3 files\n"
        );
    }

    #[test]
    fn test_format_with_icons() {
        let config = OutputConfig::new(StructureConfig {
            icon_style: IconStyle::Ascii,
            ..Default::default()
        });
        let output = TreeFormatter::new(config).format(&sample());
        assert!(output.starts_with("[D] project\n├── [D] src\n"));
        assert!(output.contains("└── [F] README.md\n"));
    }

    #[test]
    fn test_collapsed_directory_line() {
        let mut big = FileEntry::directory("big", "big", vec![]);
        big.collapsed = Some(60);
        let root = FileEntry::directory("r", ".", vec![big]);
        let output = TreeFormatter::new(plain()).format(&root);
        assert!(output.contains("└── big/ (60 items collapsed)\n"));
    }
}
