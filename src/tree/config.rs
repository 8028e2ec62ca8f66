//! Configuration types for tree walkers

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Folder names excluded unless the caller overrides the list.
pub const DEFAULT_EXCLUDE_FOLDERS: &[&str] = &["node_modules", ".git"];

/// Child count above which a directory is collapsed into a summary line.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 50;

/// Ordering applied to every children list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Type,
}

/// Text format produced by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tree,
    Json,
    Markdown,
    Xml,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Tree => "tree",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Xml => "xml",
            OutputFormat::Csv => "csv",
        }
    }

    /// File extension used when the output is persisted.
    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::Tree => "txt",
            other => other.as_str(),
        }
    }
}

/// Icon set used by the tree-shaped formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IconStyle {
    #[default]
    Emoji,
    Ascii,
    None,
}

/// Traversal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Materialize the full tree, then format it.
    #[default]
    Eager,
    /// Emit events as entries are discovered; memory bounded by depth.
    Streaming,
}

/// Fully resolved configuration for one traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureConfig {
    pub include_hidden: bool,
    pub exclude_folders: Vec<String>,
    /// Extension whitelist: lowercase, no leading dot. Empty allows everything.
    pub extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub respect_gitignore: bool,
    pub include_size: bool,
    pub include_permissions: bool,
    pub include_modified_date: bool,
    pub sort_by: SortKey,
    pub output_format: OutputFormat,
    /// 0 = unlimited
    pub max_depth: usize,
    pub compress_large_dirs: bool,
    pub compression_threshold: usize,
    pub icon_style: IconStyle,
    /// Extension -> icon overrides.
    pub custom_icons: BTreeMap<String, String>,
    pub mode: TraversalMode,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            exclude_folders: DEFAULT_EXCLUDE_FOLDERS.iter().map(|s| s.to_string()).collect(),
            extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            respect_gitignore: true,
            include_size: false,
            include_permissions: false,
            include_modified_date: false,
            sort_by: SortKey::Name,
            output_format: OutputFormat::Tree,
            max_depth: 0,
            compress_large_dirs: false,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            icon_style: IconStyle::Emoji,
            custom_icons: BTreeMap::new(),
            mode: TraversalMode::Eager,
        }
    }
}

impl StructureConfig {
    /// Resolve a partial configuration against the defaults.
    pub fn resolve(partial: PartialConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_depth = match partial.max_depth {
            Some(depth) if depth < 0 => return Err(ConfigError::NegativeDepth(depth)),
            Some(depth) => depth as usize,
            None => defaults.max_depth,
        };
        let compression_threshold = match partial.compression_threshold {
            Some(threshold) if threshold < 1 => {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
            Some(threshold) => threshold as usize,
            None => defaults.compression_threshold,
        };

        Ok(Self {
            include_hidden: partial.include_hidden.unwrap_or(defaults.include_hidden),
            exclude_folders: partial
                .exclude_folders
                .map(|folders| non_empty(folders.into_iter().map(|f| f.trim().to_string())))
                .unwrap_or(defaults.exclude_folders),
            extensions: partial
                .extensions
                .map(|exts| non_empty(exts.iter().map(|e| normalize_extension(e))))
                .unwrap_or(defaults.extensions),
            exclude_patterns: partial
                .exclude_patterns
                .map(|patterns| non_empty(patterns.into_iter().map(|p| p.trim().to_string())))
                .unwrap_or(defaults.exclude_patterns),
            respect_gitignore: partial.respect_gitignore.unwrap_or(defaults.respect_gitignore),
            include_size: partial.include_size.unwrap_or(defaults.include_size),
            include_permissions: partial
                .include_permissions
                .unwrap_or(defaults.include_permissions),
            include_modified_date: partial
                .include_modified_date
                .unwrap_or(defaults.include_modified_date),
            sort_by: partial.sort_by.unwrap_or(defaults.sort_by),
            output_format: partial.output_format.unwrap_or(defaults.output_format),
            max_depth,
            compress_large_dirs: partial
                .compress_large_dirs
                .unwrap_or(defaults.compress_large_dirs),
            compression_threshold,
            icon_style: partial.icon_style.unwrap_or(defaults.icon_style),
            custom_icons: partial
                .custom_icons
                .map(|icons| {
                    icons
                        .into_iter()
                        .map(|(ext, icon)| (normalize_extension(&ext), icon))
                        .filter(|(ext, _)| !ext.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.custom_icons),
            mode: partial.mode.unwrap_or(defaults.mode),
        })
    }

    /// A single stat call serves size, permissions and modified date.
    pub fn needs_stat(&self) -> bool {
        self.include_size || self.include_permissions || self.include_modified_date
    }

    /// Whether a directory at `depth` (root = 0) must not be descended into.
    pub fn at_max_depth(&self, depth: usize) -> bool {
        self.max_depth != 0 && depth >= self.max_depth
    }

    /// Whether a directory with `child_count` filtered children is collapsed.
    pub fn should_compress(&self, child_count: usize) -> bool {
        self.compress_large_dirs && child_count > self.compression_threshold
    }
}

/// Caller-supplied configuration where every field may be absent.
///
/// Deserializes from the same camelCase keys as [`StructureConfig`], so host
/// settings files and templates can carry any subset of options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_folders: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_gitignore: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_permissions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_modified_date: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress_large_dirs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_style: Option<IconStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_icons: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TraversalMode>,
}

impl PartialConfig {
    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: PartialConfig) -> PartialConfig {
        PartialConfig {
            include_hidden: overrides.include_hidden.or(self.include_hidden),
            exclude_folders: overrides.exclude_folders.or(self.exclude_folders),
            extensions: overrides.extensions.or(self.extensions),
            exclude_patterns: overrides.exclude_patterns.or(self.exclude_patterns),
            respect_gitignore: overrides.respect_gitignore.or(self.respect_gitignore),
            include_size: overrides.include_size.or(self.include_size),
            include_permissions: overrides.include_permissions.or(self.include_permissions),
            include_modified_date: overrides.include_modified_date.or(self.include_modified_date),
            sort_by: overrides.sort_by.or(self.sort_by),
            output_format: overrides.output_format.or(self.output_format),
            max_depth: overrides.max_depth.or(self.max_depth),
            compress_large_dirs: overrides.compress_large_dirs.or(self.compress_large_dirs),
            compression_threshold: overrides.compression_threshold.or(self.compression_threshold),
            icon_style: overrides.icon_style.or(self.icon_style),
            custom_icons: overrides.custom_icons.or(self.custom_icons),
            mode: overrides.mode.or(self.mode),
        }
    }
}

impl From<&StructureConfig> for PartialConfig {
    fn from(config: &StructureConfig) -> Self {
        PartialConfig {
            include_hidden: Some(config.include_hidden),
            exclude_folders: Some(config.exclude_folders.clone()),
            extensions: Some(config.extensions.clone()),
            exclude_patterns: Some(config.exclude_patterns.clone()),
            respect_gitignore: Some(config.respect_gitignore),
            include_size: Some(config.include_size),
            include_permissions: Some(config.include_permissions),
            include_modified_date: Some(config.include_modified_date),
            sort_by: Some(config.sort_by),
            output_format: Some(config.output_format),
            max_depth: Some(config.max_depth as i64),
            compress_large_dirs: Some(config.compress_large_dirs),
            compression_threshold: Some(config.compression_threshold as i64),
            icon_style: Some(config.icon_style),
            custom_icons: Some(config.custom_icons.clone()),
            mode: Some(config.mode),
        }
    }
}

/// Lowercase an extension and strip any leading dots.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn non_empty(items: impl Iterator<Item = String>) -> Vec<String> {
    items.filter(|item| !item.is_empty()).collect()
}
