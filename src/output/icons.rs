//! Icon lookup for tree-shaped output

use std::collections::BTreeMap;

use crate::tree::{EntryKind, FileEntry, IconStyle};

/// Resolve the icon for an entry. Returns `""` when icons are disabled.
///
/// Order: user override by extension, built-in extension table (emoji only),
/// then the per-kind default.
pub fn resolve_icon(
    entry: &FileEntry,
    style: IconStyle,
    overrides: &BTreeMap<String, String>,
) -> String {
    if style == IconStyle::None {
        return String::new();
    }

    if !entry.is_dir() {
        if let Some(ext) = entry.extension() {
            if let Some(icon) = overrides.get(&ext) {
                return icon.clone();
            }
            if style == IconStyle::Emoji {
                if let Some(icon) = builtin_icon(&ext) {
                    return icon.to_string();
                }
            }
        }
    }

    kind_icon(entry.kind, style).to_string()
}

fn kind_icon(kind: EntryKind, style: IconStyle) -> &'static str {
    match (style, kind) {
        (IconStyle::None, _) => "",
        (IconStyle::Emoji, EntryKind::Directory) => "📁",
        (IconStyle::Emoji, EntryKind::File) => "📄",
        (IconStyle::Emoji, EntryKind::Symlink) => "🔗",
        (IconStyle::Ascii, EntryKind::Directory) => "[D]",
        (IconStyle::Ascii, EntryKind::File) => "[F]",
        (IconStyle::Ascii, EntryKind::Symlink) => "[L]",
    }
}

fn builtin_icon(ext: &str) -> Option<&'static str> {
    let icon = match ext {
        "rs" => "🦀",
        "js" | "mjs" | "cjs" | "jsx" => "📜",
        "ts" | "tsx" => "📘",
        "py" => "🐍",
        "go" => "🐹",
        "rb" => "💎",
        "java" | "kt" => "☕",
        "c" | "h" | "cpp" | "hpp" | "cc" => "🔧",
        "sh" | "bash" | "zsh" => "🐚",
        "json" | "toml" | "yaml" | "yml" | "ini" => "⚙️",
        "md" | "markdown" | "txt" | "rst" => "📝",
        "html" | "htm" => "🌐",
        "css" | "scss" | "sass" | "less" => "🎨",
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" => "🖼️",
        "mp3" | "wav" | "flac" | "ogg" => "🎵",
        "mp4" | "mov" | "mkv" | "webm" => "🎬",
        "zip" | "tar" | "gz" | "tgz" | "xz" | "7z" | "rar" => "📦",
        "pdf" => "📕",
        "lock" => "🔒",
        "sql" | "db" | "sqlite" => "🗃️",
        _ => return None,
    };
    Some(icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_style_disables_everything() {
        let overrides = BTreeMap::from([("rs".to_string(), "R".to_string())]);
        let entry = FileEntry::file("main.rs", "main.rs");
        assert_eq!(resolve_icon(&entry, IconStyle::None, &overrides), "");
    }

    #[test]
    fn test_override_beats_builtin() {
        let overrides = BTreeMap::from([("rs".to_string(), "R".to_string())]);
        let entry = FileEntry::file("MAIN.RS", "MAIN.RS");
        assert_eq!(resolve_icon(&entry, IconStyle::Emoji, &overrides), "R");
        assert_eq!(resolve_icon(&entry, IconStyle::Ascii, &overrides), "R");
    }

    #[test]
    fn test_builtin_table_is_emoji_only() {
        let entry = FileEntry::file("main.rs", "main.rs");
        assert_eq!(resolve_icon(&entry, IconStyle::Emoji, &BTreeMap::new()), "🦀");
        assert_eq!(resolve_icon(&entry, IconStyle::Ascii, &BTreeMap::new()), "[F]");
    }

    #[test]
    fn test_kind_defaults() {
        let none = BTreeMap::new();
        let dir = FileEntry::directory("src", "src", vec![]);
        let link = FileEntry::new("l", "l", EntryKind::Symlink);
        let plain = FileEntry::file("Makefile", "Makefile");
        assert_eq!(resolve_icon(&dir, IconStyle::Emoji, &none), "📁");
        assert_eq!(resolve_icon(&link, IconStyle::Ascii, &none), "[L]");
        assert_eq!(resolve_icon(&plain, IconStyle::Emoji, &none), "📄");
    }
}
