//! Line-level helpers shared by whole-tree and streaming formatters

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::tree::{FileEntry, format_size};

pub fn connector(is_last: bool) -> &'static str {
    if is_last { "└── " } else { "├── " }
}

/// Calendar date of a timestamp in local time.
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `  [1.2K, rw-r--r--, 2024-01-31]`, or empty when no metadata is present.
pub fn metadata_suffix(entry: &FileEntry) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(size) = entry.size {
        parts.push(format_size(size));
    }
    if let Some(perm) = &entry.permissions {
        parts.push(perm.clone());
    }
    if let Some(modified) = &entry.modified_at {
        parts.push(format_date(modified));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("  [{}]", parts.join(", "))
    }
}

/// Icon, name, collapse marker and metadata for one entry.
pub fn entry_label(entry: &FileEntry, icon: &str) -> String {
    let mut label = String::new();
    if !icon.is_empty() {
        label.push_str(icon);
        label.push(' ');
    }
    label.push_str(&entry.name);
    if let Some(count) = entry.collapsed {
        label.push_str(&format!("/ ({} items collapsed)", count));
    }
    label.push_str(&metadata_suffix(entry));
    label
}

pub fn tree_line(entry: &FileEntry, icon: &str, prefix: &str, is_last: bool) -> String {
    format!("{}{}{}\n", prefix, connector(is_last), entry_label(entry, icon))
}

pub fn root_line(root: &FileEntry, icon: &str) -> String {
    format!("{}\n", entry_label(root, icon))
}

pub fn count_footer(dirs: usize, files: usize) -> String {
    format!("\n{} directories, {} files\n", dirs, files)
}

pub fn markdown_header(root_name: &str, generated_at: &DateTime<Utc>) -> String {
    format!(
        "# Project Structure: {}\n\nGenerated: {}\n\n```\n",
        root_name,
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub fn markdown_footer(dirs: usize, files: usize) -> String {
    format!("```\n\n*{} directories, {} files*\n", dirs, files)
}

pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn xml_header(root_name: &str, generated_at: &DateTime<Utc>) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<projectStructure generated=\"{}\" root=\"{}\">\n",
        format_timestamp(generated_at),
        xml_escape(root_name)
    )
}

pub const XML_FOOTER: &str = "</projectStructure>\n";

/// Opening `<node ...` tag without its terminator; the caller closes it
/// with `/>` or `>` once it knows whether children follow.
pub fn xml_node_start(entry: &FileEntry, depth: usize) -> String {
    let mut tag = format!(
        "{}<node name=\"{}\" type=\"{}\"",
        "  ".repeat(depth),
        xml_escape(&entry.name),
        entry.kind.as_str()
    );
    if let Some(size) = entry.size {
        tag.push_str(&format!(" size=\"{}\"", size));
    }
    if let Some(perm) = &entry.permissions {
        tag.push_str(&format!(" perm=\"{}\"", xml_escape(perm)));
    }
    if let Some(modified) = &entry.modified_at {
        tag.push_str(&format!(" mod=\"{}\"", format_timestamp(modified)));
    }
    if let Some(count) = entry.collapsed {
        tag.push_str(&format!(" collapsed=\"{}\"", count));
    }
    tag
}

pub fn xml_node_end(depth: usize) -> String {
    format!("{}</node>\n", "  ".repeat(depth))
}

pub const CSV_HEADER: &str = "Path,Type,Size (bytes),Permissions,Modified\n";

/// Quote a CSV field, doubling embedded quotes.
pub fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn csv_row(entry: &FileEntry) -> String {
    format!(
        "{},{},{},{},{}\n",
        csv_quote(&entry.path),
        entry.kind.as_str(),
        entry.size.map(|s| s.to_string()).unwrap_or_default(),
        entry.permissions.as_deref().unwrap_or(""),
        entry.modified_at.as_ref().map(format_timestamp).unwrap_or_default()
    )
}
