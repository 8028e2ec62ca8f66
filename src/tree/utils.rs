//! Shared utility functions for tree walking

use crate::cache::EntryStat;

/// Format a size in bytes to human-readable format.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Render permissions as the nine-character `rwxr-xr-x` form.
///
/// Without unix mode bits only the read-only flag is known, so every class
/// gets the same `r--` or `rw-` triple.
pub fn format_permissions(stat: &EntryStat) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    match stat.mode {
        Some(mode) => BITS
            .iter()
            .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
            .collect(),
        None if stat.readonly => "r--r--r--".to_string(),
        None => "rw-rw-rw-".to_string(),
    }
}

/// Join a child name onto a root-relative parent path.
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == "." {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
