//! Sibling ordering

use std::cmp::Ordering;

use super::config::SortKey;
use super::entry::FileEntry;

/// Sort a children list, then recurse into every directory.
///
/// The sort is stable, so entries that compare equal keep their
/// enumeration order.
pub fn sort_entries(entries: &mut [FileEntry], key: SortKey) {
    entries.sort_by(|a, b| compare_entries(a, b, key));
    for entry in entries.iter_mut() {
        if let Some(children) = entry.children.as_mut() {
            sort_entries(children, key);
        }
    }
}

/// Compare two siblings under `key`.
///
/// Directories come before non-directories for every key except
/// [`SortKey::Type`], which orders purely by kind name.
pub fn compare_entries(a: &FileEntry, b: &FileEntry, key: SortKey) -> Ordering {
    if key != SortKey::Type {
        let dirs_first = b.is_dir().cmp(&a.is_dir());
        if dirs_first != Ordering::Equal {
            return dirs_first;
        }
    }

    match key {
        SortKey::Name => natural_cmp(&a.name, &b.name),
        SortKey::Size => b.size.unwrap_or(0).cmp(&a.size.unwrap_or(0)),
        SortKey::Modified => modified_millis(b).cmp(&modified_millis(a)),
        SortKey::Type => a.kind.as_str().cmp(b.kind.as_str()),
    }
}

// Missing timestamps sort as the epoch.
fn modified_millis(entry: &FileEntry) -> i64 {
    entry.modified_at.map_or(0, |t| t.timestamp_millis())
}

/// Case-insensitive comparison where digit runs compare numerically,
/// so `file2` sorts before `file10`. Ties fall back to byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match compare_chunks(a, b) {
        Ordering::Equal => a.cmp(b),
        ord => ord,
    }
}

fn compare_chunks(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_digits = take_digits(&mut left);
                let y_digits = take_digits(&mut right);
                let ord = compare_numeric(&x_digits, &y_digits);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_numeric(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}
