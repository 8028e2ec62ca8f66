//! Glob-style pattern compilation
//!
//! Patterns are translated into anchored regular expressions:
//!
//! - `*` matches any run of characters except `/`
//! - `**` matches any run of characters including `/` (`**/` also matches zero directories)
//! - `?` matches exactly one character except `/`
//! - `[abc]`, `[a-z]`, `[!abc]` are character classes
//! - `\x` matches `x` literally
//!
//! A pattern without a `/` is matched against the base name only. A pattern
//! that cannot be compiled degrades to literal substring containment.

use std::path::Path;

use regex::Regex;

/// A compiled path-matching predicate.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    source: String,
    kind: MatcherKind,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Empty,
    Regex { regex: Regex, basename_only: bool },
    Literal(String),
}

impl PatternMatcher {
    /// Compile a pattern. Never fails: malformed input becomes a literal matcher.
    pub fn compile(pattern: &str) -> Self {
        Self::build(pattern, false)
    }

    /// Compile a pattern that always matches against the full path, even
    /// when it contains no separator.
    pub fn anchored(pattern: &str) -> Self {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, full_path: bool) -> Self {
        let kind = if pattern.is_empty() {
            MatcherKind::Empty
        } else {
            match translate(pattern).and_then(|re| Regex::new(&re).ok()) {
                Some(regex) => MatcherKind::Regex {
                    regex,
                    basename_only: !full_path && !pattern.contains('/'),
                },
                None => {
                    tracing::debug!(pattern, "malformed pattern, falling back to literal match");
                    MatcherKind::Literal(pattern.to_string())
                }
            }
        };
        Self {
            source: pattern.to_string(),
            kind,
        }
    }

    /// The pattern text this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether compilation failed and the matcher uses substring containment.
    pub fn is_literal_fallback(&self) -> bool {
        matches!(self.kind, MatcherKind::Literal(_))
    }

    /// Test a `/`-separated path against the pattern.
    pub fn matches(&self, path: &str) -> bool {
        match &self.kind {
            MatcherKind::Empty => false,
            MatcherKind::Literal(literal) => path.contains(literal.as_str()),
            MatcherKind::Regex {
                regex,
                basename_only,
            } => {
                let candidate = if *basename_only {
                    basename(path)
                } else {
                    path.trim_start_matches("./")
                };
                regex.is_match(candidate)
            }
        }
    }
}

/// Convenience wrapper around [`PatternMatcher::compile`].
pub fn compile(pattern: &str) -> PatternMatcher {
    PatternMatcher::compile(pattern)
}

/// Render a relative path with `/` separators on every platform.
pub fn to_slash_path(path: &Path) -> String {
    let lossy = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        lossy.into_owned()
    } else {
        lossy.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Translate a glob into an anchored regex. `None` means the glob is malformed.
fn translate(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    let mut buf = [0u8; 4];
    re.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    re.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    re.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                re.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                re.push_str("[^/]");
                i += 1;
            }
            '\\' => {
                let next = chars.get(i + 1)?;
                re.push_str(&regex::escape(next.encode_utf8(&mut buf)));
                i += 2;
            }
            '[' => {
                let (class, next) = translate_class(&chars, i)?;
                re.push_str(&class);
                i = next;
            }
            c => {
                re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    re.push('$');
    Some(re)
}

/// Translate a `[...]` class starting at `start`. Returns the regex class and
/// the index just past the closing bracket.
fn translate_class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let mut class = String::from("[");

    if matches!(chars.get(i), Some('!') | Some('^')) {
        class.push('^');
        i += 1;
    }

    let content_start = i;
    loop {
        let c = *chars.get(i)?;
        if c == ']' && i > content_start {
            break;
        }
        match c {
            '\\' | '[' | ']' | '&' | '~' => {
                class.push('\\');
                class.push(c);
            }
            _ => class.push(c),
        }
        i += 1;
    }

    class.push(']');
    Some((class, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_stays_within_segment() {
        let m = compile("src/*.ts");
        assert!(m.matches("src/main.ts"));
        assert!(!m.matches("src/nested/main.ts"));
        assert!(!m.matches("lib/main.ts"));
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let m = compile("src/**/*.ts");
        assert!(m.matches("src/a/b/c.ts"));
        assert!(m.matches("src/c.ts"));
        assert!(!m.matches("lib/c.ts"));

        let m = compile("docs/**");
        assert!(m.matches("docs/a/b.md"));
    }

    #[test]
    fn test_no_separator_matches_basename() {
        let m = compile("*.log");
        assert!(m.matches("error.log"));
        assert!(m.matches("logs/deep/error.log"));
        assert!(!m.matches("error.log.txt"));
    }

    #[test]
    fn test_question_mark() {
        let m = compile("test?.rs");
        assert!(m.matches("test1.rs"));
        assert!(m.matches("testa.rs"));
        assert!(!m.matches("test12.rs"));
        assert!(!compile("a?b").matches("a/b"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let m = compile("a+b.txt");
        assert!(m.matches("a+b.txt"));
        assert!(!m.matches("aab.txt"));
        assert!(!m.matches("a+bxtxt"));
        assert!(compile("(draft)").matches("(draft)"));
    }

    #[test]
    fn test_character_classes() {
        assert!(compile("[abc].txt").matches("a.txt"));
        assert!(!compile("[abc].txt").matches("d.txt"));
        assert!(compile("[a-z].txt").matches("x.txt"));
        assert!(!compile("[a-z].txt").matches("X.txt"));
        assert!(compile("[!a].txt").matches("b.txt"));
        assert!(!compile("[!a].txt").matches("a.txt"));
    }

    #[test]
    fn test_escaped_star_is_literal() {
        let m = compile(r"file\*.txt");
        assert!(m.matches("file*.txt"));
        assert!(!m.matches("file1.txt"));
    }

    #[test]
    fn test_malformed_falls_back_to_literal() {
        let m = compile("foo[");
        assert!(m.is_literal_fallback());
        assert!(m.matches("dir/foo[bar"));
        assert!(!m.matches("foobar"));

        let m = compile(r"trailing\");
        assert!(m.is_literal_fallback());
        assert!(m.matches(r"x/trailing\"));
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let m = compile("");
        assert!(!m.matches(""));
        assert!(!m.matches("anything"));
    }

    #[test]
    fn test_anchored_matches_full_path_only() {
        let m = PatternMatcher::anchored("build");
        assert!(m.matches("build"));
        assert!(!m.matches("web/build"));
    }

    #[test]
    fn test_exact_name() {
        let m = compile("node_modules");
        assert!(m.matches("node_modules"));
        assert!(m.matches("web/node_modules"));
        assert!(!m.matches("node_modules_old"));
    }
}
