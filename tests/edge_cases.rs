//! Edge case and error handling tests for treescribe


use harness::{TestDir, run_treescribe};
use std::fs;
use std::os::unix::fs::{PermissionsExt, symlink};

// ============================================================================
// Symlink Edge Cases
// ============================================================================

#[test]
fn test_symlink_to_file() {
    let dir = TestDir::new();
    dir.add_file("target.rs", "fn target() {}");
    dir.add_symlink("target.rs", "link.rs");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["--icons", "ascii"]);
    assert!(success, "treescribe should succeed with symlink");
    assert!(stdout.contains("[F] target.rs"), "should show target file");
    assert!(stdout.contains("[L] link.rs"), "symlink listed as a link: {}", stdout);
}

#[test]
fn test_symlink_to_directory_not_followed() {
    let dir = TestDir::new();
    dir.add_file("realdir/file.rs", "fn file() {}");
    dir.add_symlink("realdir", "linkdir");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success, "treescribe should succeed with directory symlink");
    assert!(stdout.contains("linkdir"), "should list the link");
    assert_eq!(
        stdout.matches("file.rs").count(),
        1,
        "link target should not be descended into: {}",
        stdout
    );
}

#[test]
fn test_symlink_to_parent_no_infinite_loop() {
    let dir = TestDir::new();
    dir.add_file("subdir/file.rs", "fn file() {}");
    symlink("..", dir.path().join("subdir").join("parent"))
        .expect("Failed to create parent symlink");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success, "treescribe should not hang on parent symlink");
    assert!(stdout.contains("subdir"), "should show subdir");
    assert!(stdout.contains("file.rs"), "should show file in subdir");
    assert!(stdout.contains("parent"), "the link itself is listed");
}

#[test]
fn test_broken_symlink() {
    let dir = TestDir::new();
    dir.add_file("real.rs", "fn real() {}");
    symlink("nonexistent.rs", dir.path().join("broken_link.rs"))
        .expect("Failed to create broken symlink");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-s"]);
    assert!(success, "treescribe should handle broken symlinks");
    assert!(stdout.contains("real.rs"), "should show real file");
    assert!(stdout.contains("broken_link.rs"), "link itself can be stat'ed");
}

#[test]
fn test_self_referential_symlink() {
    let dir = TestDir::new();
    dir.add_file("file.rs", "fn file() {}");
    symlink("selfref", dir.path().join("selfref"))
        .expect("Failed to create self-referential symlink");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success, "treescribe should handle self-referential symlinks");
    assert!(stdout.contains("file.rs"), "should show regular file");
}

// ============================================================================
// Permission Error Handling
// ============================================================================

#[test]
fn test_unreadable_directory() {
    let dir = TestDir::new();
    dir.add_file("readable/file.rs", "fn readable() {}");
    let unreadable = dir.add_dir("unreadable");
    fs::write(unreadable.join("secret.rs"), "fn secret() {}").expect("Failed to write file");

    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&unreadable, perms).expect("Failed to set permissions");

    let (tree, _stderr, tree_ok) = run_treescribe(dir.path(), &[]);
    let (streamed, _stderr, stream_ok) = run_treescribe(dir.path(), &["--stream"]);

    // Restore permissions for cleanup
    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&unreadable, perms).expect("Failed to restore permissions");

    assert!(tree_ok, "treescribe should handle unreadable directories gracefully");
    assert!(stream_ok, "streaming should handle unreadable directories gracefully");
    assert!(tree.contains("readable"), "should show readable directory");
    assert!(tree.contains("file.rs"), "should show readable file");
    assert_eq!(tree, streamed, "both modes skip the same entries");
}

#[test]
fn test_permissions_column() {
    let dir = TestDir::new();
    let script = dir.add_file("run.sh", "#!/bin/sh");
    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o750);
    fs::set_permissions(&script, perms).unwrap();

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-p"]);
    assert!(success);
    assert!(stdout.contains("run.sh  [rwxr-x---]"), "mode rendered: {}", stdout);
}

// ============================================================================
// File Name Edge Cases
// ============================================================================

#[test]
fn test_filename_with_spaces() {
    let dir = TestDir::new();
    dir.add_file("my file.rs", "");
    dir.add_file("dir with spaces/inner file.txt", "");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success);
    assert!(stdout.contains("my file.rs"));
    assert!(stdout.contains("inner file.txt"));
}

#[test]
fn test_filename_with_unicode() {
    let dir = TestDir::new();
    dir.add_file("日本語.txt", "");
    dir.add_file("émoji_🦀.rs", "");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-f", "json"]);
    assert!(success, "treescribe should handle unicode filenames");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let names: Vec<&str> = json["structure"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"日本語.txt"));
    assert!(names.contains(&"émoji_🦀.rs"));
}

#[test]
fn test_filename_with_special_chars() {
    let dir = TestDir::new();
    dir.add_file("a&b<c>.xml", "");
    dir.add_file("quote\"d.csv", "");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-f", "xml"]);
    assert!(success);
    assert!(stdout.contains("a&amp;b&lt;c&gt;.xml"), "xml escaped: {}", stdout);
    assert!(stdout.contains("quote&quot;d.csv"), "quotes escaped: {}", stdout);

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-f", "csv"]);
    assert!(success);
    assert!(stdout.contains("\"quote\"\"d.csv\",file"), "csv quoted: {}", stdout);
}

#[test]
fn test_natural_name_order() {
    let dir = TestDir::new();
    for name in ["file10.txt", "file2.txt", "File1.txt"] {
        dir.add_file(name, "");
    }

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["--icons", "none"]);
    assert!(success);
    let one = stdout.find("File1.txt").unwrap();
    let two = stdout.find("file2.txt").unwrap();
    let ten = stdout.find("file10.txt").unwrap();
    assert!(one < two && two < ten, "numeric runs compare by value: {}", stdout);
}

// ============================================================================
// Directory Shape Edge Cases
// ============================================================================

#[test]
fn test_empty_directory() {
    let dir = TestDir::new();

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success);
    assert!(stdout.ends_with("\n0 directories, 0 files\n"), "got: {}", stdout);

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["-f", "csv"]);
    assert!(success);
    assert_eq!(stdout, "Path,Type,Size (bytes),Permissions,Modified\n");
}

#[test]
fn test_very_deep_nesting() {
    let dir = TestDir::new();
    let deep = (0..40).map(|i| format!("d{}", i)).collect::<Vec<_>>().join("/");
    dir.add_file(&format!("{}/leaf.txt", deep), "");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success);
    assert!(stdout.contains("leaf.txt"));
    assert!(stdout.contains("40 directories, 1 files"), "got: {}", stdout);
}

#[test]
fn test_compression_threshold_boundary() {
    let dir = TestDir::new();
    dir.add_files("exact", "f", 5);
    dir.add_files("over", "g", 6);

    let (stdout, _stderr, success) =
        run_treescribe(dir.path(), &["--compress", "5", "--icons", "none"]);
    assert!(success);
    assert!(stdout.contains("f4"), "at the threshold stays expanded: {}", stdout);
    assert!(stdout.contains("over/ (6 items collapsed)"), "got: {}", stdout);
}

#[test]
fn test_compression_counts_filtered_entries() {
    let dir = TestDir::new();
    dir.add_files("mixed", "keep", 3);
    dir.add_files("mixed", ".hidden", 10);

    let (stdout, _stderr, success) =
        run_treescribe(dir.path(), &["--compress", "5", "--icons", "none"]);
    assert!(success);
    assert!(
        !stdout.contains("collapsed"),
        "hidden entries don't count toward the threshold: {}",
        stdout
    );
}

// ============================================================================
// Gitignore Edge Cases
// ============================================================================

#[test]
fn test_malformed_gitignore() {
    let dir = TestDir::new();
    dir.add_file("normal.rs", "fn normal() {}");
    dir.add_file("keep.rs", "fn keep() {}");
    dir.add_gitignore(
        "",
        r#"
# Comment line
*.log

# Odd patterns should be tolerated, not crash
[invalid
**/
normal.rs
"#,
    );

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success, "treescribe should handle malformed gitignore");
    assert!(!stdout.contains("normal.rs"), "explicit rule applies: {}", stdout);
    assert!(stdout.contains("keep.rs"));
}

#[test]
fn test_nested_gitignore_files() {
    let dir = TestDir::new();
    dir.add_file("root.rs", "fn root() {}");
    dir.add_file("root.log", "");
    dir.add_gitignore("", "*.log\n");
    dir.add_gitignore("subdir", "*.tmp\n!keep.tmp\n");
    dir.add_file("subdir/file.rs", "fn file() {}");
    dir.add_file("subdir/ignore.tmp", "ignored");
    dir.add_file("subdir/keep.tmp", "kept via negation");

    let (stdout, _stderr, success) = run_treescribe(dir.path(), &[]);
    assert!(success, "treescribe should handle nested gitignore files");
    assert!(stdout.contains("root.rs"));
    assert!(!stdout.contains("root.log"));
    assert!(stdout.contains("file.rs"));
    assert!(!stdout.contains("ignore.tmp"), "nearest file applies: {}", stdout);
    assert!(stdout.contains("keep.tmp"), "negation re-includes: {}", stdout);
}

// ============================================================================
// Performance Regression Tests
// ============================================================================

#[test]
fn test_performance_1000_files() {
    use std::time::Instant;

    let dir = TestDir::new();
    for i in 0..10 {
        dir.add_files(&format!("dir_{:02}", i), "file_", 100);
    }

    let start = Instant::now();
    let (stdout, _stderr, success) = run_treescribe(dir.path(), &["--stream"]);
    let elapsed = start.elapsed();

    assert!(success, "treescribe should succeed with 1000 files");
    assert!(
        stdout.contains("10 directories, 1000 files"),
        "should process all files: {}",
        stdout
    );

    // Generous threshold to avoid flaky tests
    assert!(
        elapsed.as_secs() < 10,
        "processing 1000 files took too long: {:?}",
        elapsed
    );
}
