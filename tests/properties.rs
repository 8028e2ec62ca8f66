//! Property tests: random trees through both traversal modes

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use treescribe::output::render_tree;
use treescribe::test_utils::TestDir;
use treescribe::tree::{IconStyle, SortKey};
use treescribe::{
    Hooks, OutputConfig, OutputFormat, Session, StreamEvent, StreamingFormatter, StructureConfig,
};

/// A file somewhere below the root: directory segments plus a file name.
#[derive(Debug, Clone)]
struct FileSpec {
    dirs: Vec<String>,
    name: String,
    size: usize,
}

fn segment() -> impl Strategy<Value = String> {
    ("[a-d]{1,3}", any::<bool>()).prop_map(|(name, hidden)| {
        if hidden { format!(".{}", name) } else { name }
    })
}

fn file_spec() -> impl Strategy<Value = FileSpec> {
    (
        proptest::collection::vec(segment(), 0..4),
        segment(),
        prop_oneof![Just("rs"), Just("md"), Just("txt")],
        0usize..64,
    )
        .prop_map(|(dirs, stem, ext, size)| FileSpec {
            dirs,
            // Directory segments never contain an extension, so names cannot collide.
            name: format!("{}.{}", stem, ext),
            size,
        })
}

fn build(files: &[FileSpec], empty_dirs: &[Vec<String>]) -> TestDir {
    let dir = TestDir::new();
    for file in files {
        let mut path = file.dirs.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&file.name);
        dir.add_file(&path, &"x".repeat(file.size));
    }
    for segments in empty_dirs.iter().filter(|s| !s.is_empty()) {
        dir.add_dir(&segments.join("/"));
    }
    dir
}

fn config_strategy() -> impl Strategy<Value = StructureConfig> {
    (
        prop_oneof![
            Just(OutputFormat::Tree),
            Just(OutputFormat::Json),
            Just(OutputFormat::Markdown),
            Just(OutputFormat::Xml),
            Just(OutputFormat::Csv),
        ],
        prop_oneof![Just(SortKey::Name), Just(SortKey::Size), Just(SortKey::Type)],
        0usize..4,
        prop::option::of(1usize..4),
        any::<bool>(),
    )
        .prop_map(|(output_format, sort_by, max_depth, threshold, include_hidden)| {
            StructureConfig {
                output_format,
                sort_by,
                max_depth,
                compress_large_dirs: threshold.is_some(),
                compression_threshold: threshold.unwrap_or(50),
                include_hidden,
                include_size: true,
                icon_style: IconStyle::Ascii,
                ..Default::default()
            }
        })
}

fn output_config(config: &StructureConfig) -> OutputConfig {
    OutputConfig::new(config.clone())
        .with_generated_at(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
}

fn without_duration(text: &str) -> serde_json::Value {
    let mut value: serde_json::Value = serde_json::from_str(text).unwrap();
    value["meta"]["durationMs"] = serde_json::Value::Null;
    value
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_random_trees_render_the_same_in_both_modes(
        files in proptest::collection::vec(file_spec(), 0..16),
        empty_dirs in proptest::collection::vec(proptest::collection::vec(segment(), 0..3), 0..4),
        config in config_strategy(),
    ) {
        let dir = build(&files, &empty_dirs);
        let session = Session::new();

        let report = session.build_tree(dir.path(), &config, Hooks::new()).unwrap();
        let eager = render_tree(&report, &output_config(&config)).unwrap();

        let mut formatter = StreamingFormatter::new(output_config(&config), Vec::new());
        session.walk(dir.path(), &config, &mut formatter, Hooks::new()).unwrap();
        let streamed = String::from_utf8(formatter.into_inner()).unwrap();

        if config.output_format == OutputFormat::Json {
            prop_assert_eq!(without_duration(&eager), without_duration(&streamed));
        } else {
            prop_assert_eq!(eager, streamed, "{:?} output differs", config.output_format);
        }
    }

    #[test]
    fn test_random_trees_emit_balanced_events(
        files in proptest::collection::vec(file_spec(), 0..16),
        config in config_strategy(),
    ) {
        let dir = build(&files, &[]);
        let session = Session::new();
        let expected = session.build_tree(dir.path(), &config, Hooks::new()).unwrap().total_items;

        let events: Vec<StreamEvent> = session
            .stream(dir.path(), &config, Hooks::new())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        prop_assert!(
            matches!(events.first(), Some(StreamEvent::Start { .. })),
            "stream starts with start: {:?}",
            events.first()
        );
        let mut depth = 0usize;
        let mut deepest = 0usize;
        for (index, event) in events.iter().enumerate() {
            match event {
                StreamEvent::Start { .. } => prop_assert_eq!(index, 0, "start appears once"),
                StreamEvent::End { .. } => {
                    prop_assert_eq!(index, events.len() - 1, "end appears last")
                }
                StreamEvent::DirectoryOpen { .. } => {
                    depth += 1;
                    deepest = deepest.max(depth);
                }
                StreamEvent::DirectoryClose => {
                    prop_assert!(depth > 0, "close without open at event {}", index);
                    depth -= 1;
                }
                _ => {}
            }
        }
        prop_assert_eq!(depth, 0, "every open has a close");
        if config.max_depth > 0 {
            prop_assert!(deepest <= config.max_depth, "opened {} levels deep", deepest);
        }
        match events.last() {
            Some(StreamEvent::End { total_items, .. }) => prop_assert_eq!(*total_items, expected),
            other => prop_assert!(false, "expected end event, got {:?}", other),
        }
    }
}
