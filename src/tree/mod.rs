//! Directory tree walking logic
//!
//! Two traversal modes share the same filtering, decoration and ordering:
//!
//! - `TreeWalker`: builds the full tree in memory, then hands it to a formatter
//! - `StreamingWalker`: emits events as entries are discovered, using memory
//!   proportional to depth

mod config;
mod entry;
mod filter;
mod hooks;
mod sort;
mod streaming;
mod traversal;
mod utils;
mod walker;

pub use config::{
    DEFAULT_COMPRESSION_THRESHOLD, DEFAULT_EXCLUDE_FOLDERS, IconStyle, OutputFormat,
    PartialConfig, SortKey, StructureConfig, TraversalMode, normalize_extension,
};
pub use entry::{Descendants, EntryKind, FileEntry};
pub use filter::{FilterPipeline, RawEntry};
pub use hooks::{CancelCheck, CancellationToken, Hooks, ProgressCallback};
pub use sort::{compare_entries, natural_cmp, sort_entries};
pub use streaming::{
    EVENT_QUEUE_CAPACITY, EventSink, EventStream, PROGRESS_EVENT_INTERVAL, StreamEvent,
    StreamingWalker, WalkSummary, replay,
};
pub use traversal::BaseTraversal;
pub use utils::{format_permissions, format_size, join_relative};
pub use walker::{TreeReport, TreeWalker};
