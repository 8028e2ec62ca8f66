//! Treescribe - snapshot a directory tree as tree text, JSON, Markdown, XML or CSV

pub mod cache;
pub mod error;
pub mod gitignore;
pub mod output;
pub mod pattern;
pub mod session;
pub mod tree;
pub mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheStats, SessionCache};
pub use error::{ConfigError, GenerateError};
pub use output::{OutputConfig, StreamingFormatter, render_tree};
pub use session::{GenerateOutput, Session, generate, stream, validate_root};
pub use tree::{
    CancellationToken, EventSink, EventStream, FileEntry, Hooks, OutputFormat, PartialConfig,
    StreamEvent, StreamingWalker, StructureConfig, TreeReport, TreeWalker,
};
