//! StreamingWalker - emits tree events without building the full tree in memory
//!
//! Memory is bounded by depth times sibling count: each open directory holds
//! only its own decorated children list.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::cache::SessionCache;
use crate::error::GenerateError;

use super::config::StructureConfig;
use super::entry::FileEntry;
use super::filter::RawEntry;
use super::hooks::{CancellationToken, Hooks};
use super::sort::compare_entries;
use super::traversal::{BaseTraversal, root_read_error};
use super::walker::TreeReport;

/// A progress event is emitted after every this many entries.
pub const PROGRESS_EVENT_INTERVAL: usize = 100;

/// Bound on events buffered between the walker thread and an [`EventStream`].
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// One step of a streaming traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    Start {
        root: FileEntry,
    },
    File {
        entry: FileEntry,
        prefix: String,
        is_last: bool,
    },
    DirectoryOpen {
        entry: FileEntry,
        prefix: String,
        is_last: bool,
    },
    DirectoryClose,
    Progress {
        processed_count: usize,
    },
    End {
        duration_ms: u64,
        total_items: usize,
    },
}

/// Receives events as a streaming traversal discovers entries.
pub trait EventSink {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), GenerateError>;
}

impl EventSink for Vec<StreamEvent> {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        self.push(event);
        Ok(())
    }
}

/// Totals reported when a streaming walk finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub total_items: usize,
    pub duration: Duration,
}

/// Streaming tree walker that emits events directly to a sink.
pub struct StreamingWalker {
    config: StructureConfig,
    cache: Arc<SessionCache>,
}

impl StreamingWalker {
    pub fn new(config: StructureConfig) -> Self {
        Self {
            config,
            cache: Arc::new(SessionCache::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Walk `root` and push every event into `sink`.
    pub fn walk<S: EventSink + ?Sized>(
        &self,
        root: &Path,
        sink: &mut S,
        hooks: &mut Hooks,
    ) -> Result<WalkSummary, GenerateError> {
        let start = Instant::now();
        let base = BaseTraversal::new(&self.config, &self.cache);

        hooks.check_cancelled()?;
        let root_entry = base.root_entry(root)?;
        sink.on_event(StreamEvent::Start { root: root_entry })?;
        let listing = base
            .read_and_filter_entries(root, ".")
            .map_err(|e| root_read_error(root, e))?;

        let mut processed = 0;
        self.walk_dir_streaming(&base, listing, 1, "", sink, hooks, &mut processed)?;

        let duration = start.elapsed();
        sink.on_event(StreamEvent::End {
            duration_ms: duration.as_millis() as u64,
            total_items: processed,
        })?;
        tracing::debug!(
            root = %root.display(),
            total_items = processed,
            duration_ms = duration.as_millis() as u64,
            "streaming walk finished"
        );
        Ok(WalkSummary {
            total_items: processed,
            duration,
        })
    }

    /// Run the walk on a background thread, handing events out through a
    /// bounded queue. Dropping the stream stops the walker.
    pub fn spawn(self, root: PathBuf, hooks: Hooks) -> Result<EventStream, GenerateError> {
        let (sender, receiver) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
        let token = CancellationToken::new();
        let mut hooks = hooks.with_token(&token);

        let handle = thread::Builder::new()
            .name("treescribe-stream".into())
            .spawn(move || {
                let mut sink = ChannelSink { sender };
                self.walk(&root, &mut sink, &mut hooks)
            })
            .map_err(|e| GenerateError::Worker(e.to_string()))?;

        Ok(EventStream {
            receiver,
            handle: Some(handle),
            token,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_dir_streaming<S: EventSink + ?Sized>(
        &self,
        base: &BaseTraversal<'_>,
        entries: Vec<RawEntry>,
        depth: usize,
        prefix: &str,
        sink: &mut S,
        hooks: &mut Hooks,
        processed: &mut usize,
    ) -> Result<(), GenerateError> {
        hooks.check_cancelled()?;

        // Decide the visible siblings up front so is_last is known.
        let mut valid_entries: Vec<(RawEntry, FileEntry)> = entries
            .into_iter()
            .filter_map(|raw| {
                let entry = base.decorate(&raw)?;
                if raw.kind.is_dir() && !base.at_max_depth(depth) && !is_readable_dir(&raw.path)
                {
                    return None;
                }
                Some((raw, entry))
            })
            .collect();
        valid_entries.sort_by(|a, b| compare_entries(&a.1, &b.1, self.config.sort_by));

        let total = valid_entries.len();
        for (i, (raw, mut entry)) in valid_entries.into_iter().enumerate() {
            let is_last = i == total - 1;

            *processed += 1;
            hooks.advance(1, || format!("Processing {}", raw.relative));
            if *processed % PROGRESS_EVENT_INTERVAL == 0 {
                sink.on_event(StreamEvent::Progress {
                    processed_count: *processed,
                })?;
            }

            if !raw.kind.is_dir() {
                sink.on_event(StreamEvent::File {
                    entry,
                    prefix: prefix.to_string(),
                    is_last,
                })?;
                continue;
            }

            let listing = if base.at_max_depth(depth) {
                None
            } else {
                // Probed above; a directory that vanished since is shown empty.
                Some(base.try_read_children(&raw).unwrap_or_default())
            };
            let listing = match listing {
                Some(listing) if base.should_compress(listing.len()) => {
                    entry.collapsed = Some(listing.len());
                    None
                }
                other => other,
            };

            sink.on_event(StreamEvent::DirectoryOpen {
                entry,
                prefix: prefix.to_string(),
                is_last,
            })?;
            if let Some(listing) = listing {
                let child_prefix = base.calculate_child_prefix(prefix, is_last);
                self.walk_dir_streaming(
                    base,
                    listing,
                    depth + 1,
                    &child_prefix,
                    sink,
                    hooks,
                    processed,
                )?;
            }
            sink.on_event(StreamEvent::DirectoryClose)?;
        }
        Ok(())
    }
}

fn is_readable_dir(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable directory");
            false
        }
    }
}

struct ChannelSink {
    sender: Sender<StreamEvent>,
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, event: StreamEvent) -> Result<(), GenerateError> {
        // The consumer hung up: stop walking.
        self.sender
            .send(event)
            .map_err(|_| GenerateError::Cancelled)
    }
}

/// Pull-based view of a streaming traversal running on its own thread.
///
/// Yields events in traversal order. A failure ends the stream with a single
/// `Err` item.
pub struct EventStream {
    receiver: Receiver<StreamEvent>,
    handle: Option<JoinHandle<Result<WalkSummary, GenerateError>>>,
    token: CancellationToken,
}

impl EventStream {
    /// Ask the walker to stop at its next directory boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Iterator for EventStream {
    type Item = Result<StreamEvent, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Ok(event) = self.receiver.recv() {
            return Some(Ok(event));
        }
        // Channel closed: the walker finished, one way or another.
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(Err(e)),
            Err(_) => Some(Err(GenerateError::Worker(
                "streaming walker panicked".to_string(),
            ))),
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Replay a materialized tree as the event sequence a streaming walk of the
/// same directory would produce.
pub fn replay<S: EventSink + ?Sized>(report: &TreeReport, sink: &mut S) -> Result<(), GenerateError> {
    let mut root = report.root.clone();
    let children = root.children.take().unwrap_or_default();
    sink.on_event(StreamEvent::Start { root })?;

    let mut processed = 0;
    replay_children(&children, "", sink, &mut processed)?;

    sink.on_event(StreamEvent::End {
        duration_ms: report.duration.as_millis() as u64,
        total_items: report.total_items,
    })
}

fn replay_children<S: EventSink + ?Sized>(
    children: &[FileEntry],
    prefix: &str,
    sink: &mut S,
    processed: &mut usize,
) -> Result<(), GenerateError> {
    let total = children.len();
    for (i, child) in children.iter().enumerate() {
        let is_last = i == total - 1;
        *processed += 1;
        if *processed % PROGRESS_EVENT_INTERVAL == 0 {
            sink.on_event(StreamEvent::Progress {
                processed_count: *processed,
            })?;
        }

        let mut entry = child.clone();
        let grandchildren = entry.children.take();
        if !child.is_dir() {
            sink.on_event(StreamEvent::File {
                entry,
                prefix: prefix.to_string(),
                is_last,
            })?;
            continue;
        }

        sink.on_event(StreamEvent::DirectoryOpen {
            entry,
            prefix: prefix.to_string(),
            is_last,
        })?;
        if let Some(grandchildren) = grandchildren {
            let child_prefix = if is_last {
                format!("{}    ", prefix)
            } else {
                format!("{}│   ", prefix)
            };
            replay_children(&grandchildren, &child_prefix, sink, processed)?;
        }
        sink.on_event(StreamEvent::DirectoryClose)?;
    }
    Ok(())
}
