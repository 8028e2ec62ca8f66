//! Progress and cancellation hooks passed into a traversal

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::GenerateError;

pub type ProgressCallback = Box<dyn FnMut(usize, &str) + Send>;
pub type CancelCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Shared flag for cooperative cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Optional callbacks observed by the walkers.
///
/// The cancellation check runs once per directory. The progress callback
/// receives an increment of 1 for each entry emitted into the result.
#[derive(Default)]
pub struct Hooks {
    on_progress: Option<ProgressCallback>,
    is_cancelled: Option<CancelCheck>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize, &str) + Send + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Add a cancellation predicate. Multiple predicates are OR-ed.
    pub fn cancel_when<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_cancelled = Some(match self.is_cancelled.take() {
            Some(previous) => Arc::new(move || previous() || check()),
            None => Arc::new(check),
        });
        self
    }

    pub fn with_token(self, token: &CancellationToken) -> Self {
        let token = token.clone();
        self.cancel_when(move || token.is_cancelled())
    }

    /// Report progress. The message is only built when someone listens.
    pub(crate) fn advance<M>(&mut self, increment: usize, message: M)
    where
        M: FnOnce() -> String,
    {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(increment, &message());
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), GenerateError> {
        match &self.is_cancelled {
            Some(check) if check() => Err(GenerateError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_progress", &self.on_progress.is_some())
            .field("is_cancelled", &self.is_cancelled.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_token_cancels_hooks() {
        let token = CancellationToken::new();
        let hooks = Hooks::new().with_token(&token);
        assert!(hooks.check_cancelled().is_ok());
        token.cancel();
        assert!(hooks.check_cancelled().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancel_checks_are_combined() {
        let token = CancellationToken::new();
        let hooks = Hooks::new().cancel_when(|| false).with_token(&token);
        assert!(hooks.check_cancelled().is_ok());
        token.cancel();
        assert!(hooks.check_cancelled().is_err());
    }

    #[test]
    fn test_progress_message_built_lazily() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut hooks = Hooks::new().on_progress(move |inc, msg| {
            sink.lock().unwrap().push((inc, msg.to_string()));
        });
        hooks.advance(1, || "Processing a".to_string());
        assert_eq!(*seen.lock().unwrap(), vec![(1, "Processing a".to_string())]);

        let mut silent = Hooks::new();
        silent.advance(1, || panic!("message must not be built without a listener"));
    }
}
