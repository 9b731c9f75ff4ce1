//! Progress reporting and cooperative cancellation
//!
//! The core never blocks and never spawns threads; every bounded loop polls
//! the caller-supplied [`Progress`] collaborator so long passes can be
//! labeled, measured, and aborted promptly. Cancellation is not a data error:
//! partial results committed before the signal remain valid.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Raised by [`Progress::check_cancelled`] when the caller requested an
/// abort.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Caller-supplied progress/cancellation collaborator.
///
/// All methods have no-op defaults, so lightweight callers only implement
/// what they need.
pub trait Progress {
    fn set_task(&mut self, _task: &str, _subtask: &str) {}

    fn set_subtask(&mut self, _subtask: &str) {}

    fn set_maximum(&mut self, _maximum: u64) {}

    fn set_progress(&mut self, _value: u64) {}

    fn increment(&mut self) {}

    fn check_cancelled(&self) -> Result<(), Cancelled> {
        Ok(())
    }
}

/// No-op progress reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Progress reporter backed by a shared cancel flag, for callers that only
/// need cancellation (a signal handler, a UI thread).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that can be moved to another context to request cancellation.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Progress for CancelFlag {
    fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.cancelled.load(Ordering::Relaxed) {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_never_cancels() {
        let progress = NoProgress;
        assert!(progress.check_cancelled().is_ok());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(flag.check_cancelled().is_ok());
        flag.cancel();
        assert_eq!(flag.check_cancelled(), Err(Cancelled));
    }
}
