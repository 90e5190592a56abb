//! Cooperative cancellation for a single evaluation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{Error, Result};

/// A cancellation token passed to every `next`/`contains`/`stats` call.
///
/// One `Context` is shared by every Scanner/Index handle created for a
/// single logical evaluation; cloning it is cheap (an `Arc` bump) and all
/// clones observe the same cancellation. The core never spawns background
/// work itself — every suspension point is on the caller's thread — so this
/// is deliberately simpler than a `tokio`-style context: there is nothing to
/// select on besides "has the caller asked us to stop".
#[derive(Clone, Debug)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never cancels on its own.
    pub fn background() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// A context that auto-cancels once `timeout` has elapsed, checked
    /// lazily on each call to `check`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True if `cancel()` was called, or the deadline (if any) has passed.
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// Returns `Err(Error::Cancelled)` if cancelled, `Ok(())` otherwise.
    /// Operators call this at the top of `next`/`contains` before touching
    /// the store.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
