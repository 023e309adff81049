//! Lifecycle of natively backed objects
//!
//! Every handle in this crate (built structs and vectors, engine values,
//! modules, errors and configurations) wraps a native resource that must be
//! released exactly once. The lifecycle has two states:
//!
//! ```text
//! Open ──close()──▶ Closed   (terminal; further close() calls are no-ops)
//! ```
//!
//! Explicit [`Managed::close`] is the primary contract. `Drop` calls
//! [`Managed::finalize`] as a safety net, guarded by the same flag, so a drop
//! after an explicit close never releases twice. Any accessor used after close
//! panics: that is a caller bug, not a recoverable failure.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Open/closed flag shared by all managed handles
#[derive(Debug, Default)]
pub struct Lifecycle {
    closed: AtomicBool,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Lifecycle {
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Transition to `Closed`, running `release` only if this call won the transition
    ///
    /// Concurrent callers race on a compare-and-set; exactly one of them runs
    /// `release`. Returns whether this call performed the transition.
    pub fn close_with(&self, release: impl FnOnce()) -> bool {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            release();
            true
        } else {
            false
        }
    }

    /// # Panics
    ///
    /// If the lifecycle is closed.
    #[track_caller]
    pub fn check_access(&self) {
        assert!(!self.is_closed(), "Cannot access an already closed object");
    }
}

/// A handle owning a native resource with idempotent explicit release
pub trait Managed {
    fn lifecycle(&self) -> &Lifecycle;

    /// Release the native resource. Called at most once, by `close` or `finalize`.
    fn release(&self);

    /// Short name used in diagnostics, e.g. `"struct"` or `"module"`
    fn kind(&self) -> &'static str;

    /// Release the resource; calling this again is a no-op
    fn close(&mut self) {
        let this = &*self;
        if this.lifecycle().close_with(|| this.release()) {
            debug!(kind = this.kind(), "closed handle");
        }
    }

    fn is_closed(&self) -> bool {
        self.lifecycle().is_closed()
    }

    /// # Panics
    ///
    /// If the handle is closed.
    #[track_caller]
    fn check_access(&self) {
        self.lifecycle().check_access();
    }

    /// Safety net for handles dropped without an explicit close
    fn finalize(&mut self) {
        let this = &*self;
        if this.lifecycle().close_with(|| this.release()) {
            debug!(kind = this.kind(), "released by drop without an explicit close");
        }
    }
}
