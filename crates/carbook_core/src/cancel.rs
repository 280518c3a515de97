//! Caller-supplied cancellation and deadline signal.
//!
//! # Responsibility
//! - Let callers abort an in-flight store operation.
//! - Interrupt running SQLite statements through the progress handler.
//!
//! # Invariants
//! - Once fired, a signal stays fired.
//! - The progress handler is removed when the operation guard drops.

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// VM instructions between two progress handler calls.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

/// Cloneable cancellation handle with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

/// Operation was cancelled or ran past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl CancelSignal {
    /// Signal without a deadline; fires only through `cancel()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that also fires once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Installs an interrupting progress handler on `conn` until the guard drops.
    pub(crate) fn attach<'conn>(&self, conn: &'conn Connection) -> InterruptGuard<'conn> {
        let signal = self.clone();
        conn.progress_handler(
            PROGRESS_HANDLER_OPS,
            Some(move || signal.is_cancelled()),
        );
        InterruptGuard { conn }
    }
}

pub(crate) struct InterruptGuard<'conn> {
    conn: &'conn Connection,
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}
