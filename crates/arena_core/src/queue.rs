//! Combat queue between the mover and the resolver.
//!
//! A FIFO of [`CombatPair`]s behind a mutex, a condition variable for the
//! resolver to block on, and a `pending` counter of move/detect cycles that
//! have not been picked up yet. The counter is bumped inside the queue lock
//! so a waiter that checks it under the same lock can never miss a push.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::combat::CombatPair;

/// FIFO of detected engagements awaiting resolution.
#[derive(Debug, Default)]
pub struct CombatQueue {
    pairs: Mutex<VecDeque<CombatPair>>,
    ready: Condvar,
    pending: AtomicUsize,
}

impl CombatQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CombatPair>> {
        self.pairs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one detection batch, count it as pending work and wake the
    /// resolver. An empty batch still counts as a cycle.
    pub fn push_batch<I>(&self, batch: I)
    where
        I: IntoIterator<Item = CombatPair>,
    {
        {
            let mut pairs = self.lock();
            pairs.extend(batch);
            self.pending.fetch_add(1, Ordering::SeqCst);
        }
        self.ready.notify_one();
    }

    /// Block until pending work exists, `token` is cancelled, or `timeout`
    /// elapses.
    ///
    /// Returns `true` (and consumes one unit of pending work) if there is
    /// work to do and the token is not cancelled.
    pub fn wait_for_work(&self, timeout: Duration, token: &CancellationToken) -> bool {
        let guard = self.lock();
        let (_guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |_| {
                self.pending.load(Ordering::SeqCst) == 0 && !token.is_cancelled()
            })
            .unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return false;
        }
        self.take_pending()
    }

    fn take_pending(&self) -> bool {
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Remove and return every queued pair in FIFO order.
    pub fn drain(&self) -> Vec<CombatPair> {
        self.lock().drain(..).collect()
    }

    /// Number of queued pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no pairs are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Move/detect cycles not yet picked up by the resolver.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wake every waiter so it can observe cancellation.
    pub fn wake_all(&self) {
        let _guard = self.lock();
        self.ready.notify_all();
    }
}
