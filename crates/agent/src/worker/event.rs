//! Extendable event lifetimes.
//!
//! A lifecycle event is not finished when its handler returns: any work the
//! handler registered with [`ExtendableEvent::wait_until`] must settle first.
//! The dispatcher owns the event and awaits [`ExtendableEvent::settled`]
//! before reporting completion. Dropping an unsettled event aborts its
//! pending work, the same way a host runtime tears down a worker mid-task.

use std::future::Future;

use tokio::task::JoinSet;

/// Lifetime of one dispatched lifecycle event.
#[derive(Debug)]
pub struct ExtendableEvent {
    kind: &'static str,
    pending: JoinSet<()>,
}

impl ExtendableEvent {
    pub fn new(kind: &'static str) -> Self {
        Self { kind, pending: JoinSet::new() }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Extend the event's lifetime until `work` completes.
    ///
    /// The work starts immediately on the runtime; it is not awaited here.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.spawn(work);
    }

    /// Number of registered tasks that have not been reaped yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every registered task to finish.
    ///
    /// A panicking task is logged and does not fail the event. Returns how
    /// many tasks were awaited.
    pub async fn settled(mut self) -> usize {
        let mut settled = 0;
        while let Some(result) = self.pending.join_next().await {
            settled += 1;
            if let Err(e) = result {
                tracing::warn!(event = self.kind, error = %e, "extended work did not complete");
            }
        }
        tracing::trace!(event = self.kind, settled, "event settled");
        settled
    }
}
