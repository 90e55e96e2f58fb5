//! Concurrent request/response correlation.
//!
//! A [`CorrelationEngine`] tracks outstanding requests by [`FrameId`] and
//! resolves each exactly once, whether by a matching response, an explicit
//! rejection, a timeout, or [`CorrelationEngine::clear`] at disconnect. The
//! map is guarded by a plain (non-async) mutex: every critical section is a
//! handful of map operations with no `.await` inside the lock, so a
//! blocking mutex is strictly cheaper than an async one and cannot be held
//! across a suspension point.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sideband_proto::FrameId;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Why a pending request resolved without a normal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionFailure {
    /// The request was explicitly rejected, e.g. with an error envelope.
    Rejected(String),
    /// No response arrived before the request's timeout elapsed.
    TimedOut,
    /// The connection was cleared before a response arrived.
    Disconnected,
}

/// Errors raised by [`CorrelationEngine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// [`CorrelationEngine::register`] was called with an id already
    /// pending.
    #[error("a request is already registered under frame id {0}")]
    AlreadyRegistered(FrameId),

    /// [`CorrelationEngine::complete`] or [`CorrelationEngine::reject`] was
    /// called with an id that is not (or no longer) pending.
    #[error("no pending request registered under frame id {0}")]
    NotRegistered(FrameId),
}

struct Entry<T> {
    sender: oneshot::Sender<Result<T, CompletionFailure>>,
    timeout: JoinHandle<()>,
}

/// A handle to a request awaiting completion.
///
/// Dropping this handle without calling [`PendingHandle::wait`] simply
/// discards interest in the result; the engine still removes the entry and
/// cancels its timer when the request completes or is cleared.
pub struct PendingHandle<T> {
    receiver: oneshot::Receiver<Result<T, CompletionFailure>>,
}

impl<T> PendingHandle<T> {
    /// Wait for this request to resolve.
    ///
    /// Resolves to `Err(CompletionFailure::Disconnected)` if the engine is
    /// dropped before the request completes.
    pub async fn wait(self) -> Result<T, CompletionFailure> {
        self.receiver.await.unwrap_or(Err(CompletionFailure::Disconnected))
    }
}

/// Tracks outstanding requests and resolves each exactly once.
///
/// Cloning shares the same underlying map; every clone observes the same
/// set of pending requests.
pub struct CorrelationEngine<T> {
    inner: Arc<Mutex<HashMap<FrameId, Entry<T>>>>,
}

impl<T> Clone for CorrelationEngine<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for CorrelationEngine<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CorrelationEngine<T>
where
    T: Send + 'static,
{
    /// Build an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// How many requests are currently pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Register a new pending request under `id`, with a timeout after
    /// which it resolves to `CompletionFailure::TimedOut` if still pending.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::AlreadyRegistered`] if `id` is already
    /// pending; the caller must choose a fresh [`FrameId`] per request.
    pub fn register(&self, id: FrameId, timeout: Duration) -> Result<PendingHandle<T>, CorrelationError> {
        let (sender, receiver) = oneshot::channel();
        let mut guard = self.inner.lock();
        if guard.contains_key(&id) {
            return Err(CorrelationError::AlreadyRegistered(id));
        }

        let engine = self.clone();
        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            engine.fire_timeout(id);
        });

        guard.insert(id, Entry { sender, timeout: timeout_handle });
        debug!(%id, ?timeout, "registered pending request");
        Ok(PendingHandle { receiver })
    }

    fn fire_timeout(&self, id: FrameId) {
        let entry = self.inner.lock().remove(&id);
        if let Some(entry) = entry {
            debug!(%id, "request timed out");
            let _ = entry.sender.send(Err(CompletionFailure::TimedOut));
        }
    }

    /// Resolve the pending request `id` with a successful value.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::NotRegistered`] if `id` is not pending -
    /// typically a duplicate or unsolicited response from a peer.
    pub fn complete(&self, id: FrameId, value: T) -> Result<(), CorrelationError> {
        let entry = self.inner.lock().remove(&id);
        let Some(entry) = entry else {
            warn!(%id, "response matched no pending request");
            return Err(CorrelationError::NotRegistered(id));
        };
        entry.timeout.abort();
        debug!(%id, "request completed");
        let _ = entry.sender.send(Ok(value));
        Ok(())
    }

    /// Resolve the pending request `id` with an explicit rejection.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::NotRegistered`] if `id` is not pending.
    pub fn reject(&self, id: FrameId, reason: impl Into<String>) -> Result<(), CorrelationError> {
        let entry = self.inner.lock().remove(&id);
        let Some(entry) = entry else {
            warn!(%id, "rejection targeted no pending request");
            return Err(CorrelationError::NotRegistered(id));
        };
        entry.timeout.abort();
        let reason = reason.into();
        debug!(%id, %reason, "request rejected");
        let _ = entry.sender.send(Err(CompletionFailure::Rejected(reason)));
        Ok(())
    }

    /// Resolve every pending request with `CompletionFailure::Disconnected`
    /// and cancel their timers.
    ///
    /// Used when the connection carrying responses is torn down: no
    /// request registered before this call can ever complete normally
    /// again.
    pub fn clear(&self) {
        let entries: Vec<_> = self.inner.lock().drain().collect();
        debug!(count = entries.len(), "clearing pending requests");
        for (_, entry) in entries {
            entry.timeout.abort();
            let _ = entry.sender.send(Err(CompletionFailure::Disconnected));
        }
    }
}
