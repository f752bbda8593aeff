//! Fetch-state controller for list screens
//!
//! A [`FetchController`] wraps a zero-argument async producer of a list and
//! tracks its request lifecycle as a [`FetchState`]: `is_loading`, the last
//! successfully fetched `data`, and the last `error`. Screens call
//! [`FetchController::start`] from their mount hook, render from
//! [`FetchController::state`] or a [`FetchController::subscribe`] receiver,
//! call [`FetchController::refetch`] on pull-to-refresh, and call
//! [`FetchController::dispose`] on teardown.
//!
//! # Lifecycle
//!
//! Each invocation publishes `is_loading: false -> true`, then a single
//! settle snapshot carrying the new `data` (success) or `error` (failure)
//! together with `is_loading: false`. A failure keeps the previous `data`.
//! Errors never reach the caller: they are logged and emitted as
//! [`Event::FetchFailed`] on the event bus, if one is attached.
//!
//! # Overlapping refetches
//!
//! A naive hook lets two overlapping fetches race, and whichever resolves
//! last overwrites `data`. Here every controller owns a fetch gate: a
//! `refetch()` issued while another fetch is in flight waits for it to
//! settle and then runs, so the producer is never invoked concurrently and
//! the most recently issued call always settles last.
//!
//! # Example
//!
//! ```no_run
//! use libaora::fetch::FetchController;
//!
//! # async fn example() {
//! let controller = FetchController::new("numbers", || async { Ok(vec![1, 2, 3]) });
//!
//! if let Some(first) = controller.start() {
//!     let state = first.await.unwrap();
//!     assert_eq!(state.data, vec![1, 2, 3]);
//! }
//!
//! let state = controller.refetch().await;
//! assert!(!state.is_loading);
//! controller.dispose();
//! # }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::service::events::{Event, EventBus};

/// Boxed async producer of a list
pub type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>>> + Send + Sync>;

/// Human-readable description of a failed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Snapshot of a controller's request lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub is_loading: bool,
    /// Replaced wholesale by every successful fetch
    pub data: Vec<T>,
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            is_loading: false,
            data: Vec::new(),
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// True once settled with nothing to show (screens render the empty state)
    pub fn is_empty_settled(&self) -> bool {
        !self.is_loading && self.data.is_empty()
    }
}

struct Inner<T> {
    label: String,
    producer: Producer<T>,
    state: watch::Sender<FetchState<T>>,
    gate: Arc<Mutex<()>>,
    started: AtomicBool,
    disposed: AtomicBool,
    events: Option<EventBus>,
}

/// Loading/data/error lifecycle for one async list fetch
///
/// Cloning yields another handle onto the same controller.
pub struct FetchController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for FetchController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for FetchController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("label", &self.inner.label)
            .field("started", &self.inner.started.load(Ordering::SeqCst))
            .field("disposed", &self.inner.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T> FetchController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Bind a controller to `producer`
    ///
    /// Nothing is fetched until [`start`](Self::start) or
    /// [`refetch`](Self::refetch) is called.
    pub fn new<F, Fut>(label: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        Self::build(label.into(), None, producer)
    }

    /// Like [`new`](Self::new), reporting progress and failures on `events`
    pub fn with_events<F, Fut>(label: impl Into<String>, events: EventBus, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        Self::build(label.into(), Some(events), producer)
    }

    fn build<F, Fut>(label: String, events: Option<EventBus>, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    {
        let producer: Producer<T> = Arc::new(move || producer().boxed());
        let (state, _) = watch::channel(FetchState::default());

        Self {
            inner: Arc::new(Inner {
                label,
                producer,
                state,
                gate: Arc::new(Mutex::new(())),
                started: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                events,
            }),
        }
    }

    /// Screen label used in logs and events
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Current snapshot
    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// Trigger the first fetch; call from the owning screen's mount hook
    ///
    /// Only the first call does anything. When no other fetch is in flight
    /// the state reads `is_loading == true` as soon as this returns. Returns
    /// the spawned fetch task, which yields the settled snapshot. Must be
    /// called within a tokio runtime.
    pub fn start(&self) -> Option<JoinHandle<FetchState<T>>> {
        if self.is_disposed() || self.inner.started.swap(true, Ordering::SeqCst) {
            return None;
        }

        let controller = self.clone();
        let handle = match Arc::clone(&self.inner.gate).try_lock_owned() {
            Ok(guard) => {
                self.mark_loading();
                tokio::spawn(async move { controller.fetch_with_gate(guard).await })
            }
            Err(_) => tokio::spawn(async move { controller.refetch().await }),
        };

        Some(handle)
    }

    /// Re-invoke the producer and return the settled snapshot
    ///
    /// Waits for any in-flight fetch of this controller first. Failures are
    /// recorded in the snapshot, never returned as an error. After
    /// [`dispose`](Self::dispose) this is a no-op.
    pub async fn refetch(&self) -> FetchState<T> {
        let guard = Arc::clone(&self.inner.gate).lock_owned().await;
        self.fetch_with_gate(guard).await
    }

    /// Stop applying results; call when the owning screen is torn down
    ///
    /// An in-flight fetch still completes, but its result is discarded and
    /// only `is_loading` is cleared.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            tracing::debug!(label = %self.inner.label, "Fetch controller disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn mark_loading(&self) {
        self.inner.state.send_if_modified(|state| {
            if state.is_loading {
                false
            } else {
                state.is_loading = true;
                true
            }
        });
    }

    /// Drop the loading flag without touching data or error
    fn settle_disposed(&self) -> FetchState<T> {
        self.inner.state.send_if_modified(|state| {
            let was_loading = state.is_loading;
            state.is_loading = false;
            was_loading
        });
        self.state()
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.inner.events {
            events.emit(event);
        }
    }

    async fn fetch_with_gate(&self, _gate: OwnedMutexGuard<()>) -> FetchState<T> {
        let label = self.inner.label.clone();
        if self.is_disposed() {
            return self.settle_disposed();
        }

        self.mark_loading();
        self.emit(Event::FetchStarted {
            label: label.clone(),
        });
        tracing::debug!(label = %label, "Fetch started");

        let result = (self.inner.producer)().await;

        if self.is_disposed() {
            tracing::debug!(label = %label, "Discarding result of disposed controller");
            return self.settle_disposed();
        }

        match result {
            Ok(data) => {
                let count = data.len();
                self.inner.state.send_modify(|state| {
                    state.data = data;
                    state.error = None;
                    state.is_loading = false;
                });
                tracing::debug!(label = %label, count, "Fetch settled");
                self.emit(Event::FetchSettled { label, count });
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(label = %label, error = %message, "Fetch failed");
                self.inner.state.send_modify(|state| {
                    state.error = Some(FetchError {
                        message: message.clone(),
                    });
                    state.is_loading = false;
                });
                self.emit(Event::FetchFailed {
                    label,
                    error: message,
                });
            }
        }

        self.state()
    }
}
