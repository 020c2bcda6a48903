use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::feed::{normalize, ArticleSource, FetchError, NormalizedBatch};
use crate::util::catch_task_panic;

/// What asked for a fetch. Only used for logging and status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    Startup,
    Manual,
    Retry,
    Scheduled,
}

impl fmt::Display for FetchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchTrigger::Startup => "startup",
            FetchTrigger::Manual => "manual",
            FetchTrigger::Retry => "retry",
            FetchTrigger::Scheduled => "scheduled",
        })
    }
}

/// A finished fetch, delivered to the event loop.
#[derive(Debug)]
pub struct FetchReport {
    pub trigger: FetchTrigger,
    /// Value of [`FetchCoordinator::generation`] when this fetch was admitted.
    pub generation: u64,
    pub result: Result<NormalizedBatch, FetchError>,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of [`FetchCoordinator::fetch`].
#[derive(Debug)]
pub enum FetchOutcome {
    /// Another fetch was already in flight; nothing was requested.
    Skipped,
    /// The coordinator was shut down while the request was outstanding.
    Discarded,
    Completed(Result<NormalizedBatch, FetchError>),
}

struct Inner<S> {
    source: S,
    in_flight: AtomicBool,
    closed: AtomicBool,
    generation: AtomicU64,
}

/// Single-flight gate in front of an [`ArticleSource`].
///
/// Manual refreshes, retries and scheduler ticks all go through one
/// coordinator. While a fetch is outstanding every further request is
/// ignored, so overlapping triggers collapse into one request. Cheap to clone;
/// clones share the gate.
pub struct FetchCoordinator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for FetchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Clears the in-flight flag when dropped, including on panic or abort.
struct InFlightGuard<S> {
    inner: Arc<Inner<S>>,
    generation: u64,
}

impl<S> Drop for InFlightGuard<S> {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::Release);
    }
}

impl<S: ArticleSource> FetchCoordinator<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                in_flight: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Number of fetches admitted so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stops delivering results. A request already on the wire is left to
    /// finish, but its result is dropped.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn try_begin(&self) -> Option<InFlightGuard<S>> {
        if self.is_closed() {
            return None;
        }
        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                inner: Arc::clone(&self.inner),
                generation: self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1,
            })
    }

    /// Fetches and normalises one batch, unless a fetch is already running.
    pub async fn fetch(&self, trigger: FetchTrigger) -> FetchOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(trigger = %trigger, "Fetch already in flight, ignoring");
            return FetchOutcome::Skipped;
        };
        let result = self.run(trigger).await;
        if self.is_closed() {
            tracing::debug!(trigger = %trigger, "Discarding fetch result after shutdown");
            return FetchOutcome::Discarded;
        }
        FetchOutcome::Completed(result)
    }

    /// Starts a fetch in the background and sends a [`FetchReport`] on
    /// `events` when it finishes.
    ///
    /// Returns `false` without spawning anything when a fetch is already in
    /// flight or the coordinator has been shut down. The in-flight flag is
    /// claimed before this returns, so two calls in a row never both spawn.
    /// It is released only once the report is queued on `events`, so reports
    /// arrive in the order their fetches were admitted.
    pub fn spawn_fetch<E>(&self, trigger: FetchTrigger, events: mpsc::Sender<E>) -> bool
    where
        E: From<FetchReport> + Send + 'static,
    {
        let Some(guard) = self.try_begin() else {
            tracing::debug!(trigger = %trigger, "Fetch already in flight, ignoring");
            return false;
        };

        let coordinator = self.clone();
        tokio::spawn(async move {
            let result = match catch_task_panic(coordinator.run(trigger)).await {
                Ok(result) => result,
                Err(panic_msg) => {
                    tracing::error!(task = "fetch", error = %panic_msg, "Background task panicked");
                    Err(FetchError::Task(panic_msg))
                }
            };
            let Ok(permit) = events.reserve().await else {
                tracing::debug!("Event receiver dropped, discarding fetch result");
                return;
            };
            if coordinator.is_closed() {
                tracing::debug!(trigger = %trigger, "Discarding fetch result after shutdown");
                return;
            }
            permit.send(E::from(FetchReport {
                trigger,
                generation: guard.generation,
                result,
                finished_at: Utc::now(),
            }));
            drop(guard);
        });
        true
    }

    async fn run(&self, trigger: FetchTrigger) -> Result<NormalizedBatch, FetchError> {
        tracing::info!(trigger = %trigger, "Fetching articles");
        let started = Instant::now();
        match self.inner.source.fetch_articles().await {
            Ok(records) => {
                let batch = normalize(records);
                tracing::info!(
                    articles = batch.articles.len(),
                    sources = batch.sources.len(),
                    rejected = batch.rejected,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Fetch complete"
                );
                Ok(batch)
            }
            Err(e) => {
                tracing::warn!(
                    trigger = %trigger,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Fetch failed"
                );
                Err(e)
            }
        }
    }
}
