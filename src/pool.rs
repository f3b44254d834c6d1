//! Bounded worker pool.
//!
//! # Overview
//!
//! [`WorkerPool`] runs units of work on a rayon thread pool while capping how
//! many unit bodies execute at once. Three pieces cooperate:
//!
//! - [`AdmissionTokens`]: a counting set of `limit` tokens. A unit is only
//!   handed to a thread once it holds a token; the token is released when the
//!   unit finishes, panicked or not.
//! - A join barrier: the count of outstanding units plus a queue of units
//!   submitted from inside running units (e.g. one per subdirectory).
//!   [`WorkerPool::join_all`] drains that queue and returns once the count
//!   reaches zero.
//! - Panic isolation: every unit body runs under `catch_unwind`. A panic is
//!   logged and counted; token and barrier accounting still complete.
//!
//! The bound applies to running units, not spawned ones: a deep tree can
//! queue far more units than `limit`, but at most `limit` run at any instant.
//! Units submitted from inside a unit never block their submitter, so a pool
//! with a single token cannot deadlock on recursive submission.
//!
//! # Example
//!
//! ```
//! use fileworker::pool::WorkerPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new("example", 2).unwrap();
//! let visited = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&visited);
//! pool.submit(move |ctx| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     for _ in 0..3 {
//!         let counter = Arc::clone(&counter);
//!         ctx.submit(move |_| {
//!             counter.fetch_add(1, Ordering::SeqCst);
//!         });
//!     }
//! });
//!
//! let stats = pool.join_all();
//! assert_eq!(visited.load(Ordering::SeqCst), 4);
//! assert_eq!(stats.completed, 4);
//! assert!(stats.peak_running <= 2);
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use thiserror::Error;

/// A unit of work. It receives a [`TaskContext`] for submitting follow-up units.
pub type Job = Box<dyn FnOnce(&TaskContext) + Send + 'static>;

/// Errors raised while setting up a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The underlying thread pool could not be created.
    #[error("failed to build worker pool '{label}': {source}")]
    Build {
        label: String,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Counting set of admission tokens.
///
/// `acquire` blocks while all tokens are held; dropping the returned
/// [`AdmissionToken`] frees one slot.
#[derive(Debug)]
pub struct AdmissionTokens {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl AdmissionTokens {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            available: Mutex::new(capacity),
            released: Condvar::new(),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    /// Take a token, waiting until one is free.
    pub fn acquire(self: &Arc<Self>) -> AdmissionToken {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;

        AdmissionToken {
            tokens: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut available = self.available.lock();
        *available += 1;
        debug_assert!(*available <= self.capacity);
        self.released.notify_one();
    }
}

/// A held admission token. Released on drop.
#[derive(Debug)]
pub struct AdmissionToken {
    tokens: Arc<AdmissionTokens>,
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        self.tokens.release();
    }
}

/// Outstanding units and units waiting for dispatch.
#[derive(Default)]
struct BarrierState {
    outstanding: usize,
    pending: VecDeque<Job>,
}

/// Join barrier with an attached queue of not-yet-dispatched units.
#[derive(Default)]
struct JoinBarrier {
    state: Mutex<BarrierState>,
    changed: Condvar,
}

impl JoinBarrier {
    fn add(&self) {
        self.state.lock().outstanding += 1;
    }

    fn enqueue(&self, job: Job) {
        let mut state = self.state.lock();
        state.outstanding += 1;
        state.pending.push_back(job);
        self.changed.notify_all();
    }

    fn done(&self) {
        let mut state = self.state.lock();
        state.outstanding -= 1;
        self.changed.notify_all();
    }

    /// Next pending unit, or `None` once nothing is outstanding.
    fn next_pending(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.pending.pop_front() {
                return Some(job);
            }
            if state.outstanding == 0 {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }
}

/// Counters describing what a pool ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Configured concurrency limit
    pub limit: usize,
    /// Units submitted, from outside or inside the pool
    pub submitted: usize,
    /// Units whose body returned or panicked
    pub completed: usize,
    /// Units whose body panicked
    pub panicked: usize,
    /// Most unit bodies observed running at the same time
    pub peak_running: usize,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl Counters {
    fn enter(&self) -> RunningGuard<'_> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
        RunningGuard { counters: self }
    }
}

struct RunningGuard<'a> {
    counters: &'a Counters,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.counters.running.fetch_sub(1, Ordering::SeqCst);
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
    }
}

struct Shared {
    label: String,
    tokens: Arc<AdmissionTokens>,
    barrier: JoinBarrier,
    counters: Counters,
}

/// Marks a unit finished on the join barrier when dropped.
struct BarrierGuard<'a> {
    barrier: &'a JoinBarrier,
}

impl Drop for BarrierGuard<'_> {
    fn drop(&mut self) {
        self.barrier.done();
    }
}

/// Handle given to a running unit.
pub struct TaskContext {
    shared: Arc<Shared>,
}

impl TaskContext {
    /// Queue a follow-up unit on the same pool.
    ///
    /// Never blocks: the unit waits in the pool's queue until `join_all`
    /// dispatches it under a free token.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce(&TaskContext) + Send + 'static,
    {
        self.shared.counters.submitted.fetch_add(1, Ordering::SeqCst);
        self.shared.barrier.enqueue(Box::new(job));
    }

    /// Label of the pool this unit runs on.
    #[must_use]
    pub fn pool_label(&self) -> &str {
        &self.shared.label
    }
}

/// Pool that caps concurrently running units at a fixed limit.
pub struct WorkerPool {
    shared: Arc<Shared>,
    executor: rayon::ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("label", &self.shared.label)
            .field("limit", &self.shared.tokens.capacity())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool that runs at most `limit` units at once.
    ///
    /// A `limit` of zero is raised to one.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the worker threads cannot be started.
    pub fn new(label: &str, limit: usize) -> Result<Self, PoolError> {
        let limit = limit.max(1);
        let thread_label = label.to_string();

        let executor = rayon::ThreadPoolBuilder::new()
            .num_threads(limit)
            .thread_name(move |i| format!("{thread_label}-{i}"))
            .build()
            .map_err(|source| PoolError::Build {
                label: label.to_string(),
                source,
            })?;

        log::debug!("Worker pool '{}' started with limit {}", label, limit);

        Ok(Self {
            shared: Arc::new(Shared {
                label: label.to_string(),
                tokens: Arc::new(AdmissionTokens::new(limit)),
                barrier: JoinBarrier::default(),
                counters: Counters::default(),
            }),
            executor,
        })
    }

    /// Concurrency limit of this pool.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.shared.tokens.capacity()
    }

    /// Submit a unit, blocking until a token is free, then start it.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce(&TaskContext) + Send + 'static,
    {
        self.shared.counters.submitted.fetch_add(1, Ordering::SeqCst);
        self.shared.barrier.add();
        self.dispatch(Box::new(job));
    }

    /// Block until every submitted unit, including units submitted by other
    /// units, has finished.
    pub fn join_all(&self) -> PoolStats {
        while let Some(job) = self.shared.barrier.next_pending() {
            self.dispatch(job);
        }

        let stats = self.stats();
        log::debug!(
            "Worker pool '{}' drained: {} units, {} panicked, peak {} of {}",
            self.shared.label,
            stats.completed,
            stats.panicked,
            stats.peak_running,
            stats.limit
        );
        stats
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let c = &self.shared.counters;
        PoolStats {
            limit: self.limit(),
            submitted: c.submitted.load(Ordering::SeqCst),
            completed: c.completed.load(Ordering::SeqCst),
            panicked: c.panicked.load(Ordering::SeqCst),
            peak_running: c.peak_running.load(Ordering::SeqCst),
        }
    }

    fn dispatch(&self, job: Job) {
        let token = self.shared.tokens.acquire();
        let shared = Arc::clone(&self.shared);

        self.executor.spawn(move || {
            // Drop order: running count, then token, then barrier.
            let _finished = BarrierGuard {
                barrier: &shared.barrier,
            };
            let _token = token;
            let _running = shared.counters.enter();

            let ctx = TaskContext {
                shared: Arc::clone(&shared),
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job(&ctx))) {
                shared.counters.panicked.fetch_add(1, Ordering::SeqCst);
                log::error!(
                    "Task panicked in worker pool '{}': {}",
                    shared.label,
                    panic_message(payload.as_ref())
                );
            }
        });
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Units still queued or running would otherwise outlive their results.
        self.join_all();
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
