//! Parallel build-file loading.
//!
//! A bounded pool of worker threads runs [`Loader`] jobs; each job
//! delivers fully-formed items and may request further files to be
//! loaded. All events funnel through one channel into the thread driving
//! the [`Builder`], so graph construction itself is single-writer and the
//! workers never touch shared graph state.
//!
//! On the first fatal error the queue is drained without starting new
//! jobs; already-running jobs finish and their output is discarded.

use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::builder::Builder;
use crate::errors::GenError;
use crate::item::Item;
use crate::paths::SourceFile;

/// Loads one build file, delivering its declarations to the sink.
///
/// Implementations run on worker threads; a referenced-but-unloaded file
/// is requested through [`ItemSink::request_load`] rather than loaded
/// inline, so one slow file never serializes the pool.
pub trait Loader: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts this producer's work and, once delivered, cancels
    /// outstanding loads.
    fn load(&self, file: &SourceFile, sink: &ItemSink) -> Result<(), GenError>;
}

enum Event {
    ItemDefined(Item),
    LoadRequested(SourceFile),
    Error(GenError),
    JobDone,
}

/// The producer side of the scheduler channel.
pub struct ItemSink {
    tx: mpsc::Sender<Event>,
}

impl ItemSink {
    /// Deliver a fully-formed item definition.
    pub fn item_defined(&self, item: Item) {
        let _ = self.tx.send(Event::ItemDefined(item));
    }

    /// Ask for another build file to be loaded by the pool. Requests for
    /// files already loaded or queued are ignored.
    pub fn request_load(&self, file: SourceFile) {
        let _ = self.tx.send(Event::LoadRequested(file));
    }

    fn error(&self, error: GenError) {
        let _ = self.tx.send(Event::Error(error));
    }

    fn job_done(&self) {
        let _ = self.tx.send(Event::JobDone);
    }
}

struct QueueState {
    jobs: VecDeque<SourceFile>,
    closed: bool,
}

/// Work queue shared by the pool. Closing it wakes idle workers so they
/// can exit.
struct JobQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl JobQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, file: SourceFile) {
        self.lock().jobs.push_back(file);
        self.ready.notify_one();
    }

    fn pop(&self) -> Option<SourceFile> {
        let mut state = self.lock();
        loop {
            if let Some(file) = state.jobs.pop_front() {
                return Some(file);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Discard pending jobs, returning how many were dropped.
    fn drain(&self) -> usize {
        let mut state = self.lock();
        let dropped = state.jobs.len();
        state.jobs.clear();
        dropped
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

/// Drives loading to quiescence and hands back the populated builder.
pub struct Scheduler {
    jobs: usize,
}

impl Scheduler {
    #[must_use]
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    /// Load `roots` (and everything they request) through the pool,
    /// feeding every delivered item to a fresh [`Builder`]. Returns the
    /// builder along with all accumulated errors; the caller runs
    /// [`Builder::check_for_bad_items`] after this quiescence barrier.
    pub fn run(&self, loader: &dyn Loader, roots: Vec<SourceFile>) -> (Builder, Vec<GenError>) {
        let (tx, rx) = mpsc::channel();
        let queue = JobQueue::new();
        let mut builder = Builder::new();
        let mut errors = Vec::new();

        thread::scope(|scope| {
            for _ in 0..self.jobs {
                let sink = ItemSink { tx: tx.clone() };
                let queue = &queue;
                scope.spawn(move || {
                    while let Some(file) = queue.pop() {
                        tracing::debug!(file = %file, "loading build file");
                        if let Err(error) = loader.load(&file, &sink) {
                            sink.error(error);
                        }
                        sink.job_done();
                    }
                });
            }
            drop(tx);

            let mut scheduled: HashSet<SourceFile> = HashSet::new();
            let mut outstanding = 0usize;
            let mut cancelled = false;
            for root in roots {
                if scheduled.insert(root.clone()) {
                    queue.push(root);
                    outstanding += 1;
                }
            }

            while outstanding > 0 {
                let Ok(event) = rx.recv() else {
                    break;
                };
                match event {
                    Event::ItemDefined(item) => {
                        if cancelled {
                            continue;
                        }
                        if let Err(error) = builder.item_defined(item) {
                            errors.push(error);
                            cancelled = true;
                            outstanding -= queue.drain();
                        }
                    }
                    Event::LoadRequested(file) => {
                        if !cancelled && scheduled.insert(file.clone()) {
                            queue.push(file);
                            outstanding += 1;
                        }
                    }
                    Event::Error(error) => {
                        errors.push(error);
                        if !cancelled {
                            cancelled = true;
                            outstanding -= queue.drain();
                        }
                    }
                    Event::JobDone => outstanding -= 1,
                }
            }
            queue.close();
        });

        (builder, errors)
    }
}
