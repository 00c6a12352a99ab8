//! Bounded waits on blocking [`DataSource`](crate::DataSource) calls.
//!
//! A fetch is spawned on the tokio blocking pool and the caller waits at most
//! a fixed timeout for it. When the job is late the previously cached value is
//! kept and [`BoundedFetch::needs_redraw`] is raised so the owner can ask again
//! on its next frame. Late results are not lost: they are picked up on later
//! calls, but only applied when no newer result has been applied since.

use crate::SourceError;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

/// Slack added on both sides of a visible window so lines leaving the view
/// are drawn up to the edge.
pub const WINDOW_SLACK: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub start: f64,
    pub end: f64,
    pub resolution: u32,
}

impl FetchRequest {
    pub fn new(start: f64, end: f64, resolution: u32) -> Self {
        Self {
            start,
            end,
            resolution,
        }
    }

    /// Request for a visible `[begin, end]` window, widened by [`WINDOW_SLACK`].
    pub fn with_slack(begin: f64, end: f64, resolution: u32) -> Self {
        Self::new(begin - WINDOW_SLACK, end + WINDOW_SLACK, resolution)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    /// The requested data arrived in time and replaced the cache.
    Fresh,
    /// The wait timed out; the cache holds older data.
    Stale,
    /// The source reported an error; the cache holds older data.
    Failed(SourceError),
}

type Delivery<T> = (u64, Result<T, SourceError>);

pub struct BoundedFetch<T> {
    handle: Handle,
    timeout: Duration,
    cache: T,
    generation: u64,
    applied: u64,
    in_flight: Option<(FetchRequest, u64)>,
    needs_redraw: bool,
    sender: Sender<Delivery<T>>,
    receiver: Receiver<Delivery<T>>,
}

impl<T> BoundedFetch<T>
where
    T: Default + Send + 'static,
{
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();

        Self {
            handle,
            timeout,
            cache: T::default(),
            generation: 0,
            applied: 0,
            in_flight: None,
            needs_redraw: false,
            sender,
            receiver,
        }
    }

    pub fn cache(&self) -> &T {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Raised when the last wait timed out, cleared once the awaited
    /// request settles.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Runs `job` for `request` and waits for it up to the timeout.
    ///
    /// An identical request that is still running is awaited again instead of
    /// being spawned twice.
    pub fn fetch<F>(&mut self, request: FetchRequest, job: F) -> FetchStatus
    where
        F: FnOnce(FetchRequest) -> Result<T, SourceError> + Send + 'static,
    {
        let target = match self.in_flight {
            Some((pending, generation)) if pending == request => generation,
            _ => self.spawn(request, job),
        };

        let deadline = Instant::now() + self.timeout;

        loop {
            let delivery = match self.receiver.try_recv() {
                Ok(delivery) => delivery,
                Err(_) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.receiver.recv_timeout(remaining) {
                        Ok(delivery) => delivery,
                        Err(_) => {
                            self.needs_redraw = true;
                            return FetchStatus::Stale;
                        }
                    }
                }
            };

            let (generation, result) = delivery;
            let status = self.settle(generation, result);

            if generation == target {
                self.needs_redraw = false;
                return status;
            }
        }
    }

    /// Applies every result that arrived since the last call, without waiting.
    ///
    /// Returns `true` when the cache changed.
    pub fn harvest(&mut self) -> bool {
        let mut changed = false;

        while let Ok((generation, result)) = self.receiver.try_recv() {
            let is_pending = matches!(self.in_flight, Some((_, g)) if g == generation);
            changed |= self.settle(generation, result) == FetchStatus::Fresh;
            if is_pending {
                self.needs_redraw = false;
            }
        }

        changed
    }

    fn spawn<F>(&mut self, request: FetchRequest, job: F) -> u64
    where
        F: FnOnce(FetchRequest) -> Result<T, SourceError> + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        let sender = self.sender.clone();

        self.handle.spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| job(request)))
                .unwrap_or(Err(SourceError::Panicked));

            // the owner may be gone already
            let _ = sender.send((generation, result));
        });

        self.in_flight = Some((request, generation));
        generation
    }

    fn settle(&mut self, generation: u64, result: Result<T, SourceError>) -> FetchStatus {
        if matches!(self.in_flight, Some((_, g)) if g == generation) {
            self.in_flight = None;
        }

        match result {
            Ok(value) if generation > self.applied => {
                self.cache = value;
                self.applied = generation;
                FetchStatus::Fresh
            }
            Ok(_) => {
                log::debug!(
                    "Dropping fetch result #{generation}, #{} already applied",
                    self.applied
                );
                FetchStatus::Stale
            }
            Err(err) => {
                log::warn!("Fetch #{generation} failed: {err}");
                FetchStatus::Failed(err)
            }
        }
    }
}

impl<T> std::fmt::Debug for BoundedFetch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedFetch")
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .field("applied", &self.applied)
            .field("in_flight", &self.in_flight)
            .field("needs_redraw", &self.needs_redraw)
            .finish()
    }
}
