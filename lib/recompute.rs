//! Background recomputation with request coalescing.
//!
//! A [`Recomputer`] owns a single worker thread. Requests overwrite a single
//! pending slot, so a burst of parameter changes arriving while a computation
//! is in flight results in exactly one further computation, using the most
//! recent parameters. In-flight computations always run to completion.

use std::{
    sync::{ mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError },
    thread,
};
use ndarray as nd;
use crate::{
    compose::PhaseComposer,
    error::PatternResult,
    grid::Grid,
    zernike::ZernikeCache,
};

/// Output of one background computation.
#[derive(Debug)]
pub struct Rendered {
    /// Generation number of the request that produced this result.
    pub generation: u64,
    /// Phase field, or the error encountered while computing it.
    pub phase: PatternResult<nd::Array2<f64>>,
}

#[derive(Debug, Default)]
struct Queue {
    pending: Option<(u64, PhaseComposer)>,
    generation: u64,
    busy: bool,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a background worker computing phase patterns over a fixed
/// grid.
///
/// Dropping the handle stops the worker after any in-flight computation and
/// joins its thread.
#[derive(Debug)]
pub struct Recomputer {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Recomputer {
    /// Start a worker for `grid`, delivering results to `results`.
    ///
    /// The worker also exits if `results`' receiver is dropped.
    pub fn spawn(grid: Grid, results: mpsc::Sender<Rendered>) -> Self {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let worker
            = thread::spawn(move || {
                work(worker_shared, ZernikeCache::new(grid), results)
            });
        Self { shared, worker: Some(worker) }
    }

    /// Queue a computation, replacing any request that has not started yet.
    ///
    /// Returns the generation number assigned to the request.
    pub fn request(&self, composer: PhaseComposer) -> u64 {
        let mut queue = self.shared.lock();
        queue.generation += 1;
        let generation = queue.generation;
        if let Some((superseded, _)) = queue.pending.replace((generation, composer)) {
            tracing::trace!(superseded, generation, "coalesced pattern request");
        }
        drop(queue);
        self.shared.wake.notify_one();
        generation
    }

    /// Return `true` if nothing is running or waiting to run.
    pub fn is_idle(&self) -> bool {
        let queue = self.shared.lock();
        !queue.busy && queue.pending.is_none()
    }
}

impl Drop for Recomputer {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("pattern worker panicked");
            }
        }
    }
}

fn work(
    shared: Arc<Shared>,
    mut cache: ZernikeCache,
    results: mpsc::Sender<Rendered>,
) {
    loop {
        let (generation, composer) = {
            let mut queue = shared.lock();
            loop {
                if queue.shutdown { return; }
                if let Some(job) = queue.pending.take() {
                    queue.busy = true;
                    break job;
                }
                queue
                    = shared.wake.wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        tracing::debug!(generation, patterns = composer.patterns.len(), "computing phase pattern");
        let phase = composer.phase(&mut cache);
        shared.lock().busy = false;
        if results.send(Rendered { generation, phase }).is_err() {
            tracing::debug!("result receiver dropped; stopping pattern worker");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use super::*;
    use crate::pattern::{ PatternParams, PatternSet, combine_patterns };

    fn composer(charge: i32) -> PhaseComposer {
        let patterns: PatternSet = vec![PatternParams::vortex(charge)].into();
        PhaseComposer::new(patterns, Default::default())
    }

    #[test]
    fn single_request_is_computed() {
        let grid = Grid::square(32, 32).unwrap();
        let (tx, rx) = mpsc::channel();
        let worker = Recomputer::spawn(grid.clone(), tx);
        let generation = worker.request(composer(3));
        let out = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert_eq!(out.generation, generation);
        let expected = combine_patterns(&grid, &[PatternParams::vortex(3)]);
        assert_eq!(out.phase.unwrap(), expected);
    }

    fn heavy_composer() -> PhaseComposer {
        let patterns: PatternSet
            = (1..=16)
            .map(|n| PatternParams::vortex(n).with_k([0.1 * n as f64, 0.0]))
            .collect();
        PhaseComposer::new(patterns, Default::default())
    }

    #[test]
    fn bursts_are_coalesced_and_latest_wins() {
        let grid = Grid::square(1024, 1024).unwrap();
        let (tx, rx) = mpsc::channel();
        let worker = Recomputer::spawn(grid.clone(), tx);
        let first = worker.request(heavy_composer());
        // wait for the worker to take the long job off the pending slot
        while worker.shared.lock().pending.is_some() {
            thread::yield_now();
        }
        let n_requests = 20;
        let mut last = 0;
        for charge in 1..=n_requests {
            last = worker.request(composer(charge));
        }
        let mut received: Vec<Rendered> = Vec::new();
        loop {
            let out = rx.recv_timeout(Duration::from_secs(120)).unwrap();
            let done = out.generation == last;
            received.push(out);
            if done { break; }
        }
        // the in-flight job, then a single computation for the whole burst
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].generation, first);
        assert_eq!(received[1].generation, last);
        let final_phase = received.pop().unwrap().phase.unwrap();
        let expected
            = combine_patterns(&grid, &[PatternParams::vortex(n_requests)]);
        assert_eq!(final_phase, expected);
        assert!(worker.is_idle());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn drop_stops_the_worker() {
        let grid = Grid::square(8, 8).unwrap();
        let (tx, rx) = mpsc::channel();
        let worker = Recomputer::spawn(grid, tx);
        assert!(worker.is_idle());
        drop(worker);
        // sender was moved into the worker thread, which has now exited
        assert!(rx.recv().is_err());
    }
}
