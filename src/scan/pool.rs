//! Shared work-distribution substrate for both scan strategies: a bounded
//! seed queue, an unbounded overflow queue for jobs discovered mid-scan,
//! and a fixed pool of workers that drain both.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const IDLE_POLL: Duration = Duration::from_millis(100);

/// A self-feeding job queue. Seed jobs arrive once through the [`Seeder`];
/// workers push follow-up jobs (redirect targets, harvested links, backup
/// variants) through [`JobPool::discover`] while the scan is running.
///
/// Termination is tracked with an in-flight counter: every enqueue
/// increments it, every finished probe decrements it. Workers exit only
/// when seeding is done and the counter has reached zero, so a worker can
/// never bail out while a sibling is still about to produce new work.
pub struct JobPool<J> {
    seed_rx: Mutex<mpsc::Receiver<J>>,
    overflow_tx: mpsc::UnboundedSender<J>,
    overflow_rx: Mutex<mpsc::UnboundedReceiver<J>>,
    in_flight: AtomicUsize,
    loaded: AtomicBool,
}

/// Producer half handed to the scan driver; pushing awaits seed-queue
/// capacity so a huge wordlist is never fully materialized in memory.
pub struct Seeder<J> {
    tx: mpsc::Sender<J>,
    pool: Arc<JobPool<J>>,
}

impl<J: Send + 'static> JobPool<J> {
    pub fn new(seed_capacity: usize) -> (Arc<Self>, Seeder<J>) {
        let (seed_tx, seed_rx) = mpsc::channel(seed_capacity.max(1));
        let (overflow_tx, overflow_rx) = mpsc::unbounded_channel();
        let pool = Arc::new(Self {
            seed_rx: Mutex::new(seed_rx),
            overflow_tx,
            overflow_rx: Mutex::new(overflow_rx),
            in_flight: AtomicUsize::new(0),
            loaded: AtomicBool::new(false),
        });
        let seeder = Seeder {
            tx: seed_tx,
            pool: Arc::clone(&pool),
        };
        (pool, seeder)
    }

    /// Queue a job discovered mid-scan. Never blocks the producing worker.
    pub fn discover(&self, job: J) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.overflow_tx.send(job).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Discovered work takes priority; the seed queue is only consulted
    /// once the overflow queue is empty.
    fn take(&self) -> Option<J> {
        if let Ok(job) = self.overflow_rx.lock().try_recv() {
            return Some(job);
        }
        self.seed_rx.lock().try_recv().ok()
    }

    fn complete_one(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn drained(&self) -> bool {
        self.loaded.load(Ordering::SeqCst) && self.in_flight.load(Ordering::SeqCst) == 0
    }

    /// Start the fixed worker pool. Returns immediately; workers run until
    /// the queues are drained and seeding has been marked complete.
    pub fn spawn_workers<F, Fut>(self: Arc<Self>, parallelism: usize, handler: F) -> Vec<JoinHandle<()>>
    where
        F: Fn(J) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        (0..parallelism.max(1))
            .map(|_| {
                let pool = Arc::clone(&self);
                let handler = handler.clone();
                tokio::spawn(async move {
                    loop {
                        match pool.take() {
                            Some(job) => {
                                handler(job).await;
                                pool.complete_one();
                            }
                            None if pool.drained() => break,
                            None => tokio::time::sleep(IDLE_POLL).await,
                        }
                    }
                })
            })
            .collect()
    }
}

impl<J: Send + 'static> Seeder<J> {
    pub async fn push(&self, job: J) {
        self.pool.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).await.is_err() {
            self.pool.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Mark the seed phase complete. Workers may exit once every queued
    /// job (and everything those jobs go on to discover) has finished.
    pub fn finish(self) {
        self.pool.loaded.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_seed_terminates() {
        let (pool, seeder) = JobPool::<u32>::new(4);
        let workers = pool.spawn_workers(4, |_| async {});
        seeder.finish();
        futures::future::join_all(workers).await;
    }

    #[tokio::test]
    async fn every_seed_job_is_handled_once() {
        let (pool, seeder) = JobPool::new(2);
        let handled = Arc::new(AtomicUsize::new(0));
        let workers = Arc::clone(&pool).spawn_workers(3, {
            let handled = Arc::clone(&handled);
            move |_: u32| {
                let handled = Arc::clone(&handled);
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        for n in 0..50 {
            seeder.push(n).await;
        }
        seeder.finish();
        futures::future::join_all(workers).await;
        assert_eq!(handled.load(Ordering::SeqCst), 50);
    }

    // A worker that keeps discovering new jobs must hold the pool open
    // until the whole tree of follow-up work has been probed.
    #[tokio::test]
    async fn self_feeding_jobs_run_to_completion() {
        let (pool, seeder) = JobPool::new(2);
        let handled = Arc::new(AtomicUsize::new(0));
        let workers = Arc::clone(&pool).spawn_workers(4, {
            let handled = Arc::clone(&handled);
            let pool = Arc::clone(&pool);
            move |depth: u32| {
                let handled = Arc::clone(&handled);
                let pool = Arc::clone(&pool);
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    if depth > 0 {
                        pool.discover(depth - 1);
                        pool.discover(depth - 1);
                    }
                }
            }
        });
        seeder.push(5).await;
        seeder.finish();
        futures::future::join_all(workers).await;
        // full binary tree of depth 5: 2^6 - 1 jobs
        assert_eq!(handled.load(Ordering::SeqCst), 63);
    }
}
