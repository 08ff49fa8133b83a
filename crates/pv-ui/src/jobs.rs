//! Background validation
//!
//! A fixed pool of worker threads takes files from a job channel. Validations
//! share nothing, so results simply come back over a second channel in
//! completion order.

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use pv_pkg::{PkgValidator, ValidationResult};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifies one submission; a re-added file gets a new id
pub type JobId = u64;

/// Worker count when the available parallelism cannot be queried
const FALLBACK_WORKERS: usize = 4;

struct Job {
    id: JobId,
    path: PathBuf,
}

/// Finished validation
#[derive(Debug, Clone)]
pub struct JobResult {
    pub id: JobId,
    pub path: PathBuf,
    pub result: ValidationResult,
}

impl Job {
    fn run(self) -> JobResult {
        let result = PkgValidator::new(&self.path).validate();
        JobResult {
            id: self.id,
            path: self.path,
            result,
        }
    }
}

/// Worker pool for validations
pub struct ValidationJobs {
    job_tx: Sender<Job>,
    done_tx: Sender<JobResult>,
    done_rx: Receiver<JobResult>,
    workers: usize,
    in_flight: usize,
}

impl ValidationJobs {
    /// Start one worker per available CPU
    pub fn new() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_WORKERS);
        Self::with_workers(workers)
    }

    /// Start a pool of `workers` threads
    ///
    /// Workers exit once the pool is dropped and the job queue is drained.
    pub fn with_workers(workers: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (done_tx, done_rx) = unbounded();

        let mut started = 0;
        for index in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("pkg-validate-{}", index))
                .spawn(move || {
                    for job in job_rx.iter() {
                        // The receiver only goes away when the UI shuts down
                        let _ = done_tx.send(job.run());
                    }
                });
            match spawned {
                Ok(_) => started += 1,
                Err(e) => warn!("Failed to spawn validation worker {}: {}", index, e),
            }
        }
        debug!("Started {} validation worker(s)", started);

        Self {
            job_tx,
            done_tx,
            done_rx,
            workers: started,
            in_flight: 0,
        }
    }

    /// Number of running worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue `path` for validation under `id`
    pub fn submit(&mut self, id: JobId, path: PathBuf) {
        let job = Job { id, path };
        if self.workers == 0 {
            warn!("No validation workers, validating {} inline", job.path.display());
            let _ = self.done_tx.send(job.run());
        } else if let Err(e) = self.job_tx.send(job) {
            // Workers hold the receiving side for the lifetime of the pool
            let job = e.into_inner();
            let _ = self.done_tx.send(job.run());
        }
        self.in_flight += 1;
    }

    /// Collect every finished validation without blocking
    pub fn poll(&mut self) -> Vec<JobResult> {
        let done: Vec<JobResult> = self.done_rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Wait up to `timeout` for the next finished validation
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<JobResult> {
        match self.done_rx.recv_timeout(timeout) {
            Ok(done) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(done)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Validations submitted but not yet collected
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Default for ValidationJobs {
    fn default() -> Self {
        Self::new()
    }
}
