//! Fingerprint Vault - Worker Pool
//!
//! Thinning and region isolation scale with pixel count, so request handlers
//! should not run them inline. `HashPool` bounds how many scans are processed
//! at once; `hash_with_deadline` bounds how long a caller waits.
//!
//! The pipeline has no cancellation point. A timed-out run keeps its thread
//! until it finishes and its result is dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::config::PipelineConfig;
use crate::error::{FingerprintError, FpResult};
use crate::pipeline::{FingerprintDigest, FingerprintPipeline};

/// Pending result of a submitted scan
pub type HashTicket = Receiver<FpResult<FingerprintDigest>>;

struct Job {
    image_bytes: Vec<u8>,
    reply: Sender<FpResult<FingerprintDigest>>,
}

/// Fixed set of hashing threads fed by a bounded queue
pub struct HashPool {
    queue: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl HashPool {
    /// Spawn `workers` threads; `queue_depth` scans may wait before `submit` blocks
    pub fn new(workers: usize, queue_depth: usize, config: PipelineConfig) -> FpResult<Self> {
        if workers == 0 {
            return Err(FingerprintError::InvalidConfig(
                "worker count must be >= 1".into(),
            ));
        }

        let pipeline = Arc::new(FingerprintPipeline::new(config)?);
        let (queue, jobs) = bounded::<Job>(queue_depth);

        let workers = (0..workers)
            .map(|id| {
                let jobs = jobs.clone();
                let pipeline = Arc::clone(&pipeline);
                thread::Builder::new()
                    .name(format!("fp-hash-{id}"))
                    .spawn(move || {
                        for job in jobs.iter() {
                            let result = pipeline.hash(&job.image_bytes);
                            // Receiver may have given up waiting
                            let _ = job.reply.send(result);
                        }
                    })
                    .map_err(FingerprintError::Io)
            })
            .collect::<FpResult<Vec<_>>>()?;

        log::debug!("Hash pool started with {} worker(s)", workers.len());

        Ok(Self {
            queue: Some(queue),
            workers,
        })
    }

    /// Queue a scan; blocks while the queue is full
    pub fn submit(&self, image_bytes: Vec<u8>) -> FpResult<HashTicket> {
        let (reply, ticket) = bounded(1);
        let queue = self
            .queue
            .as_ref()
            .ok_or_else(|| FingerprintError::Processing("hash pool is shut down".into()))?;

        queue
            .send(Job { image_bytes, reply })
            .map_err(|_| FingerprintError::Processing("hash pool workers are gone".into()))?;

        Ok(ticket)
    }

    /// Queue a scan and wait for its digest
    pub fn hash(&self, image_bytes: Vec<u8>) -> FpResult<FingerprintDigest> {
        let ticket = self.submit(image_bytes)?;
        ticket
            .recv()
            .map_err(|_| FingerprintError::Processing("hash worker exited".into()))?
    }

    /// Queue a scan and wait at most `timeout` for its digest
    pub fn hash_timeout(&self, image_bytes: Vec<u8>, timeout: Duration) -> FpResult<FingerprintDigest> {
        let ticket = self.submit(image_bytes)?;
        wait(&ticket, timeout)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for HashPool {
    fn drop(&mut self) {
        // Closing the queue ends each worker's loop
        self.queue.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn wait(ticket: &HashTicket, timeout: Duration) -> FpResult<FingerprintDigest> {
    match ticket.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("Fingerprint hashing exceeded {:?}, result discarded", timeout);
            Err(FingerprintError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(FingerprintError::Processing("hash worker exited".into()))
        }
    }
}

/// Run the pipeline on its own thread and race it against `timeout`
pub fn hash_with_deadline(
    image_bytes: Vec<u8>,
    config: PipelineConfig,
    timeout: Duration,
) -> FpResult<FingerprintDigest> {
    let pipeline = FingerprintPipeline::new(config)?;
    let (reply, ticket) = bounded(1);

    thread::Builder::new()
        .name("fp-hash-deadline".into())
        .spawn(move || {
            let _ = reply.send(pipeline.hash(&image_bytes));
        })?;

    wait(&ticket, timeout)
}
