//! Background pre-warm worker for the image cache.
//!
//! A single sequential consumer pulls paths off a queue in FIFO order,
//! decodes them off the scheduler, and stores the thumbnails into the shared
//! cache. Each job carries the epoch it was planned under; replanning bumps
//! the epoch so superseded jobs are skipped when dequeued instead of being
//! decoded. The currently visible image never goes through this queue.
//!
//! Per-item failures are logged and the loop moves on. A loop-level failure
//! hands control back to the supervisor, which restarts the worker with
//! backoff.

use crate::error::{AppError, Result};
use crate::image_cache::ImageCache;
use crate::image_loader;
use crate::services::{WorkerExit, INITIAL_RESTART_DELAY, MAX_RESTART_DELAY};
use async_std::channel::{self, Receiver, Sender};
use async_std::task::{self, JoinHandle};
use log::{debug, error, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum CacheJob {
    Warm { path: PathBuf, epoch: u64 },
    Stop,
}

/// Handle to the pre-warm worker.
pub struct CacheService {
    jobs: Sender<CacheJob>,
    epoch: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl CacheService {
    /// Spawns the worker loop and its supervisor.
    pub fn start(cache: Arc<Mutex<ImageCache>>, max_dimension: u32, quality: u8) -> Self {
        let (jobs, receiver) = channel::unbounded();
        let epoch = Arc::new(AtomicU64::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let supervisor = task::spawn(supervise(
            receiver,
            cache,
            Arc::clone(&epoch),
            Arc::clone(&in_flight),
            max_dimension,
            quality,
        ));

        Self {
            jobs,
            epoch,
            in_flight,
            supervisor: Mutex::new(Some(supervisor)),
        }
    }

    /// Queues `path` for pre-warming under the current epoch.
    pub fn request(&self, path: PathBuf) -> Result<()> {
        let job = CacheJob::Warm {
            path,
            epoch: self.epoch.load(Ordering::SeqCst),
        };
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.jobs.try_send(job) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Err(AppError::WorkerUnavailable("cache worker"))
            }
        }
    }

    /// Invalidates every job queued so far. Entries already stored stay
    /// cached; eviction is the window planner's call.
    pub fn cancel_pending(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Resolves once every queued job has been taken through the loop.
    pub async fn drain(&self) {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            task::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Finishes the queued work, then stops the worker for good. Requests
    /// after this fail with `WorkerUnavailable`.
    pub async fn shutdown(&self) {
        self.drain().await;
        let _ = self.jobs.send(CacheJob::Stop).await;
        let handle = self.supervisor.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.await;
        }
        self.jobs.close();
    }
}

async fn supervise(
    jobs: Receiver<CacheJob>,
    cache: Arc<Mutex<ImageCache>>,
    epoch: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    max_dimension: u32,
    quality: u8,
) {
    let mut delay = INITIAL_RESTART_DELAY;
    let mut reported = false;
    loop {
        match worker_loop(&jobs, &cache, &epoch, &in_flight, max_dimension, quality).await {
            WorkerExit::Stopped => break,
            WorkerExit::Failed(e) => {
                if !reported {
                    error!("Cache worker failed, restarting: {}", e);
                    reported = true;
                } else {
                    warn!("Cache worker failed again, restarting in {:?}: {}", delay, e);
                }
                task::sleep(delay).await;
                delay = (delay * 2).min(MAX_RESTART_DELAY);
            }
        }
    }
    debug!("Cache worker stopped");
}

async fn worker_loop(
    jobs: &Receiver<CacheJob>,
    cache: &Arc<Mutex<ImageCache>>,
    epoch: &Arc<AtomicU64>,
    in_flight: &Arc<AtomicUsize>,
    max_dimension: u32,
    quality: u8,
) -> WorkerExit {
    loop {
        let job = match jobs.recv().await {
            Ok(job) => job,
            // Channel closed without a stop job: treat as shutdown.
            Err(_) => return WorkerExit::Stopped,
        };

        let (path, job_epoch) = match job {
            CacheJob::Stop => return WorkerExit::Stopped,
            CacheJob::Warm { path, epoch } => (path, epoch),
        };

        let outcome = warm_one(&path, job_epoch, cache, epoch, max_dimension, quality).await;
        in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = outcome {
            match e {
                fatal @ AppError::WorkerUnavailable(_) => return WorkerExit::Failed(fatal),
                other => warn!("Failed to pre-warm {}: {}", path.display(), other),
            }
        }
    }
}

async fn warm_one(
    path: &PathBuf,
    job_epoch: u64,
    cache: &Arc<Mutex<ImageCache>>,
    epoch: &Arc<AtomicU64>,
    max_dimension: u32,
    quality: u8,
) -> Result<()> {
    if job_epoch < epoch.load(Ordering::SeqCst) {
        debug!("Skipping superseded pre-warm: {}", path.display());
        return Ok(());
    }

    let already_cached = lock_cache(cache)?.has(path);
    if already_cached {
        return Ok(());
    }

    let decode_path = path.clone();
    let thumbnail = task::spawn_blocking(move || {
        image_loader::load_thumbnail(&decode_path, max_dimension, quality)
    })
    .await?;

    // Re-check after the decode so a window replanned mid-decode does not
    // insert an out-of-window entry.
    if job_epoch < epoch.load(Ordering::SeqCst) {
        return Ok(());
    }
    lock_cache(cache)?.add(path.clone(), thumbnail);
    Ok(())
}

/// A poisoned cache lock means another holder panicked; that is fatal for
/// this loop and handed to the supervisor.
fn lock_cache(cache: &Arc<Mutex<ImageCache>>) -> Result<std::sync::MutexGuard<'_, ImageCache>> {
    cache
        .lock()
        .map_err(|_| AppError::WorkerUnavailable("image cache lock"))
}
