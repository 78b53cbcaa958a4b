//! Background save worker for metadata edits.
//!
//! Description edits are queued as typed jobs and written one at a time, so
//! a slow metadata write never blocks navigation and two writes can never
//! interleave on the same file. After a successful write the stored value is
//! read back so the editor reflects what actually landed on disk.

use crate::display::DisplaySink;
use crate::error::{AppError, Result};
use crate::metadata::MetadataStore;
use crate::services::{WorkerExit, INITIAL_RESTART_DELAY, MAX_RESTART_DELAY};
use async_std::channel::{self, Receiver, Sender};
use async_std::task::{self, JoinHandle};
use log::{debug, error, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A queued description edit.
pub struct SaveJob {
    pub path: PathBuf,
    pub description: String,
}

enum Job {
    Save(SaveJob),
    Stop,
}

/// Handle to the metadata save worker.
pub struct SaveService {
    jobs: Sender<Job>,
    in_flight: Arc<AtomicUsize>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl SaveService {
    /// Spawns the save loop and its supervisor.
    pub fn start(metadata: Arc<dyn MetadataStore>, display: Arc<dyn DisplaySink>) -> Self {
        let (jobs, receiver) = channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let supervisor = task::spawn(supervise(receiver, metadata, display, Arc::clone(&in_flight)));

        Self {
            jobs,
            in_flight,
            supervisor: Mutex::new(Some(supervisor)),
        }
    }

    /// Queues a description write.
    pub fn request(&self, job: SaveJob) -> Result<()> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.jobs.try_send(Job::Save(job)) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Err(AppError::WorkerUnavailable("save worker"))
            }
        }
    }

    /// Resolves once every queued edit has been processed.
    pub async fn drain(&self) {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            task::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Writes out the queued edits, then stops the worker for good.
    pub async fn shutdown(&self) {
        self.drain().await;
        let _ = self.jobs.send(Job::Stop).await;
        let handle = self.supervisor.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.await;
        }
        self.jobs.close();
    }
}

async fn supervise(
    jobs: Receiver<Job>,
    metadata: Arc<dyn MetadataStore>,
    display: Arc<dyn DisplaySink>,
    in_flight: Arc<AtomicUsize>,
) {
    let mut delay = INITIAL_RESTART_DELAY;
    let mut reported = false;
    loop {
        match worker_loop(&jobs, &metadata, &display, &in_flight).await {
            WorkerExit::Stopped => break,
            WorkerExit::Failed(e) => {
                if !reported {
                    error!("Save worker failed, restarting: {}", e);
                    reported = true;
                } else {
                    warn!("Save worker failed again, restarting in {:?}: {}", delay, e);
                }
                task::sleep(delay).await;
                delay = (delay * 2).min(MAX_RESTART_DELAY);
            }
        }
    }
    debug!("Save worker stopped");
}

async fn worker_loop(
    jobs: &Receiver<Job>,
    metadata: &Arc<dyn MetadataStore>,
    display: &Arc<dyn DisplaySink>,
    in_flight: &Arc<AtomicUsize>,
) -> WorkerExit {
    loop {
        let job = match jobs.recv().await {
            Ok(Job::Save(job)) => job,
            Ok(Job::Stop) | Err(_) => return WorkerExit::Stopped,
        };

        let outcome = save_one(&job, metadata, display).await;
        in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = outcome {
            display.report_error(&format!(
                "Metadata could not be saved for {}: {}",
                job.path.display(),
                e
            ));
        }
    }
}

async fn save_one(
    job: &SaveJob,
    metadata: &Arc<dyn MetadataStore>,
    display: &Arc<dyn DisplaySink>,
) -> Result<()> {
    let store = Arc::clone(metadata);
    let path = job.path.clone();
    let text = job.description.clone();
    task::spawn_blocking(move || store.set_description(&path, &text)).await?;

    // Read back so the editor shows what was actually stored.
    let store = Arc::clone(metadata);
    let path = job.path.clone();
    let stored = task::spawn_blocking(move || store.description(&path)).await?;

    display.show_description(stored.as_deref());
    display.notify("Metadata saved");
    Ok(())
}
