//! Service layer: background workers and the navigation controller.

pub mod cache_service;
pub mod navigation_service;
pub mod save_service;

pub use cache_service::CacheService;
pub use navigation_service::NavigationService;
pub use save_service::{SaveJob, SaveService};

use crate::error::AppError;
use std::time::Duration;

/// How a worker loop ended. Supervisors restart `Failed` loops with backoff
/// instead of leaving the application without its worker.
pub(crate) enum WorkerExit {
    Stopped,
    Failed(AppError),
}

pub(crate) const INITIAL_RESTART_DELAY: Duration = Duration::from_millis(100);
pub(crate) const MAX_RESTART_DELAY: Duration = Duration::from_secs(5);
