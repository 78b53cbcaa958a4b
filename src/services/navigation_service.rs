//! Navigation controller.
//!
//! Serializes every open/next/previous behind one async mutex, cancels the
//! superseded load task before a new one starts, and keeps the pre-warm
//! window in step with the cursor after each move.

use crate::config::Config;
use crate::display::DisplaySink;
use crate::error::{AppError, Result};
use crate::image_cache::ImageCache;
use crate::image_loader::{self, Thumbnail};
use crate::metadata::MetadataStore;
use crate::services::CacheService;
use crate::state::{CacheWindow, NavigationState};
use async_std::sync::Mutex as AsyncMutex;
use async_std::task::{self, JoinHandle};
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// State owned by the serialization lock: the cursor, the planned window,
/// and the handle of the in-flight load.
struct NavInner {
    nav: NavigationState,
    window: CacheWindow,
    active_load: Option<JoinHandle<()>>,
}

/// Coordinates navigation, the current-image load, and cache pre-warming.
///
/// Concurrent calls queue behind the internal mutex; they never interleave.
pub struct NavigationService {
    inner: AsyncMutex<NavInner>,
    cache: Arc<Mutex<ImageCache>>,
    cache_service: Arc<CacheService>,
    metadata: Arc<dyn MetadataStore>,
    display: Arc<dyn DisplaySink>,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl NavigationService {
    pub fn new(
        cache: Arc<Mutex<ImageCache>>,
        cache_service: Arc<CacheService>,
        metadata: Arc<dyn MetadataStore>,
        display: Arc<dyn DisplaySink>,
        config: &Config,
    ) -> Self {
        Self {
            inner: AsyncMutex::new(NavInner {
                nav: NavigationState::new(),
                window: CacheWindow::new(config.window_radius, config.replan_threshold),
                active_load: None,
            }),
            cache,
            cache_service,
            metadata,
            display,
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Opens `path`, scanning its folder for the navigation list.
    pub async fn open(&self, path: &Path) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.cancel_active_load(&mut inner).await;

        self.display.set_loading(true);

        if !file_exists(path).await {
            self.display.set_loading(false);
            return Err(self.report(AppError::FileMissing(path.to_path_buf())));
        }

        if let Err(e) = inner.nav.open_at(path) {
            self.display.set_loading(false);
            return Err(self.report(e));
        }

        inner.window.reset();
        self.start_load(&mut inner);
        self.replan(&mut inner);
        Ok(())
    }

    /// Steps to the next image, wrapping at the end of the folder.
    pub async fn next(&self) -> Result<()> {
        self.navigate(1).await
    }

    /// Steps to the previous image, wrapping at the start of the folder.
    pub async fn previous(&self) -> Result<()> {
        self.navigate(-1).await
    }

    async fn navigate(&self, direction: isize) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.cancel_active_load(&mut inner).await;

        let candidate = match inner.nav.peek_step(direction) {
            Ok(index) => index,
            Err(e) => return Err(self.report(e)),
        };
        let path = inner
            .nav
            .path_at(candidate)
            .map(Path::to_path_buf)
            .ok_or(AppError::NoImages)?;

        self.display.set_loading(true);

        if !file_exists(&path).await {
            // The file went away under us; the cursor stays where it was.
            self.display.set_loading(false);
            return Err(self.report(AppError::FileMissing(path)));
        }

        inner.nav.commit_index(candidate);
        self.start_load(&mut inner);
        self.replan(&mut inner);
        Ok(())
    }

    /// Path under the cursor, if a folder is open.
    pub async fn current_path(&self) -> Option<PathBuf> {
        self.inner.lock().await.nav.current_path()
    }

    /// Folder of the current session, if one is open.
    pub async fn current_folder(&self) -> Option<PathBuf> {
        self.inner.lock().await.nav.folder().map(Path::to_path_buf)
    }

    /// Waits for the in-flight load, if any, to finish.
    pub async fn settle(&self) {
        let handle = self.inner.lock().await.active_load.take();
        if let Some(handle) = handle {
            handle.await;
        }
    }

    /// Cancels the superseded load and waits for the cancellation to land
    /// before anything else runs, so a slow stale load can never overwrite a
    /// newer one.
    async fn cancel_active_load(&self, inner: &mut NavInner) {
        if let Some(handle) = inner.active_load.take() {
            // Resolves to None when the task was cancelled in flight; that
            // is the expected outcome, not an error.
            handle.cancel().await;
        }
    }

    /// Spawns the load task for the current image: cache hit displays
    /// immediately, a miss decodes inline and stores the result. Metadata
    /// extraction runs concurrently; the loading indicator clears only after
    /// both finish.
    fn start_load(&self, inner: &mut NavInner) {
        let Some(path) = inner.nav.current_path() else {
            return;
        };
        let index = inner.nav.current_index();
        let total = inner.nav.total();
        let cache = Arc::clone(&self.cache);
        let metadata = Arc::clone(&self.metadata);
        let display = Arc::clone(&self.display);
        let max_dimension = self.max_dimension;
        let quality = self.jpeg_quality;

        inner.active_load = Some(task::spawn(async move {
            display.show_position(index, total);

            let meta_task = {
                let metadata = Arc::clone(&metadata);
                let path = path.clone();
                task::spawn_blocking(move || metadata.description(&path))
            };

            let cached = cache.lock().unwrap().get(&path);
            match cached {
                Some(thumbnail) => show_thumbnail(display.as_ref(), &thumbnail),
                None => {
                    let decode_path = path.clone();
                    let decoded = task::spawn_blocking(move || {
                        image_loader::load_thumbnail(&decode_path, max_dimension, quality)
                    })
                    .await;
                    match decoded {
                        Ok(thumbnail) => {
                            cache.lock().unwrap().add(path.clone(), thumbnail.clone());
                            show_thumbnail(display.as_ref(), &thumbnail);
                        }
                        Err(e) => {
                            // The cursor has already advanced; the user sees
                            // the error in place of the image.
                            display.report_error(&format!(
                                "Could not load {}: {}",
                                path.display(),
                                e
                            ));
                        }
                    }
                }
            }

            match meta_task.await {
                Ok(description) => display.show_description(description.as_deref()),
                Err(e) => display.report_error(&format!("Unable to extract metadata: {}", e)),
            }

            display.set_loading(false);
        }));
    }

    /// Recomputes the pre-warm window when the cursor moved far enough,
    /// evicts entries that fell outside it, invalidates queued pre-warms,
    /// and enqueues the missing members nearest-first.
    fn replan(&self, inner: &mut NavInner) {
        let total = inner.nav.total();
        if total == 0 {
            return;
        }
        let current = inner.nav.current_index();
        if !inner.window.should_replan(current) {
            return;
        }

        let window = inner.window.replan(current, total);
        debug!(
            "Replanned cache window around {} ({} of {} resident)",
            current,
            window.len(),
            total
        );

        {
            let mut cache = self.cache.lock().unwrap();
            let stale = inner
                .nav
                .images()
                .iter()
                .enumerate()
                .filter(|(i, _)| !window.contains(i))
                .map(|(_, p)| p.as_path());
            cache.evict(stale);
        }

        // Everything queued before this point belongs to the old window.
        self.cache_service.cancel_pending();

        for index in ordered_by_distance(current, total, &window) {
            if index == current {
                continue;
            }
            let Some(path) = inner.nav.path_at(index) else {
                continue;
            };
            if self.cache.lock().unwrap().has(path) {
                continue;
            }
            if let Err(e) = self.cache_service.request(path.to_path_buf()) {
                warn!("Could not queue pre-warm for {}: {}", path.display(), e);
                self.report(e);
                break;
            }
        }
    }

    /// Routes an error to the user and hands it back to the caller.
    fn report(&self, err: AppError) -> AppError {
        self.display.report_error(&err.to_string());
        err
    }
}

fn show_thumbnail(display: &dyn DisplaySink, thumbnail: &Thumbnail) {
    if let Err(e) = display.show(thumbnail) {
        display.report_error(&format!("Could not display image: {}", e));
    }
}

async fn file_exists(path: &Path) -> bool {
    let path = path.to_path_buf();
    task::spawn_blocking(move || path.exists()).await
}

/// Window members sorted by wrap-aware distance from `center`.
fn ordered_by_distance(center: usize, total: usize, window: &HashSet<usize>) -> Vec<usize> {
    let mut indices: Vec<usize> = window.iter().copied().collect();
    indices.sort_by_key(|&i| {
        let d = center.abs_diff(i);
        d.min(total - d)
    });
    indices
}
