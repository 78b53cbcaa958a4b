mod config;
mod display;
mod error;
mod file_utils;
mod image_cache;
mod image_loader;
mod metadata;
mod services;
mod state;

use crate::config::Config;
use crate::display::{ConsoleDisplay, DisplaySink};
use crate::image_cache::ImageCache;
use crate::metadata::{MetadataStore, XmpMetadataStore};
use crate::services::{CacheService, NavigationService, SaveJob, SaveService};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[async_std::main]
async fn main() {
    env_logger::init();

    let config = Config::load();
    if config.cache_capacity > 0 && config.cache_capacity < 2 * config.window_radius + 1 {
        log::warn!(
            "Cache capacity {} is smaller than the pre-warm window ({}); pre-warmed entries will thrash",
            config.cache_capacity,
            2 * config.window_radius + 1
        );
    }

    let cache = Arc::new(Mutex::new(ImageCache::new(config.cache_capacity)));
    let display: Arc<dyn DisplaySink> = Arc::new(ConsoleDisplay);
    let metadata: Arc<dyn MetadataStore> = Arc::new(XmpMetadataStore);
    let cache_service = Arc::new(CacheService::start(
        Arc::clone(&cache),
        config.max_dimension,
        config.jpeg_quality,
    ));
    let save_service = SaveService::start(Arc::clone(&metadata), Arc::clone(&display));
    let navigation = NavigationService::new(
        cache,
        Arc::clone(&cache_service),
        metadata,
        Arc::clone(&display),
        &config,
    );

    match startup_image_from_args() {
        Some(path) => {
            if navigation.open(&path).await.is_ok() {
                if let Some(folder) = navigation.current_folder().await {
                    display.notify(&format!("Browsing {}", folder.display()));
                }
            }
        }
        None => {
            display.notify("Usage: metaview <image>");
            display.notify("Commands: o <path>, n(ext), p(rev), d <description>, q(uit)");
        }
    }

    run_command_loop(&navigation, &save_service, display.as_ref()).await;

    // Let the in-flight load and queued edits finish before exiting.
    navigation.settle().await;
    save_service.shutdown().await;
    cache_service.shutdown().await;
}

/// First supported image path on the command line, if any.
fn startup_image_from_args() -> Option<PathBuf> {
    std::env::args_os()
        .skip(1)
        .map(PathBuf::from)
        .find(|path| file_utils::is_supported_image(path))
}

async fn run_command_loop(
    navigation: &NavigationService,
    save_service: &SaveService,
    display: &dyn DisplaySink,
) {
    let stdin = async_std::io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        match stdin.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        }

        let input = line.trim();
        let outcome = match input {
            "" => Ok(()),
            "q" | "quit" => break,
            "n" | "next" => navigation.next().await,
            "p" | "prev" => navigation.previous().await,
            other => {
                if let Some(text) = other
                    .strip_prefix("d ")
                    .or_else(|| other.strip_prefix("describe "))
                {
                    queue_save(navigation, save_service, display, text).await
                } else if let Some(path) = other
                    .strip_prefix("o ")
                    .or_else(|| other.strip_prefix("open "))
                {
                    navigation.open(Path::new(path.trim())).await
                } else {
                    display.notify("Commands: o <path>, n(ext), p(rev), d <description>, q(uit)");
                    Ok(())
                }
            }
        };

        // Failures were already surfaced through the display sink.
        if let Err(e) = outcome {
            log::debug!("Command '{}' failed: {}", input, e);
        }
    }
}

async fn queue_save(
    navigation: &NavigationService,
    save_service: &SaveService,
    display: &dyn DisplaySink,
    text: &str,
) -> crate::error::Result<()> {
    let Some(path) = navigation.current_path().await else {
        display.report_error("No image is open");
        return Err(crate::error::AppError::NoImages);
    };
    let result = save_service.request(SaveJob {
        path,
        description: text.to_string(),
    });
    if let Err(e) = &result {
        display.report_error(&e.to_string());
    }
    result
}
