//! Display boundary for the viewer core.
//!
//! The core pushes decoded thumbnails, descriptions, and status through this
//! trait; how they are rendered is up to the embedder. Errors from a sink
//! are reported, never retried.

use crate::error::{AppError, Result};
use crate::image_loader::Thumbnail;
use std::io::Write;

pub trait DisplaySink: Send + Sync {
    /// Presents a decoded thumbnail as the current image.
    fn show(&self, thumbnail: &Thumbnail) -> Result<()>;

    /// Presents the current image's stored description, if any.
    fn show_description(&self, description: Option<&str>);

    /// Updates the position indicator (`index` is 0-based).
    fn show_position(&self, index: usize, total: usize);

    /// Toggles the loading indicator.
    fn set_loading(&self, loading: bool);

    /// Surfaces a short status message.
    fn notify(&self, message: &str);

    /// Surfaces a user-visible error.
    fn report_error(&self, message: &str);
}

/// Terminal-backed sink used by the command-line shell.
pub struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn show(&self, thumbnail: &Thumbnail) -> Result<()> {
        writeln!(
            std::io::stdout(),
            "[image] {}x{} ({} bytes)",
            thumbnail.width,
            thumbnail.height,
            thumbnail.data.len()
        )
        .map_err(|e| AppError::DisplayFailure(e.to_string()))
    }

    fn show_description(&self, description: Option<&str>) {
        match description {
            Some(text) => println!("[description] {}", text),
            None => println!("[description] (none)"),
        }
    }

    fn show_position(&self, index: usize, total: usize) {
        println!("[position] {} / {}", index + 1, total);
    }

    fn set_loading(&self, loading: bool) {
        if loading {
            println!("[loading]");
        }
    }

    fn notify(&self, message: &str) {
        println!("[info] {}", message);
    }

    fn report_error(&self, message: &str) {
        log::error!("{}", message);
        eprintln!("[error] {}", message);
    }
}
