use crate::config::SUPPORTED_IMAGE_EXTENSIONS;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Lists the supported images in `dir`, grouped by extension.
///
/// Groups follow `SUPPORTED_IMAGE_EXTENSIONS` order with each group sorted by
/// name, so every `jpg` comes before every `jpeg`, and so on. Extension
/// matching is case-insensitive.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut images = Vec::new();
    for wanted in SUPPORTED_IMAGE_EXTENSIONS {
        images.extend(
            files
                .iter()
                .filter(|path| extension_matches(path, wanted))
                .cloned(),
        );
    }
    Ok(images)
}

fn extension_matches(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

/// Whether a path carries one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    SUPPORTED_IMAGE_EXTENSIONS
        .iter()
        .any(|wanted| extension_matches(path, wanted))
}
