//! Image decode worker.
//!
//! Turns an image file into a compact, display-ready JPEG thumbnail. Pure;
//! the caller decides what happens to the bytes.
//!
//! Decoding and re-encoding are blocking work and must run off the
//! scheduling threads via `spawn_blocking`.

use crate::error::{AppError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::Path;

/// A decoded, downscaled, re-encoded image.
#[derive(Clone)]
pub struct Thumbnail {
    /// JPEG-encoded pixel data.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes `path` and re-encodes it as a JPEG thumbnail.
///
/// The longest edge is scaled down to at most `max_dimension`; images that
/// already fit are left at their original size.
pub fn load_thumbnail(path: &Path, max_dimension: u32, quality: u8) -> Result<Thumbnail> {
    if !path.exists() {
        return Err(AppError::FileMissing(path.to_path_buf()));
    }

    let decode_error = |e: String| AppError::ImageDecode(format!("{}: {}", path.display(), e));

    let img = image::ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    let (orig_width, orig_height) = (img.width(), img.height());
    let (target_width, target_height) = scaled_dimensions(orig_width, orig_height, max_dimension);

    let resized = if (target_width, target_height) != (orig_width, orig_height) {
        img.resize(target_width, target_height, FilterType::Triangle)
    } else {
        img
    };

    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, quality);
    rgb.write_with_encoder(encoder)?;

    Ok(Thumbnail {
        data,
        width,
        height,
    })
}

/// Shrink-only scale preserving aspect ratio so that
/// `max(width, height) <= max_dimension`.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let scale = max_dimension as f64 / longest as f64;
    (
        ((width as f64 * scale).floor() as u32).max(1),
        ((height as f64 * scale).floor() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn scaled_dimensions_shrinks_longest_edge() {
        assert_eq!(scaled_dimensions(2000, 1000, 500), (500, 250));
        assert_eq!(scaled_dimensions(1000, 2000, 500), (250, 500));
    }

    #[test]
    fn scaled_dimensions_never_upscales() {
        assert_eq!(scaled_dimensions(100, 50, 1920), (100, 50));
        assert_eq!(scaled_dimensions(1920, 1080, 1920), (1920, 1080));
    }

    #[test]
    fn scaled_dimensions_keeps_extreme_ratios_nonzero() {
        let (w, h) = scaled_dimensions(10000, 2, 100);
        assert_eq!(w, 100);
        assert_eq!(h, 1);
    }

    #[test]
    fn load_thumbnail_downscales_and_reencodes() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(64, 48, Rgb([12, 34, 56]))
            .save(&path)
            .expect("failed to write test image");

        let thumbnail = load_thumbnail(&path, 32, 60).expect("load failed");
        assert_eq!(thumbnail.width, 32);
        assert_eq!(thumbnail.height, 24);
        assert!(!thumbnail.data.is_empty());

        // JPEG magic bytes
        assert_eq!(&thumbnail.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn load_thumbnail_leaves_small_images_alone() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("small.png");
        RgbImage::from_pixel(8, 4, Rgb([1, 2, 3]))
            .save(&path)
            .expect("failed to write test image");

        let thumbnail = load_thumbnail(&path, 1920, 60).expect("load failed");
        assert_eq!((thumbnail.width, thumbnail.height), (8, 4));
    }

    #[test]
    fn load_thumbnail_reports_missing_file() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("gone.jpg");
        match load_thumbnail(&path, 1920, 60) {
            Err(AppError::FileMissing(p)) => assert_eq!(p, path),
            other => panic!("expected FileMissing, got {:?}", other.map(|t| t.width)),
        }
    }

    #[test]
    fn load_thumbnail_reports_corrupt_file() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("corrupt.jpg");
        let mut file = std::fs::File::create(&path).expect("failed to create file");
        file.write_all(b"this is not an image")
            .expect("failed to write file");

        match load_thumbnail(&path, 1920, 60) {
            Err(AppError::ImageDecode(_)) => {}
            other => panic!("expected ImageDecode, got {:?}", other.map(|t| t.width)),
        }
    }
}
