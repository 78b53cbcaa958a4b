//! XMP metadata handling for image files.

use crate::error::{AppError, Result};
use std::path::Path;
use xmp_toolkit::{OpenFileOptions, XmpFile, XmpMeta};

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
const DESCRIPTION_PROPERTY: &str = "description";
const DEFAULT_LANG: &str = "x-default";

/// Boundary to whatever stores per-image descriptions.
///
/// The navigation and save paths only depend on this trait; the storage
/// mechanism behind it is interchangeable.
pub trait MetadataStore: Send + Sync {
    /// Reads the stored description. `Ok(None)` when the file has none.
    fn description(&self, path: &Path) -> Result<Option<String>>;

    /// Writes (or replaces) the stored description.
    fn set_description(&self, path: &Path, description: &str) -> Result<()>;
}

/// Reads and writes `dc:description` through the file's XMP packet.
///
/// Only the default-language text is handled; language alternatives are left
/// untouched.
pub struct XmpMetadataStore;

/// Converts a path to a string, returning an error if the path is not valid UTF-8.
fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| AppError::MetadataRead("Invalid UTF-8 in file path".to_string()))
}

/// Opens an XMP file for reading.
fn open_xmp_for_read(path: &Path) -> Result<XmpFile> {
    let mut xmp_file = XmpFile::new()
        .map_err(|e| AppError::MetadataRead(format!("Failed to create XmpFile: {}", e)))?;

    xmp_file
        .open_file(
            path_to_str(path)?,
            OpenFileOptions::default().only_xmp().for_read(),
        )
        .map_err(|e| AppError::MetadataRead(format!("Failed to open file: {}", e)))?;

    Ok(xmp_file)
}

/// Opens an XMP file for update.
fn open_xmp_for_update(path: &Path) -> Result<XmpFile> {
    let mut xmp_file = XmpFile::new()
        .map_err(|e| AppError::MetadataWrite(format!("Failed to create XmpFile: {}", e)))?;

    xmp_file
        .open_file(
            path_to_str(path).map_err(|e| match e {
                AppError::MetadataRead(msg) => AppError::MetadataWrite(msg),
                other => other,
            })?,
            OpenFileOptions::default().only_xmp().for_update(),
        )
        .map_err(|e| AppError::MetadataWrite(format!("Failed to open file for update: {}", e)))?;

    Ok(xmp_file)
}

/// Gets or creates XMP metadata from an XMP file.
fn get_or_create_xmp_meta(xmp_file: &mut XmpFile) -> Result<XmpMeta> {
    match xmp_file.xmp() {
        Some(xmp) => Ok(xmp),
        None => XmpMeta::new()
            .map_err(|e| AppError::MetadataWrite(format!("Failed to create new XMP: {}", e))),
    }
}

impl MetadataStore for XmpMetadataStore {
    fn description(&self, path: &Path) -> Result<Option<String>> {
        let mut xmp_file = open_xmp_for_read(path)?;
        let description = xmp_file.xmp().and_then(|meta| {
            meta.localized_text(DC_NAMESPACE, DESCRIPTION_PROPERTY, None, DEFAULT_LANG)
                .map(|(value, _lang)| value.value)
        });
        xmp_file.close();
        Ok(description)
    }

    fn set_description(&self, path: &Path, description: &str) -> Result<()> {
        let mut xmp_file = open_xmp_for_update(path)?;
        let mut xmp_meta = get_or_create_xmp_meta(&mut xmp_file)?;

        xmp_meta
            .set_localized_text(
                DC_NAMESPACE,
                DESCRIPTION_PROPERTY,
                None,
                DEFAULT_LANG,
                description,
            )
            .map_err(|e| AppError::MetadataWrite(format!("Failed to set description: {}", e)))?;

        xmp_file
            .put_xmp(&xmp_meta)
            .map_err(|e| AppError::MetadataWrite(format!("Failed to put XMP: {}", e)))?;
        xmp_file.close();

        Ok(())
    }
}
