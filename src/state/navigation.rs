//! Navigation state for the ordered image list and current position.

use crate::error::{AppError, Result};
use crate::file_utils;
use log::debug;
use std::path::{Path, PathBuf};

/// The current folder, its image listing, and the cursor position.
///
/// The listing is computed once per `open_at` and stays fixed for the
/// session; it is not refreshed as files change on disk.
#[derive(Default)]
pub struct NavigationState {
    folder: Option<PathBuf>,
    images: Vec<PathBuf>,
    current_index: usize,
}

impl NavigationState {
    /// Creates a new empty navigation state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the parent folder of `path` and positions the cursor on it.
    ///
    /// Falls back to index 0 when `path` itself is not part of the listing.
    pub fn open_at(&mut self, path: &Path) -> Result<()> {
        let folder = path.parent().ok_or_else(|| {
            AppError::DirectoryScan(format!("{} has no parent directory", path.display()))
        })?;

        let images = file_utils::scan_directory(folder)?;
        if images.is_empty() {
            return Err(AppError::NoImages);
        }

        let index = images.iter().position(|p| p == path).unwrap_or(0);
        debug!(
            "Opened {} ({} images, index {})",
            folder.display(),
            images.len(),
            index
        );

        self.folder = Some(folder.to_path_buf());
        self.images = images;
        self.current_index = index;
        Ok(())
    }

    /// Index the cursor would land on after `direction` steps, wrapping at
    /// both ends. Does not move the cursor.
    pub fn peek_step(&self, direction: isize) -> Result<usize> {
        if self.images.is_empty() {
            return Err(AppError::NoImages);
        }
        let total = self.images.len() as isize;
        Ok((self.current_index as isize + direction).rem_euclid(total) as usize)
    }

    /// Moves the cursor to a previously peeked index.
    pub fn commit_index(&mut self, index: usize) {
        if index < self.images.len() {
            self.current_index = index;
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    /// Path under the cursor, if a folder is open.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.images.get(self.current_index).cloned()
    }

    pub fn path_at(&self, index: usize) -> Option<&Path> {
        self.images.get(index).map(PathBuf::as_path)
    }

    /// The fixed per-session listing.
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn folder_with(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempdir().expect("failed to create temp dir");
        let paths: Vec<PathBuf> = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                File::create(&path).expect("failed to create test file");
                path
            })
            .collect();
        (dir, paths)
    }

    #[test]
    fn open_positions_the_cursor_on_the_selected_file() {
        let (_dir, paths) = folder_with(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut nav = NavigationState::new();

        nav.open_at(&paths[1]).expect("open failed");
        assert_eq!(nav.current_index(), 1);
        assert_eq!(nav.total(), 3);
        assert_eq!(nav.current_path(), Some(paths[1].clone()));
        assert_eq!(nav.folder(), paths[1].parent());
    }

    #[test]
    fn open_fails_on_a_folder_without_images() {
        let (dir, _) = folder_with(&["notes.txt"]);
        let mut nav = NavigationState::new();
        match nav.open_at(&dir.path().join("notes.txt")) {
            Err(AppError::NoImages) => {}
            other => panic!("expected NoImages, got {:?}", other),
        }
    }

    #[test]
    fn stepping_wraps_in_both_directions() {
        let (_dir, paths) = folder_with(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut nav = NavigationState::new();
        nav.open_at(&paths[1]).expect("open failed");

        let next = nav.peek_step(1).unwrap();
        nav.commit_index(next);
        assert_eq!(nav.current_index(), 2);

        let next = nav.peek_step(1).unwrap();
        nav.commit_index(next);
        assert_eq!(nav.current_index(), 0);

        let prev = nav.peek_step(-1).unwrap();
        nav.commit_index(prev);
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn forward_then_back_returns_to_the_start_everywhere() {
        let (_dir, paths) = folder_with(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        let mut nav = NavigationState::new();

        for start in 0..4 {
            nav.open_at(&paths[start]).expect("open failed");
            let forward = nav.peek_step(1).unwrap();
            nav.commit_index(forward);
            let back = nav.peek_step(-1).unwrap();
            nav.commit_index(back);
            assert_eq!(nav.current_index(), start);
        }
    }

    #[test]
    fn stepping_an_empty_state_fails() {
        let nav = NavigationState::new();
        assert!(matches!(nav.peek_step(1), Err(AppError::NoImages)));
        assert_eq!(nav.current_path(), None);
    }
}
