//! Image cache for fast navigation.
//!
//! Bounded store of decoded thumbnails keyed by file path. Recency is only
//! promoted on `add`; `get` and `has` are read-only so that navigation
//! checks do not churn the eviction order. Overflow drops the single
//! least-recently-added entry, while `evict` removes whole batches when the
//! pre-warm window moves.

use crate::image_loader::Thumbnail;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// LRU cache for storing decoded thumbnails.
pub struct ImageCache {
    /// `None` when constructed with capacity 0: every lookup misses and
    /// every insert is dropped.
    cache: Option<LruCache<PathBuf, Thumbnail>>,
}

impl ImageCache {
    /// Creates a new image cache with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Inserts or updates an entry, promoting it to most-recently-used.
    ///
    /// When the cache grows past capacity the least-recently-used entry is
    /// dropped.
    pub fn add(&mut self, path: PathBuf, thumbnail: Thumbnail) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        log::info!(
            "Cache PUT: {} ({}x{})",
            path.display(),
            thumbnail.width,
            thumbnail.height
        );
        cache.put(path, thumbnail);
    }

    /// Retrieves a thumbnail if present. Does not promote recency.
    pub fn get(&self, path: &Path) -> Option<Thumbnail> {
        let result = self.cache.as_ref().and_then(|c| c.peek(path).cloned());
        if result.is_some() {
            log::info!("Cache HIT: {}", path.display());
        } else {
            log::info!("Cache MISS: {}", path.display());
        }
        result
    }

    /// Checks whether a thumbnail is cached. Does not promote recency.
    pub fn has(&self, path: &Path) -> bool {
        self.cache.as_ref().is_some_and(|c| c.contains(path))
    }

    /// Removes every present key; absent keys are silently ignored.
    pub fn evict<'a>(&mut self, keys: impl IntoIterator<Item = &'a Path>) {
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        let mut dropped = 0usize;
        for key in keys {
            if cache.pop(key).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!("Cache evicted {} entries, {} remain", dropped, cache.len());
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumbnail(tag: u8) -> Thumbnail {
        Thumbnail {
            data: vec![tag; 4],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn add_then_get_returns_the_stored_value() {
        let mut cache = ImageCache::new(4);
        let key = PathBuf::from("/img/a.jpg");

        cache.add(key.clone(), thumbnail(7));
        assert!(cache.has(&key));
        assert_eq!(cache.get(&key).unwrap().data, vec![7; 4]);

        cache.evict([key.as_path()]);
        assert!(!cache.has(&key));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn overflow_drops_the_least_recently_added_entry() {
        let mut cache = ImageCache::new(2);
        let x = PathBuf::from("/img/x.jpg");
        let y = PathBuf::from("/img/y.jpg");
        let z = PathBuf::from("/img/z.jpg");

        cache.add(x.clone(), thumbnail(1));
        cache.add(y.clone(), thumbnail(2));
        cache.add(z.clone(), thumbnail(3));

        assert_eq!(cache.len(), 2);
        assert!(!cache.has(&x));
        assert!(cache.has(&y));
        assert!(cache.has(&z));
    }

    #[test]
    fn get_does_not_promote_recency() {
        let mut cache = ImageCache::new(2);
        let x = PathBuf::from("/img/x.jpg");
        let y = PathBuf::from("/img/y.jpg");
        let z = PathBuf::from("/img/z.jpg");

        cache.add(x.clone(), thumbnail(1));
        cache.add(y.clone(), thumbnail(2));

        // A read must not rescue `x` from eviction.
        assert!(cache.get(&x).is_some());
        cache.add(z.clone(), thumbnail(3));

        assert!(!cache.has(&x));
        assert!(cache.has(&y));
        assert!(cache.has(&z));
    }

    #[test]
    fn re_adding_promotes_to_most_recently_used() {
        let mut cache = ImageCache::new(2);
        let x = PathBuf::from("/img/x.jpg");
        let y = PathBuf::from("/img/y.jpg");
        let z = PathBuf::from("/img/z.jpg");

        cache.add(x.clone(), thumbnail(1));
        cache.add(y.clone(), thumbnail(2));
        cache.add(x.clone(), thumbnail(4));
        cache.add(z.clone(), thumbnail(3));

        assert!(cache.has(&x));
        assert!(!cache.has(&y));
        assert!(cache.has(&z));
        assert_eq!(cache.get(&x).unwrap().data, vec![4; 4]);
    }

    #[test]
    fn evict_ignores_absent_keys() {
        let mut cache = ImageCache::new(2);
        let x = PathBuf::from("/img/x.jpg");
        cache.add(x.clone(), thumbnail(1));

        let absent = PathBuf::from("/img/absent.jpg");
        cache.evict([x.as_path(), absent.as_path(), absent.as_path()]);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_capacity_cache_is_a_no_op() {
        let mut cache = ImageCache::new(0);
        let x = PathBuf::from("/img/x.jpg");

        cache.add(x.clone(), thumbnail(1));
        assert!(!cache.has(&x));
        assert!(cache.get(&x).is_none());
        assert_eq!(cache.len(), 0);

        // Eviction on the disabled cache must not panic.
        cache.evict([x.as_path()]);
    }
}
