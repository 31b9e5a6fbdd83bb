//! Decoded image cache shared between a loader and its clones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;

/// Decoded originals keyed by the exact reference string.
///
/// Entries live as long as the cache; nothing is evicted. Clones share the
/// same storage, so one cache can be handed to several loaders. Concurrent
/// loads of one reference are not deduplicated and the last insert wins.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: Arc<Mutex<HashMap<String, Arc<RgbaImage>>>>,
}

impl ImageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached image for `reference`, if any.
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<Arc<RgbaImage>> {
        self.lock().get(reference).cloned()
    }

    /// Store `image` under `reference`, replacing any earlier entry.
    pub fn insert(&self, reference: impl Into<String>, image: Arc<RgbaImage>) {
        self.lock().insert(reference.into(), image);
    }

    /// Number of cached references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<RgbaImage>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
