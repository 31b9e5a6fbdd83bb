//! Bidirectional map between caller identifiers and surface handles.

use std::collections::HashMap;
use std::hash::Hash;

/// Tracks which surface handle renders which caller identifier.
///
/// At most one handle is live per identifier and each handle belongs to one
/// identifier; registering either side again displaces the stale pairing.
///
/// # Examples
/// ```
/// use cartosync_core::OverlayRegistry;
///
/// let mut registry = OverlayRegistry::new();
/// registry.register("m1", 7_u64);
/// assert_eq!(registry.handle_for("m1"), Some(7));
/// assert_eq!(registry.id_for(7), Some("m1"));
/// assert_eq!(registry.unregister("m1"), Some(7));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct OverlayRegistry<H> {
    by_id: HashMap<String, H>,
    by_handle: HashMap<H, String>,
}

impl<H> Default for OverlayRegistry<H> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }
}

impl<H: Copy + Eq + Hash> OverlayRegistry<H> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `handle` renders `id`, returning the handle previously
    /// registered for `id`, if any.
    pub fn register(&mut self, id: impl Into<String>, handle: H) -> Option<H> {
        let key = id.into();
        if let Some(previous_id) = self.by_handle.remove(&handle) {
            self.by_id.remove(&previous_id);
        }
        let displaced = self.by_id.insert(key.clone(), handle);
        if let Some(stale) = displaced {
            self.by_handle.remove(&stale);
        }
        self.by_handle.insert(handle, key);
        displaced
    }

    /// Forget `id`, returning the handle it mapped to.
    pub fn unregister(&mut self, id: &str) -> Option<H> {
        let handle = self.by_id.remove(id)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    /// Handle rendering `id`.
    #[must_use]
    pub fn handle_for(&self, id: &str) -> Option<H> {
        self.by_id.get(id).copied()
    }

    /// Identifier rendered by `handle`.
    #[must_use]
    pub fn id_for(&self, handle: H) -> Option<&str> {
        self.by_handle.get(&handle).map(String::as_str)
    }

    /// Number of live pairings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no pairings are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered identifiers in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    /// Registered handles in arbitrary order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.by_id.values().copied()
    }

    /// Remove and return every pairing.
    pub fn drain(&mut self) -> Vec<(String, H)> {
        self.by_handle.clear();
        self.by_id.drain().collect()
    }
}
