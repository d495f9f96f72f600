//! Leaf records stored at key-terminal nodes.
//!
//! A [`Leaf`] couples the full key bytes with the stored value. Both ride
//! behind reference counts, so duplicating a leaf during a copy-on-write
//! step produces an independent record without copying key bytes and
//! without requiring `V: Clone`.

use std::fmt;
use std::sync::Arc;

/// A stored key/value record.
///
/// The complete key is retained so traversals and cursors can yield it
/// without reassembling bytes from edge prefixes along the path.
pub struct Leaf<V> {
    /// The full key, exactly as inserted.
    pub(crate) key: Arc<[u8]>,

    /// The value payload, carried through unchanged.
    pub(crate) value: Arc<V>,
}

impl<V> Leaf<V> {
    /// Create a leaf from a key and an already-shared value.
    #[must_use]
    pub(crate) fn new(key: &[u8], value: Arc<V>) -> Self {
        Self {
            key: Arc::from(key),
            value,
        }
    }

    /// The stored key bytes.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The stored value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }
}

// Hand-written so `V: Clone` is not required: the clone shares key bytes
// and value through the reference counts.
impl<V> Clone for Leaf<V> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            value: Arc::clone(&self.value),
        }
    }
}

impl<V> fmt::Debug for Leaf<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("key", &self.key)
            .field("value", &"...")
            .finish()
    }
}
