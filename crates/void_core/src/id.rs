//! Unique identifier generation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// An opaque, process-unique identifier
///
/// Ids are never reused within a process, so a stale id can always be told
/// apart from a live one by a simple lookup.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Create an ID from its raw value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Create a null/invalid ID
    #[inline]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Check if this ID is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Id(null)")
        } else {
            write!(f, "Id({})", self.0)
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Thread-safe ID generator
///
/// The first generated id is `#1`; `#0` is reserved for [`Id::null`].
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a new ID generator
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Generate the next unique ID
    pub fn next(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_id() {
        assert!(Id::null().is_null());
        assert!(Id::default().is_null());
        assert_eq!(Id::null().to_string(), "null");
    }

    #[test]
    fn test_id_generator() {
        let gen = IdGenerator::new();
        let id1 = gen.next();
        let id2 = gen.next();
        assert_ne!(id1, id2);
        assert!(!id1.is_null());
        assert_eq!(id1.raw(), 1);
        assert_eq!(id2.raw(), 2);
        assert_eq!(id2.to_string(), "#2");
    }
}
