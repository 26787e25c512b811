//! Cache Entry Module
//!
//! Defines a time-boxed response snapshot and its size estimation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::CacheError;

/// Type-erased payload shared between the cache and its readers.
pub type Payload = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// A single cached response with freshness and size metadata.
#[derive(Clone)]
pub struct CacheEntry {
    /// The last successful fetch result
    pub data: Payload,
    /// Write time on the store's clock (milliseconds)
    pub timestamp: u64,
    /// Validity window in milliseconds
    pub ttl: u64,
    /// Approximate serialized size in bytes
    pub size: usize,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(data: Payload, timestamp: u64, ttl: u64, size: usize) -> Self {
        Self {
            data,
            timestamp,
            ttl,
            size,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once its age reaches its TTL,
    /// so "fresh" and "expired" partition every instant.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.age_ms(now) >= self.ttl
    }

    pub fn is_fresh_at(&self, now: u64) -> bool {
        !self.is_expired_at(now)
    }

    // == Downcast ==
    /// Returns the payload as `T`, or None if it was stored as another type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("timestamp", &self.timestamp)
            .field("ttl", &self.ttl)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

// == Size Estimation ==
/// Returns the byte length of the JSON serialization of `data`.
pub fn try_estimate_size<T: Serialize + ?Sized>(data: &T) -> Result<usize, CacheError> {
    serde_json::to_vec(data)
        .map(|bytes| bytes.len())
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Size estimate used for memory accounting. Falls back to 0 when the
/// payload cannot be serialized; the write still goes through.
pub fn estimate_size<T: Serialize + ?Sized>(data: &T) -> usize {
    try_estimate_size(data).unwrap_or_else(|err| {
        debug!("Size estimation fell back to 0: {}", err);
        0
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entry_at(timestamp: u64, ttl: u64) -> CacheEntry {
        CacheEntry::new(Arc::new(vec![1u32, 2, 3]), timestamp, ttl, 7)
    }

    #[test]
    fn test_fresh_before_ttl() {
        let entry = entry_at(1_000, 30_000);

        assert!(entry.is_fresh_at(1_000));
        assert!(entry.is_fresh_at(30_999));
        assert_eq!(entry.age_ms(11_000), 10_000);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry_at(1_000, 30_000);

        // Age equal to TTL is expired
        assert!(entry.is_expired_at(31_000));
        assert!(entry.is_expired_at(60_000));
    }

    #[test]
    fn test_age_saturates_when_clock_is_behind() {
        let entry = entry_at(5_000, 100);
        assert_eq!(entry.age_ms(1_000), 0);
        assert!(entry.is_fresh_at(1_000));
    }

    #[test]
    fn test_downcast_matching_and_mismatched_type() {
        let entry = entry_at(0, 10);

        let data = entry.downcast::<Vec<u32>>().unwrap();
        assert_eq!(*data, vec![1, 2, 3]);
        assert!(entry.downcast::<String>().is_none());
    }

    #[test]
    fn test_estimate_size_is_json_length() {
        assert_eq!(estimate_size(&vec![1, 2, 3]), "[1,2,3]".len());
        assert_eq!(estimate_size("abc"), "\"abc\"".len());
    }

    #[test]
    fn test_estimate_size_falls_back_to_zero() {
        // JSON object keys must be strings
        let mut data = HashMap::new();
        data.insert((1u8, 2u8), "value");

        assert!(matches!(
            try_estimate_size(&data),
            Err(CacheError::Serialization(_))
        ));
        assert_eq!(estimate_size(&data), 0);
    }
}
