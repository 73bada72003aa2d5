//! The persisted cache envelope.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached value together with its write time and validity window.
///
/// Serialized as `{"data": ..., "timestamp": ..., "expiry": <ms>}` - the
/// wire format shared with older clients, so the field names are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "expiry")]
    pub expiry_ms: i64,
}

impl<T> CacheEntry<T> {
    /// Wrap a value with `timestamp = now` and the given validity window.
    pub fn new(data: T, expiry: Duration) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
            expiry_ms: expiry.num_milliseconds(),
        }
    }

    /// Time since the entry was written. Negative under clock skew.
    pub fn age(&self) -> Duration {
        Utc::now() - self.timestamp
    }

    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes()
    }

    /// An entry is expired once its age reaches the validity window.
    /// A negative age (clock skew) counts as fresh.
    pub fn is_expired(&self) -> bool {
        self.age() >= Duration::milliseconds(self.expiry_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_not_expired() {
        let entry = CacheEntry::new(vec![1, 2, 3], Duration::minutes(5));
        assert!(!entry.is_expired());
        assert!(entry.age_minutes() <= 1);
    }

    #[test]
    fn test_backdated_entry_is_expired() {
        let mut entry = CacheEntry::new("v", Duration::minutes(5));
        entry.timestamp = Utc::now() - Duration::minutes(6);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_zero_expiry_is_immediately_expired() {
        let entry = CacheEntry::new("v", Duration::zero());
        assert!(entry.is_expired());
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let mut entry = CacheEntry::new("v", Duration::minutes(5));
        entry.timestamp = Utc::now() + Duration::minutes(10);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_wire_format_field_names() {
        let entry = CacheEntry::new(42, Duration::minutes(1));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["data"], 42);
        assert_eq!(json["expiry"], 60_000);
        assert!(json["timestamp"].is_string());
    }
}
