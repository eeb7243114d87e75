//! Stored response types with insertion metadata.
//!
//! This module provides the value side of the cache:
//!
//! - [`ResponseSnapshot`] - a fully-buffered response (status, headers, body)
//! - [`CacheEntry`] - a snapshot plus the timestamp it was written at
//!
//! ## Staleness
//!
//! The insertion timestamp is authoritative for staleness decisions; upstream
//! `cache-control` headers are deliberately not consulted. A strategy or
//! sweep decides freshness by comparing the entry's age against its own
//! window via [`CacheEntry::is_fresh`].
//!
//! ```
//! use std::time::Duration;
//! use stratus_core::{CacheEntry, ResponseSnapshot};
//!
//! let entry = CacheEntry::new(ResponseSnapshot::ok("{}".into()));
//! assert!(entry.is_fresh(Duration::from_secs(60)));
//! ```

use chrono::{DateTime, Duration as TimeDelta, Utc};
use http::{HeaderMap, StatusCode};

use crate::Raw;

/// A fully-buffered response as seen by strategies and stored in partitions.
///
/// Snapshots are what the [`Fetch`](crate::Fetch) capability produces and
/// what every request-handling path ultimately resolves to. The body is
/// [`Bytes`](bytes::Bytes), so cloning a snapshot never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    status: StatusCode,
    headers: HeaderMap,
    body: Raw,
}

impl ResponseSnapshot {
    /// Creates a snapshot from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Raw) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a `200 OK` snapshot with no headers.
    pub fn ok(body: Raw) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// Returns the response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response body.
    pub fn body(&self) -> &Raw {
        &self.body
    }

    /// Whether the status is in the 2xx range. Only successful responses are
    /// ever written to a partition.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A stored response with its insertion timestamp.
///
/// Entries are written on successful network fetches and replaced in place on
/// revalidation; the timestamp always reflects the most recent write.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use std::time::Duration as StdDuration;
/// use stratus_core::{CacheEntry, ResponseSnapshot};
///
/// // A back-dated entry, one hour old.
/// let entry = CacheEntry::stored_at(
///     ResponseSnapshot::ok("body".into()),
///     Utc::now() - Duration::hours(1),
/// );
/// assert!(!entry.is_fresh(StdDuration::from_secs(300)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    snapshot: ResponseSnapshot,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(snapshot: ResponseSnapshot) -> Self {
        Self::stored_at(snapshot, Utc::now())
    }

    /// Creates an entry with an explicit insertion timestamp.
    pub fn stored_at(snapshot: ResponseSnapshot, stored_at: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            stored_at,
        }
    }

    /// Returns the stored response.
    pub fn snapshot(&self) -> &ResponseSnapshot {
        &self.snapshot
    }

    /// Returns when the entry was written.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Returns the entry's age relative to the current time.
    pub fn age(&self) -> TimeDelta {
        Utc::now().signed_duration_since(self.stored_at)
    }

    /// Whether the entry's age is within the given window.
    ///
    /// An entry from the future (clock adjustment) counts as fresh.
    pub fn is_fresh(&self, window: std::time::Duration) -> bool {
        match TimeDelta::from_std(window) {
            Ok(window) => self.age() <= window,
            Err(_) => true,
        }
    }

    /// Consumes the entry and returns the stored response.
    pub fn into_snapshot(self) -> ResponseSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn freshness_window_boundaries() {
        let window = Duration::from_secs(300);
        let inside = CacheEntry::stored_at(
            ResponseSnapshot::ok("a".into()),
            Utc::now() - TimeDelta::seconds(299),
        );
        let outside = CacheEntry::stored_at(
            ResponseSnapshot::ok("a".into()),
            Utc::now() - TimeDelta::seconds(301),
        );
        assert!(inside.is_fresh(window));
        assert!(!outside.is_fresh(window));
    }

    #[test]
    fn future_entry_is_fresh() {
        let entry = CacheEntry::stored_at(
            ResponseSnapshot::ok("a".into()),
            Utc::now() + TimeDelta::seconds(30),
        );
        assert!(entry.is_fresh(Duration::from_secs(1)));
    }
}
