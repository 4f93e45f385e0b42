//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only when the registry is created
//! - Thread-safe, Relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry shared by one engine
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Operation names parsed (cache misses)
    queries_parsed: AtomicU64,
    /// Calls rejected before reaching the store
    queries_rejected: AtomicU64,
    /// Store round trips that returned a page
    pages_fetched: AtomicU64,
    /// Documents returned across all pages
    documents_returned: AtomicU64,
    /// Documents removed by point or query deletes
    documents_deleted: AtomicU64,
    /// Failures reported by the store
    store_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_parsed(&self) {
        self.queries_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one fetched page of `documents` items
    pub fn record_page(&self, documents: u64) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.documents_returned
            .fetch_add(documents, Ordering::Relaxed);
    }

    pub fn add_documents_deleted(&self, count: u64) {
        self.documents_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_store_errors(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_parsed: self.queries_parsed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            documents_returned: self.documents_returned.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_parsed: u64,
    pub queries_rejected: u64,
    pub pages_fetched: u64,
    pub documents_returned: u64,
    pub documents_deleted: u64,
    pub store_errors: u64,
}
