//! Observable engine events
//!
//! Events are explicit and typed; each carries its default severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Derivation
    /// Operation name parsed and cached
    QueryParsed,
    /// Call rejected before reaching the store
    QueryRejected,
    /// Query descriptor assembled
    QueryAssembled,

    // Execution
    /// One page fetched from the store
    PageFetched,
    /// Last page fetched, cursor exhausted
    PagesExhausted,
    /// Point read by id
    PointRead,
    /// Point delete by id
    PointDelete,
    /// Delete-by-query finished
    DeleteByQuery,
    /// Store reported a failure
    StoreError,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryParsed => "QUERY_PARSED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryAssembled => "QUERY_ASSEMBLED",
            Event::PageFetched => "PAGE_FETCHED",
            Event::PagesExhausted => "PAGES_EXHAUSTED",
            Event::PointRead => "POINT_READ",
            Event::PointDelete => "POINT_DELETE",
            Event::DeleteByQuery => "DELETE_BY_QUERY",
            Event::StoreError => "STORE_ERROR",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryParsed
            | Event::QueryAssembled
            | Event::PageFetched
            | Event::PagesExhausted
            | Event::PointRead => Severity::Trace,
            Event::ConfigLoaded | Event::PointDelete | Event::DeleteByQuery => Severity::Info,
            Event::QueryRejected => Severity::Warn,
            Event::StoreError => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::QueryParsed,
            Event::QueryRejected,
            Event::QueryAssembled,
            Event::PageFetched,
            Event::PagesExhausted,
            Event::PointRead,
            Event::PointDelete,
            Event::DeleteByQuery,
            Event::StoreError,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::StoreError.severity(), Severity::Error);
        assert_eq!(Event::QueryRejected.severity(), Severity::Warn);
        assert_eq!(Event::PageFetched.severity(), Severity::Trace);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::DeleteByQuery), "DELETE_BY_QUERY");
    }
}
