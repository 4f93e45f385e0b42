//! Observability
//!
//! - Structured JSON logging to stderr with a process-wide minimum severity
//! - Typed events
//! - In-process counters
//!
//! Observability is read-only: it never changes the outcome of a call.
//!
//! ```ignore
//! use docrepo::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::PageFetched, &[("collection", "Project"), ("items", "2")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_page(2);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event at its default severity, with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
