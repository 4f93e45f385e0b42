//! Pagination execution
//!
//! Drives assembled descriptors against the document store.
//!
//! - `PaginationAdapter`: single fetches, point operations, exists/count,
//!   delete-by-query
//! - `Pages`: lazy iterator, one store call per page
//! - `PageCursor`: `Fetching(token)` / `Exhausted` state machine
//!
//! Tokens returned by the store are replayed verbatim and never inspected.

mod cursor;
mod executor;
mod pages;

pub use cursor::{CursorState, PageCursor};
pub use executor::PaginationAdapter;
pub use pages::Pages;
