//! Page cursor state machine
//!
//! ```text
//! Fetching(None) --fetch--> Fetching(Some(token)) --fetch--> ... --fetch--> Exhausted
//! ```
//!
//! `Exhausted` is terminal.

use crate::paging::{ContinuationToken, PageState};

/// Cursor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorState {
    /// Next fetch resumes at the token (absent = first page)
    Fetching(Option<ContinuationToken>),
    /// No further pages
    Exhausted,
}

/// Tracks where the next fetch resumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    state: CursorState,
}

impl PageCursor {
    /// Cursor starting at `start` (absent = first page)
    pub fn new(start: Option<ContinuationToken>) -> Self {
        Self {
            state: CursorState::Fetching(start),
        }
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Page state for the next fetch, derived from `base`; `None` once exhausted
    pub fn next_page(&self, base: &PageState) -> Option<PageState> {
        match &self.state {
            CursorState::Fetching(Some(token)) => Some(base.resume(token.clone())),
            CursorState::Fetching(None) => Some(base.restart(base.page_size())),
            CursorState::Exhausted => None,
        }
    }

    /// Records the token returned with the last page
    pub fn advance(&mut self, next: Option<ContinuationToken>) {
        self.state = match next {
            Some(token) => CursorState::Fetching(Some(token)),
            None => CursorState::Exhausted,
        };
    }

    /// Stops the cursor without a further fetch
    pub fn exhaust(&mut self) {
        self.state = CursorState::Exhausted;
    }
}
