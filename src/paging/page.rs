//! Page requests, page state and result pages
//!
//! Continuation tokens are issued by the store and treated as opaque bytes:
//! never parsed, generated or modified here, only stored and replayed.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::sort::Sort;
use crate::error::{QueryError, QueryResult};

/// Opaque store-issued cursor
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(Vec<u8>);

impl ContinuationToken {
    /// Wraps raw token bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form for transport outside the process
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Restores a token from its base64 transport form
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded.trim()).map(Self)
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuationToken({} bytes)", self.0.len())
    }
}

/// Call-site page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    size: u32,
    continuation: Option<ContinuationToken>,
    sort: Option<Sort>,
}

impl PageRequest {
    /// First page of the given size; fails on a non-positive size
    pub fn of(size: i64) -> QueryResult<Self> {
        let size = u32::try_from(size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(QueryError::InvalidPageSize(size))?;
        Ok(Self {
            size,
            continuation: None,
            sort: None,
        })
    }

    /// Resumes after a previously returned token
    pub fn with_continuation(mut self, token: ContinuationToken) -> Self {
        self.continuation = Some(token);
        self
    }

    /// Attaches a sort to the request
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

/// Page state carried by a query descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    continuation: Option<ContinuationToken>,
    page_size: u32,
    sort: Sort,
}

impl PageState {
    pub(crate) fn new(page_size: u32, continuation: Option<ContinuationToken>, sort: Sort) -> Self {
        Self {
            continuation,
            page_size,
            sort,
        }
    }

    /// Same size and sort, resuming at `token`
    pub fn resume(&self, token: ContinuationToken) -> Self {
        Self {
            continuation: Some(token),
            page_size: self.page_size,
            sort: self.sort.clone(),
        }
    }

    /// First page of `page_size`, keeping the sort
    pub fn restart(&self, page_size: u32) -> Self {
        Self {
            continuation: None,
            page_size: page_size.max(1),
            sort: self.sort.clone(),
        }
    }

    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Absent token means first page
    pub fn is_first_page(&self) -> bool {
        self.continuation.is_none()
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    page_size: u32,
    sort: Sort,
    next: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, state: &PageState, next: Option<ContinuationToken>) -> Self {
        Self {
            items,
            page_size: state.page_size,
            sort: state.sort.clone(),
            next,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Token for the following page, absent on the last page
    pub fn next_token(&self) -> Option<&ContinuationToken> {
        self.next.as_ref()
    }

    /// Returns true if no further page exists
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Request for the following page with the same size and sort
    pub fn next_request(&self) -> Option<PageRequest> {
        self.next.as_ref().map(|token| PageRequest {
            size: self.page_size,
            continuation: Some(token.clone()),
            sort: Some(self.sort.clone()).filter(Sort::is_sorted),
        })
    }

    /// Maps every item, failing on the first error
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page_size: self.page_size,
            sort: self.sort,
            next: self.next,
        })
    }
}
