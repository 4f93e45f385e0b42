//! Lazy page iterator

use super::cursor::PageCursor;
use super::executor::PaginationAdapter;
use crate::error::QueryResult;
use crate::observability::{log_event_with_fields, Event};
use crate::paging::Page;
use crate::planner::QueryDescriptor;
use crate::store::{Document, DocumentStore};

/// Yields one page per store call until the store returns no token.
///
/// After an error the iterator is exhausted.
pub struct Pages<'a, S: ?Sized> {
    adapter: PaginationAdapter<'a, S>,
    descriptor: QueryDescriptor,
    cursor: PageCursor,
}

impl<'a, S: DocumentStore + ?Sized> Pages<'a, S> {
    pub(crate) fn new(adapter: PaginationAdapter<'a, S>, descriptor: QueryDescriptor) -> Self {
        let cursor = PageCursor::new(descriptor.page().continuation().cloned());
        Self {
            adapter,
            descriptor,
            cursor,
        }
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Drains the remaining pages into one list
    pub fn collect_items(self) -> QueryResult<Vec<Document>> {
        let mut items = Vec::new();
        for page in self {
            items.extend(page?.into_items());
        }
        Ok(items)
    }
}

impl<S: DocumentStore + ?Sized> Iterator for Pages<'_, S> {
    type Item = QueryResult<Page<Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.cursor.next_page(self.descriptor.page())?;
        let result = self.adapter.fetch_page(&self.descriptor.with_page(state));

        match &result {
            Ok(page) => {
                self.cursor.advance(page.next_token().cloned());
                if self.cursor.is_exhausted() {
                    log_event_with_fields(
                        Event::PagesExhausted,
                        &[("collection", self.descriptor.collection())],
                    );
                }
            }
            Err(_) => self.cursor.exhaust(),
        }

        Some(result)
    }
}
