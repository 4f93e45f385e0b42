//! Pagination execution adapter
//!
//! Issues assembled descriptors against a `DocumentStore` and turns the
//! store's `(documents, next token)` batches into `Page`s. Store failures are
//! counted, logged and returned unchanged as `QueryError::StoreAccess`; there
//! are no retries.
//!
//! Execution flow for a delete-by-query:
//! 1. Page through every match and collect it
//! 2. Point-delete each collected document with its own partition value

use super::pages::Pages;
use crate::error::{QueryError, QueryResult};
use crate::mapping::{DocumentConverter, EntityMetadata};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::paging::Page;
use crate::planner::{PartitionKeyBinding, PartitionKeyResolver, QueryDescriptor};
use crate::store::{Document, DocumentStore, StoreError};

/// Runs descriptors against a store
pub struct PaginationAdapter<'a, S: ?Sized> {
    store: &'a S,
    metrics: &'a MetricsRegistry,
}

impl<S: ?Sized> Clone for PaginationAdapter<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for PaginationAdapter<'_, S> {}

impl<'a, S: DocumentStore + ?Sized> PaginationAdapter<'a, S> {
    pub fn new(store: &'a S, metrics: &'a MetricsRegistry) -> Self {
        Self { store, metrics }
    }

    /// Fetches the single page described by the descriptor's page state
    pub fn fetch_page(&self, descriptor: &QueryDescriptor) -> QueryResult<Page<Document>> {
        let collection = descriptor.collection();
        let batch = self
            .store
            .execute(collection, descriptor)
            .map_err(|err| self.store_failure("execute", collection, err))?;

        let page = Page::new(batch.documents, descriptor.page(), batch.continuation);
        self.metrics.record_page(page.len() as u64);

        log_event_with_fields(
            Event::PageFetched,
            &[
                ("collection", collection),
                ("items", &page.len().to_string()),
                ("has_next", if page.is_last() { "false" } else { "true" }),
            ],
        );

        Ok(page)
    }

    /// Lazy iterator over every page, starting at the descriptor's page state
    pub fn pages(&self, descriptor: QueryDescriptor) -> Pages<'a, S> {
        Pages::new(*self, descriptor)
    }

    /// One fetch with page size 1
    pub fn exists(&self, descriptor: &QueryDescriptor) -> QueryResult<bool> {
        let probe = descriptor.with_page(descriptor.page().restart(1));
        Ok(!self.fetch_page(&probe)?.is_empty())
    }

    /// Number of documents matching the descriptor
    pub fn count(&self, descriptor: &QueryDescriptor) -> QueryResult<u64> {
        let collection = descriptor.collection();
        self.store
            .count(collection, Some(descriptor))
            .map_err(|err| self.store_failure("count", collection, err))
    }

    /// Number of documents in the collection
    pub fn count_all(&self, collection: &str) -> QueryResult<u64> {
        self.store
            .count(collection, None)
            .map_err(|err| self.store_failure("count", collection, err))
    }

    pub fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> QueryResult<Option<Document>> {
        let found = self
            .store
            .point_read(collection, id, partition)
            .map_err(|err| self.store_failure("point_read", collection, err))?;

        log_event_with_fields(
            Event::PointRead,
            &[
                ("collection", collection),
                ("id", id),
                ("found", if found.is_some() { "true" } else { "false" }),
            ],
        );
        Ok(found)
    }

    /// Deletes one document; `None` if it did not exist
    pub fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> QueryResult<Option<()>> {
        let deleted = self
            .store
            .point_delete(collection, id, partition)
            .map_err(|err| self.store_failure("point_delete", collection, err))?;

        if deleted.is_some() {
            self.metrics.add_documents_deleted(1);
        }
        log_event_with_fields(
            Event::PointDelete,
            &[
                ("collection", collection),
                ("id", id),
                ("deleted", if deleted.is_some() { "true" } else { "false" }),
            ],
        );
        Ok(deleted)
    }

    pub fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> QueryResult<()> {
        self.store
            .upsert(collection, document, partition)
            .map_err(|err| self.store_failure("upsert", collection, err))
    }

    /// Deletes every match; returns the number of documents removed
    pub fn delete(&self, descriptor: &QueryDescriptor, metadata: &EntityMetadata) -> QueryResult<u64> {
        let page = descriptor.page();
        let first = descriptor.with_page(page.restart(page.page_size()));

        let mut matched = Vec::new();
        for page in self.pages(first) {
            matched.extend(page?.into_items());
        }

        let converter = DocumentConverter::new(metadata);
        let resolver = PartitionKeyResolver::new(metadata);
        let collection = descriptor.collection();

        let mut deleted = 0u64;
        for document in &matched {
            let id = converter.id_of(document)?;
            let partition = resolver.for_document(document)?;
            if self.point_delete(collection, &id, partition.as_ref())?.is_some() {
                deleted += 1;
            }
        }

        log_event_with_fields(
            Event::DeleteByQuery,
            &[
                ("collection", collection),
                ("matched", &matched.len().to_string()),
                ("deleted", &deleted.to_string()),
            ],
        );
        Ok(deleted)
    }

    fn store_failure(&self, operation: &str, collection: &str, err: StoreError) -> QueryError {
        self.metrics.increment_store_errors();
        log_event_with_fields(
            Event::StoreError,
            &[
                ("collection", collection),
                ("operation", operation),
                ("code", err.code()),
                ("reason", &err.to_string()),
            ],
        );
        QueryError::StoreAccess(err)
    }
}
