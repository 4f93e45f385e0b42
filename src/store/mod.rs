//! Document store boundary
//!
//! The engine talks to storage only through [`DocumentStore`]. Continuation
//! tokens are produced by the store and handed back verbatim; the engine
//! never looks inside them.
//!
//! [`MemoryStore`] is a single-process, partition-aware implementation.

mod errors;
mod filters;
mod memory;
mod sorter;

use std::sync::Arc;

use serde_json::Value;

use crate::paging::ContinuationToken;
use crate::planner::{PartitionKeyBinding, QueryDescriptor};

pub use errors::{StoreError, StoreResult};
pub use filters::PredicateFilter;
pub use memory::MemoryStore;
pub use sorter::ResultSorter;

/// A stored document: a JSON object with an `id` field
pub type Document = Value;

/// One page of documents as returned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreBatch {
    pub documents: Vec<Document>,
    /// Absent on the last page
    pub continuation: Option<ContinuationToken>,
}

/// Partitioned document store
pub trait DocumentStore {
    /// Runs a query, returning one page sized by the descriptor's page state
    fn execute(&self, collection: &str, query: &QueryDescriptor) -> StoreResult<StoreBatch>;

    /// Reads one document by id
    fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<Document>>;

    /// Deletes one document by id; `None` if it did not exist
    fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<()>>;

    /// Counts matching documents, or all documents when `query` is absent
    fn count(&self, collection: &str, query: Option<&QueryDescriptor>) -> StoreResult<u64>;

    /// Inserts or replaces one document
    fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn execute(&self, collection: &str, query: &QueryDescriptor) -> StoreResult<StoreBatch> {
        (**self).execute(collection, query)
    }

    fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<Document>> {
        (**self).point_read(collection, id, partition)
    }

    fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<()>> {
        (**self).point_delete(collection, id, partition)
    }

    fn count(&self, collection: &str, query: Option<&QueryDescriptor>) -> StoreResult<u64> {
        (**self).count(collection, query)
    }

    fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<()> {
        (**self).upsert(collection, document, partition)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn execute(&self, collection: &str, query: &QueryDescriptor) -> StoreResult<StoreBatch> {
        (**self).execute(collection, query)
    }

    fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<Document>> {
        (**self).point_read(collection, id, partition)
    }

    fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<()>> {
        (**self).point_delete(collection, id, partition)
    }

    fn count(&self, collection: &str, query: Option<&QueryDescriptor>) -> StoreResult<u64> {
        (**self).count(collection, query)
    }

    fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<()> {
        (**self).upsert(collection, document, partition)
    }
}
