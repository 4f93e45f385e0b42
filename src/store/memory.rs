//! In-memory document store
//!
//! Collections live in a `BTreeMap` keyed by `(partition value, id)`, so scans
//! are deterministic. Queries filter and sort the whole collection, then cut
//! one page; the continuation token records the resume offset.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filters::PredicateFilter;
use super::sorter::ResultSorter;
use super::{Document, DocumentStore, StoreBatch};
use crate::mapping::{lookup_path, ID_FIELD};
use crate::paging::ContinuationToken;
use crate::planner::{PartitionKeyBinding, QueryDescriptor};

type DocumentKey = (String, String);

#[derive(Debug, Default)]
struct MemoryCollection {
    /// Dotted partition field; `None` for single-partition collections
    partition_field: Option<String>,
    documents: BTreeMap<DocumentKey, Document>,
}

#[derive(Serialize, Deserialize)]
struct Cursor {
    skip: usize,
}

/// Single-process document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection, replacing any existing one
    pub fn create_collection(&self, name: &str, partition_field: Option<&str>) {
        self.write().insert(
            name.to_string(),
            MemoryCollection {
                partition_field: partition_field.map(String::from),
                documents: BTreeMap::new(),
            },
        );
    }

    /// Stores a document using the collection's own partition field
    pub fn insert(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.upsert(collection, document, None)
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.read()
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    /// Returns true if the collection is missing or empty
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, MemoryCollection>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, MemoryCollection>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn matching(collection: &MemoryCollection, query: &QueryDescriptor) -> Vec<Document> {
        collection
            .documents
            .values()
            .filter(|doc| PredicateFilter::matches(doc, query.tree()))
            .cloned()
            .collect()
    }
}

impl MemoryCollection {
    fn key_for(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<DocumentKey> {
        match (&self.partition_field, partition) {
            (Some(_), Some(binding)) => Ok((partition_repr(binding.value()), id.to_string())),
            (Some(field), None) => Err(StoreError::BadRequest(format!(
                "collection '{}' is partitioned by '{}'; a partition key is required",
                collection, field
            ))),
            (None, _) => Ok((String::new(), id.to_string())),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn execute(&self, collection: &str, query: &QueryDescriptor) -> StoreResult<StoreBatch> {
        let skip = match query.page().continuation() {
            Some(token) => decode_cursor(token)?,
            None => 0,
        };

        let collections = self.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(StoreBatch::default());
        };

        let mut matches = Self::matching(coll, query);
        ResultSorter::sort(&mut matches, query.sort());

        let size = query.page().page_size().max(1) as usize;
        let end = skip.saturating_add(size).min(matches.len());
        let documents = matches
            .get(skip..end)
            .map(<[Document]>::to_vec)
            .unwrap_or_default();

        let continuation = if end < matches.len() {
            Some(encode_cursor(end)?)
        } else {
            None
        };

        Ok(StoreBatch {
            documents,
            continuation,
        })
    }

    fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<Document>> {
        let collections = self.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(None);
        };
        let key = coll.key_for(collection, id, partition)?;
        Ok(coll.documents.get(&key).cloned())
    }

    fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<()>> {
        let mut collections = self.write();
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let key = coll.key_for(collection, id, partition)?;
        Ok(coll.documents.remove(&key).map(|_| ()))
    }

    fn count(&self, collection: &str, query: Option<&QueryDescriptor>) -> StoreResult<u64> {
        let collections = self.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(0);
        };
        let count = match query {
            Some(query) => Self::matching(coll, query).len(),
            None => coll.documents.len(),
        };
        Ok(count as u64)
    }

    fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<()> {
        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(StoreError::BadRequest(format!(
                    "document in '{}' has no string or number '{}'",
                    collection, ID_FIELD
                )))
            }
        };

        let mut collections = self.write();
        let coll = collections
            .entry(collection.to_string())
            .or_insert_with(|| MemoryCollection {
                partition_field: partition.map(|b| b.field().to_string()),
                documents: BTreeMap::new(),
            });

        let partition_value = match &coll.partition_field {
            Some(field) => {
                let value = lookup_path(&document, field)
                    .filter(|v| !v.is_null())
                    .map(partition_repr)
                    .ok_or_else(|| {
                        StoreError::BadRequest(format!(
                            "document '{}' has no value for partition field '{}'",
                            id, field
                        ))
                    })?;
                if let Some(binding) = partition {
                    if partition_repr(binding.value()) != value {
                        return Err(StoreError::BadRequest(format!(
                            "partition key {} does not match document '{}'",
                            binding.value(),
                            id
                        )));
                    }
                }
                value
            }
            None => String::new(),
        };

        coll.documents.insert((partition_value, id), document);
        Ok(())
    }
}

fn partition_repr(value: &Value) -> String {
    value.to_string()
}

fn encode_cursor(skip: usize) -> StoreResult<ContinuationToken> {
    serde_json::to_vec(&Cursor { skip })
        .map(ContinuationToken::from_bytes)
        .map_err(|e| StoreError::BadRequest(e.to_string()))
}

fn decode_cursor(token: &ContinuationToken) -> StoreResult<usize> {
    serde_json::from_slice::<Cursor>(token.as_bytes())
        .map(|cursor| cursor.skip)
        .map_err(|e| StoreError::InvalidContinuation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityDescriptor, EntityMetadata, PropertyType};
    use crate::paging::{Order, PageRequest, Sort, SortPageBuilder};
    use crate::planner::{CapabilityValidator, QueryAssembler};
    use crate::query::MethodNameParser;
    use serde_json::json;

    fn address() -> EntityMetadata {
        EntityMetadata::from_descriptor(
            EntityDescriptor::new("Address")
                .id("postalCode")
                .partition_key("city")
                .property("postalCode", PropertyType::String)
                .property("city", PropertyType::String)
                .property("street", PropertyType::String),
        )
        .unwrap()
    }

    fn descriptor(
        method: &str,
        args: Vec<Value>,
        sort: Sort,
        page: Option<PageRequest>,
    ) -> QueryDescriptor {
        let meta = address();
        let part = MethodNameParser::new(&meta).parse(method).unwrap();
        let spec = CapabilityValidator::new(&meta).validate(&part, &sort).unwrap();
        let state = SortPageBuilder::new(100).page(page.as_ref()).build();
        QueryAssembler::new(&meta)
            .assemble(&part, &args, spec, state)
            .unwrap()
    }

    fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_collection("Address", Some("city"));
        for i in 0..count {
            store
                .insert(
                    "Address",
                    json!({"id": format!("{:04}", i), "city": "Oslo", "street": format!("Street {}", i)}),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_single_page_has_no_token() {
        let store = seeded(5);
        let query = descriptor("findAll", vec![], Sort::unsorted(), Some(PageRequest::of(5).unwrap()));

        let batch = store.execute("Address", &query).unwrap();
        assert_eq!(batch.documents.len(), 5);
        assert!(batch.continuation.is_none());
    }

    #[test]
    fn test_pages_of_two() {
        let store = seeded(5);
        let first = descriptor("findAll", vec![], Sort::unsorted(), Some(PageRequest::of(2).unwrap()));

        let mut sizes = Vec::new();
        let mut query = first.clone();
        loop {
            let batch = store.execute("Address", &query).unwrap();
            sizes.push(batch.documents.len());
            match batch.continuation {
                Some(token) => query = first.with_page(first.page().resume(token)),
                None => break,
            }
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let store = seeded(3);
        let page = PageRequest::of(2)
            .unwrap()
            .with_continuation(ContinuationToken::from_bytes(b"garbage".to_vec()));
        let query = descriptor("findAll", vec![], Sort::unsorted(), Some(page));

        let err = store.execute("Address", &query).unwrap_err();
        assert!(matches!(err, StoreError::InvalidContinuation(_)));
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let store = MemoryStore::new();
        let query = descriptor("findAll", vec![], Sort::unsorted(), None);

        let batch = store.execute("Address", &query).unwrap();
        assert!(batch.documents.is_empty());
        assert_eq!(store.count("Address", None).unwrap(), 0);
    }

    #[test]
    fn test_filter_and_sort() {
        let store = seeded(4);
        store
            .insert("Address", json!({"id": "9999", "city": "Bergen", "street": "Aaa"}))
            .unwrap();

        let query = descriptor(
            "findByCity",
            vec![json!("Oslo")],
            Sort::by(Order::desc("street")),
            None,
        );
        let batch = store.execute("Address", &query).unwrap();
        let streets: Vec<_> = batch.documents.iter().map(|d| d["street"].clone()).collect();
        assert_eq!(
            streets,
            vec![json!("Street 3"), json!("Street 2"), json!("Street 1"), json!("Street 0")]
        );
        assert_eq!(store.count("Address", Some(&query)).unwrap(), 4);
    }

    #[test]
    fn test_point_operations_need_partition() {
        let store = seeded(1);
        let oslo = PartitionKeyBinding::new("city", "city", json!("Oslo"));
        let bergen = PartitionKeyBinding::new("city", "city", json!("Bergen"));

        assert!(store.point_read("Address", "0000", Some(&oslo)).unwrap().is_some());
        assert!(store.point_read("Address", "0000", Some(&bergen)).unwrap().is_none());
        assert!(matches!(
            store.point_read("Address", "0000", None).unwrap_err(),
            StoreError::BadRequest(_)
        ));

        assert_eq!(store.point_delete("Address", "0000", Some(&oslo)).unwrap(), Some(()));
        assert_eq!(store.point_delete("Address", "0000", Some(&oslo)).unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces_and_creates_collection() {
        let store = MemoryStore::new();
        let binding = PartitionKeyBinding::new("city", "city", json!("Oslo"));

        store
            .upsert("Address", json!({"id": "1", "city": "Oslo", "street": "A"}), Some(&binding))
            .unwrap();
        store
            .upsert("Address", json!({"id": "1", "city": "Oslo", "street": "B"}), Some(&binding))
            .unwrap();

        assert_eq!(store.len("Address"), 1);
        let doc = store.point_read("Address", "1", Some(&binding)).unwrap().unwrap();
        assert_eq!(doc["street"], "B");
    }

    #[test]
    fn test_upsert_without_id_rejected() {
        let store = MemoryStore::new();
        let err = store.upsert("Project", json!({"name": "x"}), None).unwrap_err();
        assert!(matches!(err, StoreError::BadRequest(_)));
    }

    #[test]
    fn test_unpartitioned_collection_ignores_binding() {
        let store = MemoryStore::new();
        store.insert("Project", json!({"id": "p1"})).unwrap();
        assert!(store.point_read("Project", "p1", None).unwrap().is_some());
        assert!(store.is_empty("Other"));
        assert_eq!(store.len("Project"), 1);
    }
}
