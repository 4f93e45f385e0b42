//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::cell::Cell;
use std::sync::Arc;

use docrepo::mapping::{Entity, EntityDescriptor, EntityMetadata, MappingContext, PropertyType};
use docrepo::planner::{PartitionKeyBinding, QueryDescriptor};
use docrepo::store::{Document, DocumentStore, MemoryStore, StoreBatch, StoreResult};
use docrepo::{QueryEngine, Repository};
use serde::{Deserialize, Serialize};
use serde_json::json;

// =============================================================================
// Entities
// =============================================================================

/// Single-partition entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub star_count: i64,
    pub has_released: bool,
    pub tags: Vec<String>,
    pub created_at: String,
}

impl Entity for Project {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Project")
            .property("id", PropertyType::String)
            .property("name", PropertyType::String)
            .property("creator", PropertyType::String)
            .property("starCount", PropertyType::Int)
            .property("hasReleased", PropertyType::Bool)
            .property("tags", PropertyType::array_of(PropertyType::String))
            .property("createdAt", PropertyType::DateTime)
    }
}

pub fn project(id: &str, creator: &str, stars: i64, released: bool, created_at: &str) -> Project {
    Project {
        id: id.to_string(),
        name: format!("project-{}", id),
        creator: creator.to_string(),
        star_count: stars,
        has_released: released,
        tags: vec![format!("tag-{}", stars / 10 % 2)],
        created_at: created_at.to_string(),
    }
}

pub fn projects() -> Vec<Project> {
    vec![
        project("p1", "alice", 10, true, "2024-01-01T00:00:00Z"),
        project("p2", "bob", 20, false, "2024-02-01T00:00:00Z"),
        project("p3", "alice", 30, true, "2024-03-01T00:00:00Z"),
        project("p4", "carol", 40, false, "2024-04-01T00:00:00Z"),
        project("p5", "Alice", 50, true, "2024-05-01T00:00:00Z"),
    ]
}

/// Entity partitioned by `city`, identified by `postalCode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub city: String,
}

impl Entity for Address {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Address")
            .id("postalCode")
            .partition_key("city")
            .property("postalCode", PropertyType::String)
            .property("street", PropertyType::String)
            .property("city", PropertyType::String)
    }
}

pub fn address(postal_code: &str, street: &str, city: &str) -> Address {
    Address {
        postal_code: postal_code.to_string(),
        street: street.to_string(),
        city: city.to_string(),
    }
}

pub fn addresses() -> Vec<Address> {
    vec![
        address("0150", "Main", "Oslo"),
        address("0151", "High", "Oslo"),
        address("0152", "Low", "Oslo"),
        address("5003", "Bryggen", "Bergen"),
        address("5004", "Main", "Bergen"),
    ]
}

/// Entity with a renamed id, a custom collection and a nested object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub logic_id: String,
    pub title: String,
    pub int_value: i64,
    pub home: Home,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub city: String,
    pub street: String,
}

impl Entity for Contact {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Contact")
            .collection("contacts")
            .id("logicId")
            .property("logicId", PropertyType::String)
            .property("title", PropertyType::String)
            .property("intValue", PropertyType::Int)
            .property(
                "home",
                PropertyType::object([
                    ("city", PropertyType::String),
                    ("street", PropertyType::String),
                ]),
            )
    }
}

pub fn contact(id: &str, title: &str, value: i64, city: &str) -> Contact {
    Contact {
        logic_id: id.to_string(),
        title: title.to_string(),
        int_value: value,
        home: Home {
            city: city.to_string(),
            street: "Main".to_string(),
        },
    }
}

// =============================================================================
// Repositories and engines
// =============================================================================

pub fn project_repository() -> Repository<Project, MemoryStore> {
    let repo = Repository::new(&MappingContext::new(), MemoryStore::new()).unwrap();
    repo.save_all(&projects()).unwrap();
    repo
}

pub fn address_repository() -> Repository<Address, MemoryStore> {
    let repo = Repository::new(&MappingContext::new(), MemoryStore::new()).unwrap();
    repo.save_all(&addresses()).unwrap();
    repo
}

pub fn metadata<T: Entity>() -> Arc<EntityMetadata> {
    MappingContext::new().metadata::<T>().unwrap()
}

/// Project engine over five documents, one per star count 10..50
pub fn project_engine() -> QueryEngine<MemoryStore> {
    let store = MemoryStore::new();
    for (i, stars) in [10, 20, 30, 40, 50].into_iter().enumerate() {
        store
            .insert(
                "Project",
                json!({"id": format!("p{}", i + 1), "name": format!("n{}", i), "creator": "alice", "starCount": stars}),
            )
            .unwrap();
    }
    QueryEngine::new(metadata::<Project>(), store)
}

// =============================================================================
// Counting store
// =============================================================================

/// Delegates to a `MemoryStore` and counts every call
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub calls: Cell<usize>,
}

impl CountingStore {
    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl DocumentStore for CountingStore {
    fn execute(&self, collection: &str, query: &QueryDescriptor) -> StoreResult<StoreBatch> {
        self.tick();
        self.inner.execute(collection, query)
    }

    fn point_read(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<Document>> {
        self.tick();
        self.inner.point_read(collection, id, partition)
    }

    fn point_delete(
        &self,
        collection: &str,
        id: &str,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<Option<()>> {
        self.tick();
        self.inner.point_delete(collection, id, partition)
    }

    fn count(&self, collection: &str, query: Option<&QueryDescriptor>) -> StoreResult<u64> {
        self.tick();
        self.inner.count(collection, query)
    }

    fn upsert(
        &self,
        collection: &str,
        document: Document,
        partition: Option<&PartitionKeyBinding>,
    ) -> StoreResult<()> {
        self.tick();
        self.inner.upsert(collection, document, partition)
    }
}
