//! Mapping context: per-type metadata cache
//!
//! Metadata for a type is resolved on first use and never mutated afterwards.
//! Concurrent callers share the same `Arc<EntityMetadata>`.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::entity::{Entity, EntityMetadata};
use crate::error::QueryResult;

/// Build-once, read-many registry of entity metadata keyed by type
#[derive(Debug, Default)]
pub struct MappingContext {
    entities: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MappingContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata for `T`, resolving it on first use
    pub fn metadata<T: Entity>(&self) -> QueryResult<Arc<EntityMetadata>> {
        let key = TypeId::of::<T>();

        if let Some(existing) = self
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(existing));
        }

        let resolved = Arc::new(EntityMetadata::from_descriptor(T::describe())?);

        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // A racing caller may have inserted first; keep its instance.
        Ok(Arc::clone(entities.entry(key).or_insert(resolved)))
    }

    /// Returns true if metadata for `T` has been resolved
    pub fn is_registered<T: Entity>(&self) -> bool {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Number of resolved entity types
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no type has been resolved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
