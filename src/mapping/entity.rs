//! Entity description and resolved entity metadata
//!
//! A domain type registers itself by implementing [`Entity::describe`]. The
//! returned [`EntityDescriptor`] is resolved once into [`EntityMetadata`] and
//! shared read-only afterwards.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::{PropertyPath, PropertyTable, PropertyType};
use crate::error::{QueryError, QueryResult};

/// Document field holding the identifier in store representation
pub const ID_FIELD: &str = "id";

/// A domain type stored as a document
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Describes the entity's collection, identifier, partition key and properties
    fn describe() -> EntityDescriptor;
}

/// Declarative entity description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Simple type name
    pub name: String,
    /// Collection name (defaults to `name`)
    #[serde(default)]
    pub collection: Option<String>,
    /// Identifying property
    #[serde(default = "default_id_property")]
    pub id: String,
    /// Partition key property (dotted path), if the collection is partitioned
    #[serde(default)]
    pub partition_key: Option<String>,
    /// Top-level properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyType>,
}

fn default_id_property() -> String {
    ID_FIELD.to_string()
}

impl EntityDescriptor {
    /// Starts a descriptor for the given type name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            id: default_id_property(),
            partition_key: None,
            properties: BTreeMap::new(),
        }
    }

    /// Overrides the collection name
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the identifying property
    pub fn id(mut self, property: impl Into<String>) -> Self {
        self.id = property.into();
        self
    }

    /// Sets the partition key property
    pub fn partition_key(mut self, property: impl Into<String>) -> Self {
        self.partition_key = Some(property.into());
        self
    }

    /// Declares a property
    pub fn property(mut self, name: impl Into<String>, ty: PropertyType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }
}

/// Resolved, immutable entity metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    type_name: String,
    collection_name: String,
    id_property: PropertyPath,
    partition_key: Option<PropertyPath>,
    properties: PropertyTable,
}

impl EntityMetadata {
    /// Resolves a descriptor, checking that the id and partition key are declared
    pub fn from_descriptor(descriptor: EntityDescriptor) -> QueryResult<Self> {
        let properties = PropertyTable::build(&descriptor.properties);

        let id_property = properties
            .resolve(&descriptor.id)
            .cloned()
            .ok_or_else(|| QueryError::unknown_property(&descriptor.name, &descriptor.id))?;

        if id_property.is_nested() {
            return Err(QueryError::UnsupportedQueryShape(format!(
                "identifier '{}' must be a top-level property",
                id_property
            )));
        }

        let partition_key = match &descriptor.partition_key {
            Some(key) => Some(
                properties
                    .resolve(key)
                    .cloned()
                    .ok_or_else(|| QueryError::unknown_property(&descriptor.name, key))?,
            ),
            None => None,
        };

        Ok(Self {
            collection_name: descriptor
                .collection
                .unwrap_or_else(|| descriptor.name.clone()),
            type_name: descriptor.name,
            id_property,
            partition_key,
            properties,
        })
    }

    /// Simple type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Collection the entity is stored in
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Identifying property
    pub fn id_property(&self) -> &PropertyPath {
        &self.id_property
    }

    /// Partition key property, if any
    pub fn partition_key(&self) -> Option<&PropertyPath> {
        self.partition_key.as_ref()
    }

    /// Returns true if the collection is partitioned
    pub fn is_partitioned(&self) -> bool {
        self.partition_key.is_some()
    }

    /// Property table
    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// Resolves a dotted property path or fails with `UnknownProperty`
    pub fn resolve(&self, dotted: &str) -> QueryResult<&PropertyPath> {
        self.properties
            .resolve(dotted)
            .ok_or_else(|| QueryError::unknown_property(&self.type_name, dotted))
    }

    /// Returns true if the path is the identifying property
    pub fn is_id(&self, path: &PropertyPath) -> bool {
        path.segments() == self.id_property.segments()
    }

    /// Returns true if the path is the partition key property
    pub fn is_partition_key(&self, path: &PropertyPath) -> bool {
        self.partition_key
            .as_ref()
            .is_some_and(|key| key.segments() == path.segments())
    }

    /// Document field for a property path.
    ///
    /// The identifying property is always stored under `id`.
    pub fn document_field(&self, path: &PropertyPath) -> String {
        if self.is_id(path) {
            ID_FIELD.to_string()
        } else {
            path.dotted()
        }
    }
}
