//! Partition key resolution
//!
//! A binding exists iff the tree is AND-connected and every predicate on the
//! partition property is a case-sensitive EQUAL on the same non-null literal
//! (and there is at least one). OR trees never bind.

use serde::Serialize;
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::mapping::{lookup_path, EntityMetadata};
use crate::query::{Connector, Operator, PredicateTree};
use crate::store::Document;

/// Partition key value derived for one call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionKeyBinding {
    property: String,
    field: String,
    value: Value,
}

impl PartitionKeyBinding {
    pub fn new(property: impl Into<String>, field: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            field: field.into(),
            value,
        }
    }

    /// Logical partition property, dotted
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Document field holding the partition value
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Derives partition key bindings for one entity
#[derive(Debug, Clone, Copy)]
pub struct PartitionKeyResolver<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> PartitionKeyResolver<'a> {
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Derives a binding from the bound predicates, if one exists
    pub fn resolve(&self, tree: &PredicateTree) -> Option<PartitionKeyBinding> {
        let key = self.metadata.partition_key()?;
        if tree.connector != Connector::And {
            return None;
        }

        let field = self.metadata.document_field(key);
        let mut literal: Option<Value> = None;

        for predicate in tree.on_field(&field) {
            if predicate.operator != Operator::Equal || predicate.ignore_case {
                return None;
            }
            let value = predicate.literal().filter(|v| !v.is_null())?;
            if literal.as_ref().is_some_and(|previous| previous != value) {
                return None;
            }
            literal.get_or_insert_with(|| value.clone());
        }

        literal.map(|value| PartitionKeyBinding::new(key.dotted(), field, value))
    }

    /// Binding for a point operation.
    ///
    /// `Ok(None)` for entities without a partition key; fails with
    /// `PartitionKeyRequired` when the entity is partitioned and no binding
    /// can be derived.
    pub fn require(&self, tree: &PredicateTree) -> QueryResult<Option<PartitionKeyBinding>> {
        if !self.metadata.is_partitioned() {
            return Ok(None);
        }
        self.resolve(tree)
            .map(Some)
            .ok_or_else(|| self.required())
    }

    /// Binding read from a stored document's own partition value
    pub fn for_document(&self, document: &Document) -> QueryResult<Option<PartitionKeyBinding>> {
        let Some(key) = self.metadata.partition_key() else {
            return Ok(None);
        };
        let field = self.metadata.document_field(key);

        match lookup_path(document, &field) {
            Some(value) if !value.is_null() => Ok(Some(PartitionKeyBinding::new(
                key.dotted(),
                field,
                value.clone(),
            ))),
            _ => Err(self.required()),
        }
    }

    fn required(&self) -> QueryError {
        QueryError::PartitionKeyRequired {
            collection: self.metadata.collection_name().to_string(),
        }
    }
}
