//! Conversion between domain objects and store documents
//!
//! Documents are JSON objects. The identifying property is written under the
//! store's `id` field and restored on the way back. Store system fields
//! (leading underscore, e.g. `_etag`, `_ts`) that the entity does not declare
//! are dropped when reading.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::entity::{EntityMetadata, ID_FIELD};
use crate::error::{QueryError, QueryResult};
use crate::store::Document;

/// Converts entities of one type to and from documents
#[derive(Debug, Clone, Copy)]
pub struct DocumentConverter<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> DocumentConverter<'a> {
    /// Creates a converter for the given entity
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Maps a domain object to its store representation
    pub fn to_document<T: Serialize>(&self, entity: &T) -> QueryResult<Document> {
        let mut object = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => {
                return Err(QueryError::Conversion(format!(
                    "{} serialized to {}, expected an object",
                    self.metadata.type_name(),
                    json_kind(&other)
                )))
            }
        };

        let id_name = self.metadata.id_property().leaf();
        if id_name != ID_FIELD {
            if let Some(id) = object.remove(id_name) {
                object.insert(ID_FIELD.to_string(), id);
            }
        }

        Ok(Value::Object(object))
    }

    /// Maps a store document back to a domain object
    pub fn from_document<T: DeserializeOwned>(&self, document: Document) -> QueryResult<T> {
        let mut object = match document {
            Value::Object(map) => map,
            other => {
                return Err(QueryError::Conversion(format!(
                    "expected an object document, got {}",
                    json_kind(&other)
                )))
            }
        };

        self.strip_system_fields(&mut object);

        let id_name = self.metadata.id_property().leaf();
        if id_name != ID_FIELD {
            if let Some(id) = object.remove(ID_FIELD) {
                object.insert(id_name.to_string(), id);
            }
        }

        Ok(serde_json::from_value(Value::Object(object))?)
    }

    /// Extracts the document identifier as a string
    pub fn id_of(&self, document: &Document) -> QueryResult<String> {
        match document.get(ID_FIELD) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(QueryError::Conversion(format!(
                "document id must be a string or number, got {}",
                json_kind(other)
            ))),
            None => Err(QueryError::Conversion(format!(
                "{} document has no '{}' field",
                self.metadata.type_name(),
                ID_FIELD
            ))),
        }
    }

    /// Fills a missing or null id with a random UUID.
    ///
    /// Only string identifiers can be generated; any other id type must be
    /// set by the caller.
    pub fn assign_id(&self, document: &mut Document) -> QueryResult<()> {
        let Value::Object(object) = document else {
            return Err(QueryError::Conversion(format!(
                "expected an object document, got {}",
                json_kind(document)
            )));
        };
        if !object.get(ID_FIELD).map_or(true, Value::is_null) {
            return Ok(());
        }

        let id = self.metadata.id_property();
        if !id.value_type().is_textual() {
            return Err(QueryError::Conversion(format!(
                "{} has no '{}' and a {} id cannot be generated",
                self.metadata.type_name(),
                id.dotted(),
                id.value_type().type_name()
            )));
        }
        object.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
        Ok(())
    }

    fn strip_system_fields(&self, object: &mut Map<String, Value>) {
        let properties = self.metadata.properties();
        object.retain(|name, _| !name.starts_with('_') || properties.contains(name));
    }
}

/// Follows a dotted field path into a document
pub fn lookup_path<'d>(document: &'d Value, dotted: &str) -> Option<&'d Value> {
    dotted
        .split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
