//! Entity mapping for docrepo
//!
//! Resolves the property table of a domain type once and maps domain objects
//! to and from store documents.
//!
//! # Lifecycle
//!
//! - `Entity::describe` is called at most once per type per `MappingContext`
//! - The resulting `EntityMetadata` is immutable and shared via `Arc`

mod context;
mod converter;
mod entity;
mod types;

pub use context::MappingContext;
pub use converter::{lookup_path, DocumentConverter};
pub use entity::{Entity, EntityDescriptor, EntityMetadata, ID_FIELD};
pub use types::{PropertyPath, PropertyTable, PropertyType};
