//! Property types, paths and the per-entity property table
//!
//! Supported property types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - datetime: RFC 3339 timestamp stored as a string
//! - object: Nested object with its own properties
//! - array: Homogeneous array with element type

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of an entity property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// RFC 3339 timestamp
    DateTime,
    /// Nested object
    Object {
        /// Nested property definitions
        fields: BTreeMap<String, PropertyType>,
    },
    /// Homogeneous array
    Array {
        /// Element type
        element_type: Box<PropertyType>,
    },
}

impl PropertyType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
            PropertyType::DateTime => "datetime",
            PropertyType::Object { .. } => "object",
            PropertyType::Array { .. } => "array",
        }
    }

    /// Returns true for nested objects
    pub fn is_object(&self) -> bool {
        matches!(self, PropertyType::Object { .. })
    }

    /// Returns true if values of this type compare as text
    pub fn is_textual(&self) -> bool {
        matches!(self, PropertyType::String)
    }

    /// Returns true if values of this type can order a result set
    pub fn is_orderable(&self) -> bool {
        !matches!(self, PropertyType::Object { .. } | PropertyType::Array { .. })
    }

    /// Create an array type
    pub fn array_of(element_type: PropertyType) -> Self {
        PropertyType::Array {
            element_type: Box::new(element_type),
        }
    }

    /// Create an object type from `(name, type)` pairs
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyType)>,
        K: Into<String>,
    {
        PropertyType::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Resolved path from the entity root to a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
    value_type: PropertyType,
}

impl PropertyPath {
    /// Creates a path from its segments and resolved type
    pub fn new(segments: Vec<String>, value_type: PropertyType) -> Self {
        Self {
            segments,
            value_type,
        }
    }

    /// Path segments, root first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Resolved value type
    pub fn value_type(&self) -> &PropertyType {
        &self.value_type
    }

    /// Returns true if the path traverses a nested object
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Dotted rendering, e.g. `address.city`
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

/// Lookup from dotted property path to resolved path.
///
/// Nested object properties are flattened at construction, so `address` and
/// `address.city` are both present. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable {
    paths: BTreeMap<String, PropertyPath>,
}

impl PropertyTable {
    /// Builds the table from top-level property declarations
    pub fn build<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a PropertyType)>,
    {
        let mut paths = BTreeMap::new();
        for (name, ty) in properties {
            Self::insert_recursive(&mut paths, Vec::new(), name, ty);
        }
        Self { paths }
    }

    fn insert_recursive(
        paths: &mut BTreeMap<String, PropertyPath>,
        parent: Vec<String>,
        name: &str,
        ty: &PropertyType,
    ) {
        let mut segments = parent;
        segments.push(name.to_string());

        if let PropertyType::Object { fields } = ty {
            for (child, child_ty) in fields {
                Self::insert_recursive(paths, segments.clone(), child, child_ty);
            }
        }

        let path = PropertyPath::new(segments, ty.clone());
        paths.insert(path.dotted(), path);
    }

    /// Resolves a dotted path
    pub fn resolve(&self, dotted: &str) -> Option<&PropertyPath> {
        self.paths.get(dotted)
    }

    /// Checks if a dotted path is declared
    pub fn contains(&self, dotted: &str) -> bool {
        self.paths.contains_key(dotted)
    }

    /// Number of resolvable paths (nested paths included)
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no property is declared
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates paths in dotted order
    pub fn iter(&self) -> impl Iterator<Item = &PropertyPath> {
        self.paths.values()
    }
}
