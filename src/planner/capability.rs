//! Capability validation
//!
//! Runs after parsing and before assembly. Rejects shapes the store cannot
//! execute, fail-fast, in this order:
//!
//! 1. Limiting subjects (`First<N>`, `Top<N>`)
//! 2. Criteria on undeclared properties
//! 3. `IgnoreCase` on non-text properties or unsupported operators
//! 4. More than one sort key
//! 5. Case-insensitive sort keys
//! 6. Sort keys on undeclared properties
//! 7. Sort keys on the identifying property
//! 8. Sort keys on non-orderable properties

use crate::error::{QueryError, QueryResult};
use crate::mapping::{EntityMetadata, PropertyPath};
use crate::paging::{Direction, Sort};
use crate::query::PartTree;

/// A validated sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    property: PropertyPath,
    field: String,
    direction: Direction,
}

impl SortKey {
    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    /// Document field the key orders by
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Validated sort specification: at most one key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    key: Option<SortKey>,
}

impl SortSpec {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&SortKey> {
        self.key.as_ref()
    }

    pub fn is_sorted(&self) -> bool {
        self.key.is_some()
    }
}

/// Checks parsed operations and sorts against store capabilities
#[derive(Debug, Clone, Copy)]
pub struct CapabilityValidator<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> CapabilityValidator<'a> {
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Validates the parsed operation and the effective sort.
    ///
    /// Returns the sort in validated form.
    pub fn validate(&self, tree: &PartTree, sort: &Sort) -> QueryResult<SortSpec> {
        self.check_shape(tree)?;
        self.check_criteria(tree)?;
        self.check_sort(sort)
    }

    fn check_shape(&self, tree: &PartTree) -> QueryResult<()> {
        if let Some(limit) = tree.subject.limit {
            return Err(QueryError::UnsupportedQueryShape(format!(
                "Limiting is not supported ('{}' limits to {} result(s))",
                tree.method, limit
            )));
        }
        Ok(())
    }

    fn check_criteria(&self, tree: &PartTree) -> QueryResult<()> {
        for criterion in &tree.criteria.criteria {
            let dotted = criterion.property.dotted();
            if !self.metadata.properties().contains(&dotted) {
                return Err(QueryError::unknown_property(
                    self.metadata.type_name(),
                    dotted,
                ));
            }

            if !criterion.ignore_case {
                continue;
            }
            if !criterion.property.value_type().is_textual() {
                return Err(QueryError::UnsupportedQueryShape(format!(
                    "IgnoreCase is not supported on {} property '{}'",
                    criterion.property.value_type().type_name(),
                    dotted
                )));
            }
            if !criterion.operator.supports_ignore_case() {
                return Err(QueryError::UnsupportedQueryShape(format!(
                    "IgnoreCase is not supported with {} on '{}'",
                    criterion.operator.op_name(),
                    dotted
                )));
            }
        }
        Ok(())
    }

    fn check_sort(&self, sort: &Sort) -> QueryResult<SortSpec> {
        let order = match sort.orders() {
            [] => return Ok(SortSpec::unsorted()),
            [order] => order,
            orders => {
                return Err(QueryError::UnsupportedSortShape(format!(
                    "Multi-property sort is not supported ({} keys requested)",
                    orders.len()
                )))
            }
        };

        if order.ignore_case {
            return Err(QueryError::UnsupportedSortShape(format!(
                "Ignore-case sort is not supported (property '{}')",
                order.property
            )));
        }

        let property = self.metadata.resolve(&order.property)?;

        if self.metadata.is_id(property) {
            return Err(QueryError::UnsupportedSortShape(format!(
                "Sorting by the identifier '{}' is not supported",
                order.property
            )));
        }

        if !property.value_type().is_orderable() {
            return Err(QueryError::UnsupportedSortShape(format!(
                "Cannot sort by {} property '{}'",
                property.value_type().type_name(),
                order.property
            )));
        }

        Ok(SortSpec {
            key: Some(SortKey {
                field: self.metadata.document_field(property),
                property: property.clone(),
                direction: order.direction,
            }),
        })
    }
}
