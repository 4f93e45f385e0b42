//! Query assembly
//!
//! Binds call arguments into the parsed criteria and freezes the result into
//! an immutable `QueryDescriptor`. No I/O; same inputs give the same
//! descriptor.

use serde_json::Value;

use super::capability::SortSpec;
use crate::error::{QueryError, QueryResult};
use crate::mapping::EntityMetadata;
use crate::paging::PageState;
use crate::query::{Action, PartTree, Predicate, PredicateTree};

/// Immutable, executable description of one call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    collection: String,
    projection: String,
    action: Action,
    tree: PredicateTree,
    sort: SortSpec,
    page: PageState,
}

impl QueryDescriptor {
    /// Target collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Type the results are mapped to
    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn tree(&self) -> &PredicateTree {
        &self.tree
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    /// Same query with a different page
    pub fn with_page(&self, page: PageState) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// Builds descriptors for one entity
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Binds `args` positionally: each criterion consumes `arity` values in order
    pub fn assemble(
        &self,
        part: &PartTree,
        args: &[Value],
        sort: SortSpec,
        page: PageState,
    ) -> QueryResult<QueryDescriptor> {
        let expected = part.criteria.arity();
        if expected != args.len() {
            return Err(QueryError::ArgumentCountMismatch {
                method: part.method.clone(),
                expected,
                actual: args.len(),
            });
        }

        let mut remaining = args.iter();
        let mut predicates = Vec::with_capacity(part.criteria.len());

        for criterion in &part.criteria.criteria {
            let values: Vec<Value> = remaining
                .by_ref()
                .take(criterion.operator.arity())
                .cloned()
                .collect();

            if criterion.operator.takes_collection() && !values.iter().all(Value::is_array) {
                return Err(QueryError::invalid_argument(
                    criterion.property.dotted(),
                    format!("{} requires an array argument", criterion.operator.op_name()),
                ));
            }

            predicates.push(Predicate {
                field: self.metadata.document_field(&criterion.property),
                property: criterion.property.clone(),
                operator: criterion.operator,
                ignore_case: criterion.ignore_case,
                values,
            });
        }

        Ok(QueryDescriptor {
            collection: self.metadata.collection_name().to_string(),
            projection: self.metadata.type_name().to_string(),
            action: part.action,
            tree: PredicateTree {
                connector: part.criteria.connector,
                predicates,
            },
            sort,
            page,
        })
    }
}
