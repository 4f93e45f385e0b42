//! Derived query parsing
//!
//! Turns an operation name such as `findByCreatorAndStarCountGreaterThan`
//! into a `PartTree` resolved against one entity's properties.

mod ast;
mod parser;

pub use ast::{
    Action, Connector, CriteriaTree, Criterion, Operator, PartTree, Predicate, PredicateTree,
    Subject,
};
pub use parser::MethodNameParser;
