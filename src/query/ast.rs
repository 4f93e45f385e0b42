//! Derived query AST
//!
//! Parsing produces an unbound `PartTree` (one per operation name, cached).
//! Assembly binds call arguments into a `PredicateTree` (one per call).

use serde_json::Value;

use crate::mapping::PropertyPath;
use crate::paging::Sort;

/// Action selected by the operation verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// find, read, get, query, search, stream
    Find,
    /// exists
    Exists,
    /// count
    Count,
    /// delete, remove
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Find => "find",
            Action::Exists => "exists",
            Action::Count => "count",
            Action::Delete => "delete",
        }
    }
}

/// Logical connector joining the predicates of one operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Comparison operator of a leaf predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Containing,
    NotContaining,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Before,
    After,
    Between,
    IsNull,
    IsNotNull,
    True,
    False,
}

impl Operator {
    /// Number of call arguments the operator consumes
    pub fn arity(&self) -> usize {
        match self {
            Operator::IsNull | Operator::IsNotNull | Operator::True | Operator::False => 0,
            Operator::Between => 2,
            _ => 1,
        }
    }

    /// Returns true for exact equality
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Equal)
    }

    /// Returns true if the operator takes an array argument
    pub fn takes_collection(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Returns true if the operator can honour `IgnoreCase`
    pub fn supports_ignore_case(&self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Containing
                | Operator::NotContaining
                | Operator::StartsWith
                | Operator::EndsWith
                | Operator::In
                | Operator::NotIn
        )
    }

    /// Returns the operator name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::NotEqual => "NOT",
            Operator::Containing => "CONTAINING",
            Operator::NotContaining => "NOT_CONTAINING",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanEqual => "GREATER_THAN_EQUAL",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanEqual => "LESS_THAN_EQUAL",
            Operator::Before => "BEFORE",
            Operator::After => "AFTER",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS_NULL",
            Operator::IsNotNull => "IS_NOT_NULL",
            Operator::True => "TRUE",
            Operator::False => "FALSE",
        }
    }
}

/// Unbound leaf parsed from one name segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    /// Resolved property
    pub property: PropertyPath,
    /// Comparison operator
    pub operator: Operator,
    /// `IgnoreCase` suffix present
    pub ignore_case: bool,
}

/// Unbound criteria with a uniform connector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaTree {
    pub connector: Connector,
    pub criteria: Vec<Criterion>,
}

impl CriteriaTree {
    /// Total number of arguments the criteria consume
    pub fn arity(&self) -> usize {
        self.criteria.iter().map(|c| c.operator.arity()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }
}

/// Subject modifiers between the verb and `By`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subject {
    /// `Distinct` present
    pub distinct: bool,
    /// `First<N>` / `Top<N>` limit
    pub limit: Option<u32>,
}

/// Parsed operation name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTree {
    pub method: String,
    pub action: Action,
    pub subject: Subject,
    pub criteria: CriteriaTree,
    /// `OrderBy` clause, property names dotted
    pub order_by: Sort,
}

impl PartTree {
    /// Returns true for `First<N>` / `Top<N>` shapes
    pub fn is_limiting(&self) -> bool {
        self.subject.limit.is_some()
    }
}

/// Bound leaf predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Resolved property
    pub property: PropertyPath,
    /// Dotted document field the property is stored under
    pub field: String,
    pub operator: Operator,
    pub ignore_case: bool,
    /// Bound values, `operator.arity()` of them
    pub values: Vec<Value>,
}

impl Predicate {
    pub fn is_equality(&self) -> bool {
        self.operator.is_equality()
    }

    pub fn is_case_sensitive(&self) -> bool {
        !self.ignore_case
    }

    /// Single bound literal, if the operator takes exactly one value
    pub fn literal(&self) -> Option<&Value> {
        match self.values.as_slice() {
            [value] => Some(value),
            _ => None,
        }
    }
}

/// Bound predicates with a uniform connector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateTree {
    pub connector: Connector,
    pub predicates: Vec<Predicate>,
}

impl PredicateTree {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Predicates on the given document field
    pub fn on_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Predicate> + 'a {
        self.predicates.iter().filter(move |p| p.field == field)
    }
}
