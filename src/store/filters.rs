//! Predicate evaluation for the in-memory store
//!
//! No type coercion: a string never equals a number. A missing field matches
//! only `IsNull`.

use std::cmp::Ordering;

use serde_json::Value;

use super::sorter::compare_values;
use crate::mapping::lookup_path;
use crate::query::{Connector, Operator, Predicate, PredicateTree};

/// Evaluates predicate trees against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document satisfies the tree; an empty tree matches everything
    pub fn matches(document: &Value, tree: &PredicateTree) -> bool {
        if tree.is_empty() {
            return true;
        }
        let mut results = tree
            .predicates
            .iter()
            .map(|pred| Self::matches_predicate(document, pred));

        match tree.connector {
            Connector::And => results.all(|m| m),
            Connector::Or => results.any(|m| m),
        }
    }

    /// Checks if a document matches a single predicate
    pub fn matches_predicate(document: &Value, predicate: &Predicate) -> bool {
        let actual = lookup_path(document, &predicate.field);

        match predicate.operator {
            Operator::IsNull => return actual.map_or(true, Value::is_null),
            Operator::IsNotNull => return actual.is_some_and(|v| !v.is_null()),
            _ => {}
        }

        let Some(actual) = actual else {
            return false;
        };
        let ic = predicate.ignore_case;
        let arg = predicate.values.first().unwrap_or(&Value::Null);

        match predicate.operator {
            Operator::Equal => Self::eq_match(actual, arg, ic),
            Operator::NotEqual => !Self::eq_match(actual, arg, ic),
            Operator::Containing => Self::contains_match(actual, arg, ic),
            Operator::NotContaining => {
                Self::is_container(actual) && !Self::contains_match(actual, arg, ic)
            }
            Operator::StartsWith => {
                Self::text_match(actual, arg, ic, |a, b| a.starts_with(b))
            }
            Operator::EndsWith => Self::text_match(actual, arg, ic, |a, b| a.ends_with(b)),
            Operator::In => Self::in_match(actual, arg, ic),
            Operator::NotIn => arg.is_array() && !Self::in_match(actual, arg, ic),
            Operator::GreaterThan | Operator::After => {
                Self::cmp_match(actual, arg, |o| o == Ordering::Greater)
            }
            Operator::GreaterThanEqual => {
                Self::cmp_match(actual, arg, |o| o != Ordering::Less)
            }
            Operator::LessThan | Operator::Before => {
                Self::cmp_match(actual, arg, |o| o == Ordering::Less)
            }
            Operator::LessThanEqual => Self::cmp_match(actual, arg, |o| o != Ordering::Greater),
            Operator::Between => {
                let high = predicate.values.get(1).unwrap_or(&Value::Null);
                Self::cmp_match(actual, arg, |o| o != Ordering::Less)
                    && Self::cmp_match(actual, high, |o| o != Ordering::Greater)
            }
            Operator::True => actual == &Value::Bool(true),
            Operator::False => actual == &Value::Bool(false),
            Operator::IsNull | Operator::IsNotNull => false,
        }
    }

    /// Exact equality (no coercion), case-folded for strings when requested
    fn eq_match(actual: &Value, expected: &Value, ignore_case: bool) -> bool {
        match (actual, expected) {
            (Value::String(a), Value::String(b)) if ignore_case => {
                a.to_lowercase() == b.to_lowercase()
            }
            _ => actual == expected,
        }
    }

    fn is_container(value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Array(_))
    }

    /// Substring for strings, element membership for arrays
    fn contains_match(actual: &Value, expected: &Value, ignore_case: bool) -> bool {
        match actual {
            Value::Array(items) => items
                .iter()
                .any(|item| Self::eq_match(item, expected, ignore_case)),
            Value::String(_) => Self::text_match(actual, expected, ignore_case, |a, b| a.contains(b)),
            _ => false,
        }
    }

    fn text_match(
        actual: &Value,
        expected: &Value,
        ignore_case: bool,
        test: impl Fn(&str, &str) -> bool,
    ) -> bool {
        match (actual, expected) {
            (Value::String(a), Value::String(b)) if ignore_case => {
                test(&a.to_lowercase(), &b.to_lowercase())
            }
            (Value::String(a), Value::String(b)) => test(a, b),
            _ => false,
        }
    }

    fn in_match(actual: &Value, candidates: &Value, ignore_case: bool) -> bool {
        candidates.as_array().is_some_and(|items| {
            items
                .iter()
                .any(|candidate| Self::eq_match(actual, candidate, ignore_case))
        })
    }

    fn cmp_match(actual: &Value, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        if actual.is_null() || bound.is_null() {
            return false;
        }
        compare_values(actual, bound).is_some_and(accept)
    }
}
