//! Result ordering for the in-memory store

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::Document;
use crate::mapping::lookup_path;
use crate::paging::Direction;
use crate::planner::SortSpec;

/// Sorts documents by a validated sort key
pub struct ResultSorter;

impl ResultSorter {
    /// Stable sort; documents missing the key order first (ascending)
    pub fn sort(documents: &mut [Document], spec: &SortSpec) {
        let Some(key) = spec.key() else {
            return;
        };

        documents.sort_by(|a, b| {
            let ordering = Self::total_order(lookup_path(a, key.field()), lookup_path(b, key.field()));
            match key.direction() {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
    }

    /// Ordering rules:
    /// - missing < null < bool < number < string < array < object
    /// - same type: natural ordering, RFC 3339 strings by instant
    fn total_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                type_order(a_val)
                    .cmp(&type_order(b_val))
                    .then_with(|| compare_values(a_val, b_val).unwrap_or(Ordering::Equal))
            }
        }
    }
}

/// Compares two scalars of the same JSON type; `None` if they are not comparable
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(xi), Some(yi)) => Some(xi.cmp(&yi)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(xt), Some(yt)) => Some(xt.cmp(&yt)),
            _ => Some(x.cmp(y)),
        },
        _ => None,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}
