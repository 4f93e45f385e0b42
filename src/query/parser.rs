//! Operation name parser
//!
//! Grammar:
//!
//! ```text
//! <verb>[<Subject>]By<Segment>[(And|Or)<Segment>]*[OrderBy(<Property>[Asc|Desc])+]
//! <Segment> := <PropertyPath>[<Keyword>][IgnoreCase]
//! ```
//!
//! Keywords and connectors only match at camel-case boundaries: the word must
//! be followed by an uppercase letter or the end of the name. Properties are
//! resolved against the entity's property table; nested properties resolve
//! through `_` separators or by camel-case traversal into object properties.

use std::cmp::Reverse;

use super::ast::{Action, Connector, CriteriaTree, Criterion, Operator, PartTree, Subject};
use crate::error::{QueryError, QueryResult};
use crate::mapping::{EntityMetadata, PropertyPath};
use crate::paging::{Direction, Order, Sort};

const VERBS: &[(&str, Action)] = &[
    ("exists", Action::Exists),
    ("count", Action::Count),
    ("delete", Action::Delete),
    ("remove", Action::Delete),
    ("find", Action::Find),
    ("read", Action::Find),
    ("get", Action::Find),
    ("query", Action::Find),
    ("search", Action::Find),
    ("stream", Action::Find),
];

const KEYWORDS: &[(&str, Operator)] = &[
    ("Is", Operator::Equal),
    ("Equals", Operator::Equal),
    ("IsNot", Operator::NotEqual),
    ("Not", Operator::NotEqual),
    ("Containing", Operator::Containing),
    ("IsContaining", Operator::Containing),
    ("Contains", Operator::Containing),
    ("NotContaining", Operator::NotContaining),
    ("IsNotContaining", Operator::NotContaining),
    ("NotContains", Operator::NotContaining),
    ("StartingWith", Operator::StartsWith),
    ("IsStartingWith", Operator::StartsWith),
    ("StartsWith", Operator::StartsWith),
    ("EndingWith", Operator::EndsWith),
    ("IsEndingWith", Operator::EndsWith),
    ("EndsWith", Operator::EndsWith),
    ("In", Operator::In),
    ("IsIn", Operator::In),
    ("NotIn", Operator::NotIn),
    ("IsNotIn", Operator::NotIn),
    ("GreaterThan", Operator::GreaterThan),
    ("IsGreaterThan", Operator::GreaterThan),
    ("GreaterThanEqual", Operator::GreaterThanEqual),
    ("IsGreaterThanEqual", Operator::GreaterThanEqual),
    ("LessThan", Operator::LessThan),
    ("IsLessThan", Operator::LessThan),
    ("LessThanEqual", Operator::LessThanEqual),
    ("IsLessThanEqual", Operator::LessThanEqual),
    ("Before", Operator::Before),
    ("IsBefore", Operator::Before),
    ("After", Operator::After),
    ("IsAfter", Operator::After),
    ("Between", Operator::Between),
    ("IsBetween", Operator::Between),
    ("IsNull", Operator::IsNull),
    ("Null", Operator::IsNull),
    ("IsNotNull", Operator::IsNotNull),
    ("NotNull", Operator::IsNotNull),
    ("True", Operator::True),
    ("IsTrue", Operator::True),
    ("False", Operator::False),
    ("IsFalse", Operator::False),
];

const IGNORE_CASE: &[&str] = &["IgnoringCase", "IgnoreCase"];
const ALL_IGNORE_CASE: &[&str] = &["AllIgnoringCase", "AllIgnoreCase"];

/// Parses operation names for one entity
#[derive(Debug, Clone, Copy)]
pub struct MethodNameParser<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> MethodNameParser<'a> {
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Parses an operation name into an unbound `PartTree`
    pub fn parse(&self, method: &str) -> QueryResult<PartTree> {
        let (action, rest) = split_verb(method)?;

        let (head, order_clause) = match find_boundary(rest, "OrderBy", true) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + "OrderBy".len()..])),
            None => (rest, None),
        };

        let (subject_text, criteria_text) = match find_boundary(head, "By", false) {
            Some(idx) => (&head[..idx], Some(&head[idx + "By".len()..])),
            None => (head, None),
        };

        let subject = parse_subject(method, subject_text)?;

        let criteria = match criteria_text {
            Some("") if order_clause.is_some() => CriteriaTree::default(),
            Some("") => {
                return Err(QueryError::invalid_method(
                    method,
                    "expected criteria after 'By'",
                ))
            }
            Some(text) => self.parse_criteria(method, text)?,
            None => CriteriaTree::default(),
        };

        let order_by = match order_clause {
            Some(clause) => self.parse_order_by(method, clause)?,
            None => Sort::unsorted(),
        };

        Ok(PartTree {
            method: method.to_string(),
            action,
            subject,
            criteria,
            order_by,
        })
    }

    fn parse_criteria(&self, method: &str, text: &str) -> QueryResult<CriteriaTree> {
        let (text, all_ignore_case) = match strip_any_suffix(text, ALL_IGNORE_CASE) {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };

        let mut segments = Vec::new();
        let mut seen_and = false;
        let mut seen_or = false;
        let mut start = 0;
        let mut idx = 0;

        while idx < text.len() {
            if idx > start && is_boundary(text, idx, "And") {
                segments.push(&text[start..idx]);
                seen_and = true;
                idx += "And".len();
                start = idx;
                continue;
            }
            if idx > start && is_boundary(text, idx, "Or") {
                segments.push(&text[start..idx]);
                seen_or = true;
                idx += "Or".len();
                start = idx;
                continue;
            }
            idx += next_char_len(text, idx);
        }
        segments.push(&text[start..]);

        if seen_and && seen_or {
            return Err(QueryError::MixedConnector {
                method: method.to_string(),
            });
        }

        let connector = if seen_or { Connector::Or } else { Connector::And };

        let criteria = segments
            .into_iter()
            .map(|segment| self.parse_segment(method, segment, all_ignore_case))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(CriteriaTree {
            connector,
            criteria,
        })
    }

    fn parse_segment(
        &self,
        method: &str,
        segment: &str,
        all_ignore_case: bool,
    ) -> QueryResult<Criterion> {
        let (body, ignore_case) = match strip_any_suffix(segment, IGNORE_CASE) {
            Some(stripped) => (stripped, true),
            None => (segment, false),
        };

        if body.is_empty() {
            return Err(QueryError::invalid_method(method, "empty predicate segment"));
        }

        let mut candidates: Vec<&(&str, Operator)> = KEYWORDS
            .iter()
            .filter(|(keyword, _)| body.len() > keyword.len() && body.ends_with(keyword))
            .collect();
        candidates.sort_by_key(|(keyword, _)| Reverse(keyword.len()));

        let resolved = candidates
            .into_iter()
            .find_map(|(keyword, operator)| {
                self.resolve(&body[..body.len() - keyword.len()])
                    .map(|path| (path, *operator))
            })
            .or_else(|| self.resolve(body).map(|path| (path, Operator::Equal)));

        let (property, operator) = resolved.ok_or_else(|| {
            QueryError::unknown_property(self.metadata.type_name(), decapitalize(body))
        })?;

        let ignore_case = ignore_case || (all_ignore_case && property.value_type().is_textual());

        Ok(Criterion {
            property,
            operator,
            ignore_case,
        })
    }

    fn parse_order_by(&self, method: &str, clause: &str) -> QueryResult<Sort> {
        if clause.is_empty() {
            return Err(QueryError::invalid_method(
                method,
                "expected a property after 'OrderBy'",
            ));
        }

        let mut orders = Vec::new();
        let mut start = 0;
        let mut idx = 0;

        while idx < clause.len() {
            let direction = if idx > start && is_boundary(clause, idx, "Desc") {
                Some(("Desc", Direction::Desc))
            } else if idx > start && is_boundary(clause, idx, "Asc") {
                Some(("Asc", Direction::Asc))
            } else {
                None
            };

            if let Some((keyword, direction)) = direction {
                orders.push(self.order(&clause[start..idx], direction)?);
                idx += keyword.len();
                start = idx;
                continue;
            }
            idx += next_char_len(clause, idx);
        }

        if start < clause.len() {
            orders.push(self.order(&clause[start..], Direction::Asc)?);
        }

        Ok(orders.into_iter().collect())
    }

    fn order(&self, pascal: &str, direction: Direction) -> QueryResult<Order> {
        let path = self.resolve(pascal).ok_or_else(|| {
            QueryError::unknown_property(self.metadata.type_name(), decapitalize(pascal))
        })?;

        Ok(Order {
            property: path.dotted(),
            direction,
            ignore_case: false,
        })
    }

    /// Resolves a PascalCase property reference to a declared path
    fn resolve(&self, pascal: &str) -> Option<PropertyPath> {
        if pascal.is_empty() {
            return None;
        }

        if pascal.contains('_') {
            let dotted = pascal
                .split('_')
                .map(decapitalize)
                .collect::<Vec<_>>()
                .join(".");
            return self.metadata.properties().resolve(&dotted).cloned();
        }

        self.resolve_from(None, pascal)
    }

    fn resolve_from(&self, prefix: Option<&str>, pascal: &str) -> Option<PropertyPath> {
        let table = self.metadata.properties();

        let direct = join_path(prefix, &decapitalize(pascal));
        if let Some(path) = table.resolve(&direct) {
            return Some(path.clone());
        }

        // Longest head first: `AddressCity` tries `address` + `City`.
        for (idx, ch) in pascal.char_indices().rev() {
            if idx == 0 || !ch.is_uppercase() {
                continue;
            }
            let head = join_path(prefix, &decapitalize(&pascal[..idx]));
            let is_object = table
                .resolve(&head)
                .is_some_and(|path| path.value_type().is_object());
            if is_object {
                if let Some(path) = self.resolve_from(Some(&head), &pascal[idx..]) {
                    return Some(path);
                }
            }
        }

        None
    }
}

fn split_verb(method: &str) -> QueryResult<(Action, &str)> {
    for (verb, action) in VERBS {
        if let Some(rest) = method.strip_prefix(verb) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_uppercase()) {
                return Ok((*action, rest));
            }
        }
    }
    Err(QueryError::invalid_method(
        method,
        "expected a find, exists, count or delete verb",
    ))
}

fn parse_subject(method: &str, subject: &str) -> QueryResult<Subject> {
    let mut parsed = Subject {
        distinct: subject.contains("Distinct"),
        limit: None,
    };

    for marker in ["First", "Top"] {
        let Some(pos) = subject.find(marker) else {
            continue;
        };
        let after = &subject[pos + marker.len()..];
        let digits_len = after.chars().take_while(char::is_ascii_digit).count();
        let tail = &after[digits_len..];
        if !(tail.is_empty() || tail.starts_with(|c: char| c.is_uppercase())) {
            continue;
        }

        let limit = if digits_len == 0 {
            1
        } else {
            after[..digits_len].parse::<u32>().map_err(|_| {
                QueryError::invalid_method(method, format!("invalid {} limit", marker))
            })?
        };
        parsed.limit = Some(limit);
        break;
    }

    Ok(parsed)
}

/// True if `keyword` starts at `idx` and is followed by an uppercase letter or the end
fn is_boundary(text: &str, idx: usize, keyword: &str) -> bool {
    text[idx..].starts_with(keyword)
        && text[idx + keyword.len()..]
            .chars()
            .next()
            .map_or(true, char::is_uppercase)
}

/// First (or last) boundary occurrence of `keyword`
fn find_boundary(text: &str, keyword: &str, last: bool) -> Option<usize> {
    let mut matches = text
        .char_indices()
        .map(|(idx, _)| idx)
        .filter(|idx| is_boundary(text, *idx, keyword));
    if last {
        matches.last()
    } else {
        matches.next()
    }
}

fn next_char_len(text: &str, idx: usize) -> usize {
    text[idx..].chars().next().map_or(1, char::len_utf8)
}

fn strip_any_suffix<'t>(text: &'t str, suffixes: &[&str]) -> Option<&'t str> {
    suffixes.iter().find_map(|suffix| text.strip_suffix(suffix))
}

fn join_path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}

/// `StarCount` -> `starCount`; acronyms such as `URL` are kept as-is
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first
            .to_lowercase()
            .chain(name[first.len_utf8()..].chars())
            .collect(),
        (None, _) => String::new(),
    }
}
