//! Parameterized query text
//!
//! Renders a descriptor into the store's SQL dialect:
//!
//! ```text
//! SELECT * FROM ROOT r WHERE (r.city = @city0 AND r.starCount > @starCount1) ORDER BY r.name ASC
//! ```
//!
//! Values never appear in the text; each one is bound to a named parameter.
//! Parameter names are `@<leaf><position>` so identical descriptors render
//! identical output.

use serde::Serialize;
use serde_json::Value;

use super::assembler::QueryDescriptor;
use crate::mapping::PropertyType;
use crate::query::{Action, Operator, Predicate};

const ROOT_ALIAS: &str = "r";

/// One named query parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

/// Rendered query text plus its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuerySpec {
    pub text: String,
    pub parameters: Vec<SqlParameter>,
}

/// Renders a descriptor
pub fn render(descriptor: &QueryDescriptor) -> SqlQuerySpec {
    let mut renderer = Renderer::default();

    let mut text = match descriptor.action() {
        Action::Count => format!("SELECT VALUE COUNT(1) FROM ROOT {}", ROOT_ALIAS),
        _ => format!("SELECT * FROM ROOT {}", ROOT_ALIAS),
    };

    let tree = descriptor.tree();
    if !tree.is_empty() {
        let separator = format!(" {} ", tree.connector.as_str());
        let conditions: Vec<String> = tree
            .predicates
            .iter()
            .map(|predicate| renderer.condition(predicate))
            .collect();
        text.push_str(&format!(" WHERE ({})", conditions.join(&separator)));
    }

    if descriptor.action() != Action::Count {
        if let Some(key) = descriptor.sort().key() {
            text.push_str(&format!(
                " ORDER BY {} {}",
                field_ref(key.field()),
                key.direction().as_str()
            ));
        }
    }

    SqlQuerySpec {
        text,
        parameters: renderer.parameters,
    }
}

#[derive(Default)]
struct Renderer {
    parameters: Vec<SqlParameter>,
}

impl Renderer {
    fn condition(&mut self, predicate: &Predicate) -> String {
        let field = field_ref(&predicate.field);
        let ic = predicate.ignore_case;

        match predicate.operator {
            Operator::Equal | Operator::NotEqual => {
                let op = if predicate.operator == Operator::Equal { "=" } else { "!=" };
                let param = self.bind(predicate, 0);
                if ic {
                    format!("UPPER({}) {} UPPER({})", field, op, param)
                } else {
                    format!("{} {} {}", field, op, param)
                }
            }
            Operator::Containing | Operator::NotContaining => {
                let negate = if predicate.operator == Operator::NotContaining { "NOT " } else { "" };
                let param = self.bind(predicate, 0);
                if matches!(predicate.property.value_type(), PropertyType::Array { .. }) {
                    format!("{}ARRAY_CONTAINS({}, {})", negate, field, param)
                } else {
                    format!("{}CONTAINS({}, {}{})", negate, field, param, ic_flag(ic))
                }
            }
            Operator::StartsWith => {
                let param = self.bind(predicate, 0);
                format!("STARTSWITH({}, {}{})", field, param, ic_flag(ic))
            }
            Operator::EndsWith => {
                let param = self.bind(predicate, 0);
                format!("ENDSWITH({}, {}{})", field, param, ic_flag(ic))
            }
            Operator::In | Operator::NotIn => {
                let negate = if predicate.operator == Operator::NotIn { "NOT " } else { "" };
                if ic {
                    let upper = predicate.values.first().map_or(Value::Null, upper_strings);
                    let param = self.bind_value(predicate, upper);
                    format!("{}ARRAY_CONTAINS({}, UPPER({}))", negate, param, field)
                } else {
                    let param = self.bind(predicate, 0);
                    format!("{}ARRAY_CONTAINS({}, {})", negate, param, field)
                }
            }
            Operator::GreaterThan | Operator::After => {
                format!("{} > {}", field, self.bind(predicate, 0))
            }
            Operator::GreaterThanEqual => format!("{} >= {}", field, self.bind(predicate, 0)),
            Operator::LessThan | Operator::Before => {
                format!("{} < {}", field, self.bind(predicate, 0))
            }
            Operator::LessThanEqual => format!("{} <= {}", field, self.bind(predicate, 0)),
            Operator::Between => {
                let low = self.bind(predicate, 0);
                let high = self.bind(predicate, 1);
                format!("({} >= {} AND {} <= {})", field, low, field, high)
            }
            Operator::IsNull => format!("(NOT IS_DEFINED({f}) OR IS_NULL({f}))", f = field),
            Operator::IsNotNull => format!("(IS_DEFINED({f}) AND NOT IS_NULL({f}))", f = field),
            Operator::True => format!("{} = true", field),
            Operator::False => format!("{} = false", field),
        }
    }

    fn bind(&mut self, predicate: &Predicate, index: usize) -> String {
        let value = predicate.values.get(index).cloned().unwrap_or(Value::Null);
        self.bind_value(predicate, value)
    }

    fn bind_value(&mut self, predicate: &Predicate, value: Value) -> String {
        let leaf: String = predicate
            .property
            .leaf()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        let name = format!("@{}{}", leaf, self.parameters.len());
        self.parameters.push(SqlParameter {
            name: name.clone(),
            value,
        });
        name
    }
}

fn ic_flag(ignore_case: bool) -> &'static str {
    if ignore_case {
        ", true"
    } else {
        ""
    }
}

fn upper_strings(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        Value::Array(items) => Value::Array(items.iter().map(upper_strings).collect()),
        other => other.clone(),
    }
}

/// `r.address.city`, or `r["fake-name"]` for segments that are not identifiers
fn field_ref(dotted: &str) -> String {
    let mut out = String::from(ROOT_ALIAS);
    for segment in dotted.split('.') {
        if is_identifier(segment) {
            out.push('.');
            out.push_str(segment);
        } else {
            out.push_str("[\"");
            out.push_str(&segment.replace('\\', "\\\\").replace('"', "\\\""));
            out.push_str("\"]");
        }
    }
    out
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityDescriptor, EntityMetadata};
    use crate::paging::{Order, Sort, SortPageBuilder};
    use crate::planner::{CapabilityValidator, QueryAssembler};
    use crate::query::MethodNameParser;
    use serde_json::json;

    fn project() -> EntityMetadata {
        EntityMetadata::from_descriptor(
            EntityDescriptor::new("Project")
                .property("id", PropertyType::String)
                .property("name", PropertyType::String)
                .property("creator", PropertyType::String)
                .property("starCount", PropertyType::Int)
                .property("hasReleasedVersion", PropertyType::Bool)
                .property("tags", PropertyType::array_of(PropertyType::String))
                .property("fake-name", PropertyType::String)
                .property(
                    "address",
                    PropertyType::object([("city", PropertyType::String)]),
                ),
        )
        .unwrap()
    }

    fn rendered(method: &str, args: Vec<Value>, sort: Sort) -> SqlQuerySpec {
        let meta = project();
        let part = MethodNameParser::new(&meta).parse(method).unwrap();
        let spec = CapabilityValidator::new(&meta).validate(&part, &sort).unwrap();
        let page = SortPageBuilder::new(100).build();
        let descriptor = QueryAssembler::new(&meta)
            .assemble(&part, &args, spec, page)
            .unwrap();
        render(&descriptor)
    }

    #[test]
    fn test_and_with_order_by() {
        let spec = rendered(
            "findByCreatorAndStarCountGreaterThan",
            vec![json!("alice"), json!(10)],
            Sort::by(Order::asc("name")),
        );

        assert_eq!(
            spec.text,
            "SELECT * FROM ROOT r WHERE (r.creator = @creator0 AND r.starCount > @starCount1) ORDER BY r.name ASC"
        );
        assert_eq!(spec.parameters[0].name, "@creator0");
        assert_eq!(spec.parameters[0].value, json!("alice"));
        assert_eq!(spec.parameters[1].value, json!(10));
    }

    #[test]
    fn test_no_criteria() {
        let spec = rendered("findAll", vec![], Sort::unsorted());
        assert_eq!(spec.text, "SELECT * FROM ROOT r");
        assert!(spec.parameters.is_empty());
    }

    #[test]
    fn test_count_has_no_order_by() {
        let spec = rendered("countByCreator", vec![json!("alice")], Sort::by(Order::desc("name")));
        assert_eq!(
            spec.text,
            "SELECT VALUE COUNT(1) FROM ROOT r WHERE (r.creator = @creator0)"
        );
    }

    #[test]
    fn test_or_connector() {
        let spec = rendered(
            "findByNameOrCreator",
            vec![json!("a"), json!("b")],
            Sort::unsorted(),
        );
        assert!(spec.text.contains("(r.name = @name0 OR r.creator = @creator1)"));
    }

    #[test]
    fn test_ignore_case_functions() {
        let spec = rendered("findByNameIgnoreCase", vec![json!("x")], Sort::unsorted());
        assert!(spec.text.contains("UPPER(r.name) = UPPER(@name0)"));

        let spec = rendered("findByNameStartsWithIgnoreCase", vec![json!("x")], Sort::unsorted());
        assert!(spec.text.contains("STARTSWITH(r.name, @name0, true)"));
    }

    #[test]
    fn test_between_and_in() {
        let spec = rendered(
            "findByStarCountBetweenAndCreatorIn",
            vec![json!(1), json!(5), json!(["a", "b"])],
            Sort::unsorted(),
        );
        assert!(spec
            .text
            .contains("(r.starCount >= @starCount0 AND r.starCount <= @starCount1)"));
        assert!(spec.text.contains("ARRAY_CONTAINS(@creator2, r.creator)"));
        assert_eq!(spec.parameters.len(), 3);
    }

    #[test]
    fn test_array_containing_and_booleans() {
        let spec = rendered(
            "findByTagsContainingAndHasReleasedVersionTrue",
            vec![json!("rust")],
            Sort::unsorted(),
        );
        assert!(spec.text.contains("ARRAY_CONTAINS(r.tags, @tags0)"));
        assert!(spec.text.contains("r.hasReleasedVersion = true"));
    }

    #[test]
    fn test_nested_and_quoted_fields() {
        let spec = rendered("findByAddressCity", vec![json!("Oslo")], Sort::unsorted());
        assert!(spec.text.contains("r.address.city = @city0"));

        assert_eq!(field_ref("fake-name"), "r[\"fake-name\"]");
    }

    #[test]
    fn test_null_checks() {
        let spec = rendered("findByCreatorIsNull", vec![], Sort::unsorted());
        assert!(spec
            .text
            .contains("(NOT IS_DEFINED(r.creator) OR IS_NULL(r.creator))"));
    }

    #[test]
    fn test_render_deterministic() {
        let a = rendered("findByNameAndCreator", vec![json!("n"), json!("c")], Sort::unsorted());
        let b = rendered("findByNameAndCreator", vec![json!("n"), json!("c")], Sort::unsorted());
        assert_eq!(a, b);
    }
}
