//! Derived Query Tests
//!
//! Operation names compile to predicate trees and run against the store:
//! - AND trees bind arguments positionally, in order
//! - OR trees match any predicate
//! - Every keyword operator filters as named
//! - Nested properties resolve by `_` or camel-case traversal
//! - `OrderBy` clauses sort results

mod common;

use common::*;
use docrepo::mapping::MappingContext;
use docrepo::query::{Connector, Operator};
use docrepo::store::MemoryStore;
use docrepo::{CallArgs, Repository};
use serde_json::{json, Value};

fn ids(found: &[Project]) -> Vec<&str> {
    found.iter().map(|p| p.id.as_str()).collect()
}

fn find(method: &str, args: &[Value]) -> Vec<String> {
    let repo = project_repository();
    repo.find_by(method, args)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

// =============================================================================
// Connectors
// =============================================================================

/// `findByCreatorAndStarCount` yields two EQUAL predicates bound to args 1 and 2.
#[test]
fn test_and_tree_binds_positionally() {
    let repo = project_repository();
    let call = CallArgs::new().arg("alice").arg(30);
    let descriptor = repo
        .engine()
        .assemble("findByCreatorAndStarCount", &call)
        .unwrap();

    let tree = descriptor.tree();
    assert_eq!(tree.connector, Connector::And);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.predicates[0].field, "creator");
    assert_eq!(tree.predicates[0].operator, Operator::Equal);
    assert_eq!(tree.predicates[0].values, vec![json!("alice")]);
    assert_eq!(tree.predicates[1].field, "starCount");
    assert_eq!(tree.predicates[1].operator, Operator::Equal);
    assert_eq!(tree.predicates[1].values, vec![json!(30)]);

    let found = repo
        .find_by("findByCreatorAndStarCount", &[json!("alice"), json!(30)])
        .unwrap();
    assert_eq!(ids(&found), vec!["p3"]);
}

#[test]
fn test_or_tree_matches_any() {
    assert_eq!(
        find("findByCreatorOrStarCount", &[json!("bob"), json!(40)]),
        vec!["p2", "p4"]
    );
}

#[test]
fn test_no_criteria_matches_everything() {
    assert_eq!(find("findAll", &[]).len(), 5);
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_comparisons() {
    assert_eq!(
        find("findByStarCountGreaterThan", &[json!(25)]),
        vec!["p3", "p4", "p5"]
    );
    assert_eq!(
        find("findByStarCountLessThanEqual", &[json!(20)]),
        vec!["p1", "p2"]
    );
    assert_eq!(
        find("findByStarCountBetween", &[json!(20), json!(40)]),
        vec!["p2", "p3", "p4"]
    );
}

#[test]
fn test_in_and_not_in() {
    assert_eq!(
        find("findByCreatorIn", &[json!(["bob", "carol"])]),
        vec!["p2", "p4"]
    );
    assert_eq!(
        find("findByCreatorNotIn", &[json!(["alice", "Alice"])]),
        vec!["p2", "p4"]
    );
}

#[test]
fn test_ignore_case_equality() {
    assert_eq!(find("findByCreator", &[json!("alice")]), vec!["p1", "p3"]);
    assert_eq!(
        find("findByCreatorIgnoreCase", &[json!("ALICE")]),
        vec!["p1", "p3", "p5"]
    );
}

#[test]
fn test_string_operators() {
    assert_eq!(find("findByNameEndsWith", &[json!("p3")]), vec!["p3"]);
    assert_eq!(find("findByNameStartsWith", &[json!("project-")]).len(), 5);
    assert_eq!(
        find("findByCreatorContaining", &[json!("lic")]),
        vec!["p1", "p3", "p5"]
    );
}

#[test]
fn test_array_containing() {
    assert_eq!(
        find("findByTagsContaining", &[json!("tag-1")]),
        vec!["p1", "p3", "p5"]
    );
}

#[test]
fn test_boolean_keywords() {
    assert_eq!(find("findByHasReleasedTrue", &[]), vec!["p1", "p3", "p5"]);
    assert_eq!(find("findByHasReleasedFalse", &[]), vec!["p2", "p4"]);
}

#[test]
fn test_datetime_before_and_after() {
    assert_eq!(
        find("findByCreatedAtBefore", &[json!("2024-02-15T00:00:00Z")]),
        vec!["p1", "p2"]
    );
    assert_eq!(
        find("findByCreatedAtAfter", &[json!("2024-04-15T00:00:00+02:00")]),
        vec!["p5"]
    );
}

#[test]
fn test_null_checks() {
    // documents here carry no hasReleased field
    let engine = project_engine();
    assert_eq!(engine.count("countByHasReleasedIsNull", &CallArgs::new()).unwrap(), 5);
    assert_eq!(engine.count("countByStarCountIsNotNull", &CallArgs::new()).unwrap(), 5);
    assert_eq!(engine.count("countByCreatorIsNull", &CallArgs::new()).unwrap(), 0);
}

// =============================================================================
// Nested properties and ordering
// =============================================================================

#[test]
fn test_nested_property_resolution() {
    let repo: Repository<Contact, MemoryStore> =
        Repository::new(&MappingContext::new(), MemoryStore::new()).unwrap();
    repo.save_all(&[
        contact("c1", "first", 1, "Oslo"),
        contact("c2", "second", 2, "Bergen"),
    ])
    .unwrap();

    let traversed = repo.find_by("findByHomeCity", &[json!("Oslo")]).unwrap();
    let explicit = repo.find_by("findByHome_City", &[json!("Oslo")]).unwrap();

    assert_eq!(traversed, vec![contact("c1", "first", 1, "Oslo")]);
    assert_eq!(traversed, explicit);
}

#[test]
fn test_order_by_clause() {
    assert_eq!(
        find("findByCreatorOrderByStarCountDesc", &[json!("alice")]),
        vec!["p3", "p1"]
    );
    assert_eq!(
        find("findAllOrderByCreatedAtDesc", &[]),
        vec!["p5", "p4", "p3", "p2", "p1"]
    );
}

#[test]
fn test_rendered_query() {
    let repo = project_repository();
    let spec = repo
        .engine()
        .render(
            "findByCreatorAndStarCountGreaterThan",
            &CallArgs::new().arg("alice").arg(10),
        )
        .unwrap();

    assert_eq!(
        spec.text,
        "SELECT * FROM ROOT r WHERE (r.creator = @creator0 AND r.starCount > @starCount1)"
    );
    assert_eq!(spec.parameters.len(), 2);
}

#[test]
fn test_renamed_id_renders_as_id_field() {
    let repo: Repository<Contact, MemoryStore> =
        Repository::new(&MappingContext::new(), MemoryStore::new()).unwrap();
    let spec = repo
        .engine()
        .render("findByLogicId", &CallArgs::new().arg("c1"))
        .unwrap();

    assert_eq!(spec.text, "SELECT * FROM ROOT r WHERE (r.id = @logicId0)");
}
