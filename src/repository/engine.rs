//! Untyped query engine over one entity's documents
//!
//! Call path for a derived operation:
//! 1. `prepare`: parse the operation name (cached per name)
//! 2. `assemble`: sort/page spec, capability validation, argument binding
//! 3. execute through the pagination adapter
//!
//! Every rejection is counted and logged as `QUERY_REJECTED` before it is
//! returned; rejected calls never reach the store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{QueryError, QueryResult};
use crate::executor::{PaginationAdapter, Pages};
use crate::mapping::{DocumentConverter, EntityMetadata};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::paging::{Page, PageRequest, Sort, SortPageBuilder};
use crate::planner::{
    render, CapabilityValidator, ExplainPlan, PartitionKeyBinding, PartitionKeyResolver,
    QueryAssembler, QueryDescriptor, SqlQuerySpec,
};
use crate::query::{Action, Connector, MethodNameParser, Operator, PartTree, Predicate, PredicateTree};
use crate::store::{Document, DocumentStore, StoreError};

/// Call-site inputs of a derived operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    args: Vec<Value>,
    sort: Option<Sort>,
    page: Option<PageRequest>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional arguments, in predicate order
    pub fn with_args(args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Appends one positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Explicit sort; overrides the page request's sort and the name's `OrderBy`
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> Option<&PageRequest> {
        self.page.as_ref()
    }
}

/// Result of `invoke`, shaped by the operation's verb
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<D = Document> {
    Found(Page<D>),
    Exists(bool),
    Count(u64),
    Deleted(u64),
}

/// Derives and runs operations for one entity against a store
pub struct QueryEngine<S> {
    metadata: Arc<EntityMetadata>,
    store: S,
    config: EngineConfig,
    metrics: Arc<MetricsRegistry>,
    prepared: RwLock<HashMap<String, Arc<PartTree>>>,
}

impl<S: DocumentStore> QueryEngine<S> {
    /// Engine with the default configuration
    pub fn new(metadata: Arc<EntityMetadata>, store: S) -> Self {
        Self::with_config(metadata, store, EngineConfig::default())
    }

    pub fn with_config(metadata: Arc<EntityMetadata>, store: S, config: EngineConfig) -> Self {
        Self {
            metadata,
            store,
            config,
            metrics: Arc::new(MetricsRegistry::new()),
            prepared: RwLock::new(HashMap::new()),
        }
    }

    /// Shares a metrics registry with other engines
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Parses an operation name, reusing the cached tree on later calls
    pub fn prepare(&self, method: &str) -> QueryResult<Arc<PartTree>> {
        if let Some(tree) = self
            .prepared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
        {
            return Ok(Arc::clone(tree));
        }

        let tree = MethodNameParser::new(&self.metadata)
            .parse(method)
            .map(Arc::new)
            .map_err(|err| self.rejected(method, err))?;

        self.metrics.increment_queries_parsed();
        log_event_with_fields(
            Event::QueryParsed,
            &[
                ("action", tree.action.as_str()),
                ("criteria", &tree.criteria.len().to_string()),
                ("entity", self.metadata.type_name()),
                ("method", method),
            ],
        );

        let mut prepared = self
            .prepared
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(prepared.entry(method.to_string()).or_insert(tree)))
    }

    /// Builds the descriptor for one call
    pub fn assemble(&self, method: &str, call: &CallArgs) -> QueryResult<QueryDescriptor> {
        let tree = self.prepare(method)?;

        let page = SortPageBuilder::new(self.config.default_page_size)
            .name_sort(&tree.order_by)
            .explicit_sort(call.sort())
            .page(call.page())
            .build();

        let descriptor = CapabilityValidator::new(&self.metadata)
            .validate(&tree, page.sort())
            .and_then(|sort| {
                QueryAssembler::new(&self.metadata).assemble(&tree, call.args(), sort, page)
            })
            .map_err(|err| self.rejected(method, err))?;

        log_event_with_fields(
            Event::QueryAssembled,
            &[
                ("collection", descriptor.collection()),
                ("method", method),
                ("page_size", &descriptor.page().page_size().to_string()),
            ],
        );
        Ok(descriptor)
    }

    /// Rendered store query for one call
    pub fn render(&self, method: &str, call: &CallArgs) -> QueryResult<SqlQuerySpec> {
        Ok(render(&self.assemble(method, call)?))
    }

    /// Explain plan for one call; rejections are described, not returned
    pub fn explain(&self, method: &str, call: &CallArgs) -> ExplainPlan {
        match self.assemble(method, call) {
            Ok(descriptor) => {
                let binding = self.resolver().resolve(descriptor.tree());
                ExplainPlan::from_descriptor(&descriptor, binding)
            }
            Err(err) => ExplainPlan::from_error(&err),
        }
    }

    /// One page: the requested one, or the first page at the default size
    pub fn find(&self, method: &str, call: &CallArgs) -> QueryResult<Page<Document>> {
        let descriptor = self.assemble_for(Action::Find, method, call)?;
        self.adapter().fetch_page(&descriptor)
    }

    /// Lazy iterator over every page from the requested one onwards
    pub fn find_all(&self, method: &str, call: &CallArgs) -> QueryResult<Pages<'_, S>> {
        let descriptor = self.assemble_for(Action::Find, method, call)?;
        Ok(self.adapter().pages(descriptor))
    }

    pub fn exists(&self, method: &str, call: &CallArgs) -> QueryResult<bool> {
        let descriptor = self.assemble_for(Action::Exists, method, call)?;
        self.adapter().exists(&descriptor)
    }

    pub fn count(&self, method: &str, call: &CallArgs) -> QueryResult<u64> {
        let descriptor = self.assemble_for(Action::Count, method, call)?;
        self.adapter().count(&descriptor)
    }

    /// Deletes every match; the predicates must bind the partition key
    pub fn delete(&self, method: &str, call: &CallArgs) -> QueryResult<u64> {
        let descriptor = self.assemble_for(Action::Delete, method, call)?;
        self.resolver()
            .require(descriptor.tree())
            .map_err(|err| self.rejected(method, err))?;
        self.adapter().delete(&descriptor, &self.metadata)
    }

    /// Runs the operation named by `method`, dispatching on its verb
    pub fn invoke(&self, method: &str, call: &CallArgs) -> QueryResult<Outcome> {
        match self.prepare(method)?.action {
            Action::Find => self.find(method, call).map(Outcome::Found),
            Action::Exists => self.exists(method, call).map(Outcome::Exists),
            Action::Count => self.count(method, call).map(Outcome::Count),
            Action::Delete => self.delete(method, call).map(Outcome::Deleted),
        }
    }

    /// Reads one document by id within the given partition
    pub fn point_read(&self, id: &str, partition: Option<&Value>) -> QueryResult<Option<Document>> {
        let binding = self.point_binding("findById", partition)?;
        self.adapter()
            .point_read(self.metadata.collection_name(), id, binding.as_ref())
    }

    /// Deletes one document by id; a missing document is `NotFound`
    pub fn point_delete(&self, id: &str, partition: Option<&Value>) -> QueryResult<()> {
        let binding = self.point_binding("deleteById", partition)?;
        self.delete_one(id, binding.as_ref())
    }

    /// Deletes the stored copy of `document`, located by its own id and
    /// partition value
    pub fn delete_document(&self, document: &Document) -> QueryResult<()> {
        let id = DocumentConverter::new(&self.metadata).id_of(document)?;
        let binding = self
            .resolver()
            .for_document(document)
            .map_err(|err| self.rejected("delete", err))?;
        self.delete_one(&id, binding.as_ref())
    }

    /// Documents with any of the given ids, across all partitions
    pub fn find_by_ids(&self, ids: &[&str]) -> QueryResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let method = format!("findBy{}In", capitalize(self.metadata.id_property().leaf()));
        let ids: Vec<Value> = ids.iter().map(|id| Value::from(*id)).collect();

        let mut documents = Vec::new();
        for page in self.find_all(&method, &CallArgs::new().arg(ids))? {
            documents.extend(page?.into_items());
        }
        Ok(documents)
    }

    /// Inserts or replaces a document in the partition it names
    pub fn upsert(&self, document: Document) -> QueryResult<()> {
        let binding = self.resolver().for_document(&document)?;
        self.adapter()
            .upsert(self.metadata.collection_name(), document, binding.as_ref())
    }

    pub fn count_all(&self) -> QueryResult<u64> {
        self.adapter().count_all(self.metadata.collection_name())
    }

    /// Deletes every document, each within its own partition
    pub fn delete_all(&self) -> QueryResult<u64> {
        let descriptor = self.assemble("deleteAll", &CallArgs::new())?;
        self.adapter().delete(&descriptor, &self.metadata)
    }

    fn adapter(&self) -> PaginationAdapter<'_, S> {
        PaginationAdapter::new(&self.store, &self.metrics)
    }

    fn resolver(&self) -> PartitionKeyResolver<'_> {
        PartitionKeyResolver::new(&self.metadata)
    }

    fn delete_one(&self, id: &str, binding: Option<&PartitionKeyBinding>) -> QueryResult<()> {
        let collection = self.metadata.collection_name();
        self.adapter()
            .point_delete(collection, id, binding)?
            .ok_or_else(|| {
                QueryError::StoreAccess(StoreError::NotFound(format!(
                    "document '{}' in '{}'",
                    id, collection
                )))
            })
    }

    fn assemble_for(&self, action: Action, method: &str, call: &CallArgs) -> QueryResult<QueryDescriptor> {
        let descriptor = self.assemble(method, call)?;
        if descriptor.action() != action {
            return Err(self.rejected(
                method,
                QueryError::invalid_method(
                    method,
                    format!(
                        "is a {} operation, not {}",
                        descriptor.action().as_str(),
                        action.as_str()
                    ),
                ),
            ));
        }
        Ok(descriptor)
    }

    /// Binding for a point operation from an explicit partition value
    fn point_binding(&self, method: &str, partition: Option<&Value>) -> QueryResult<Option<PartitionKeyBinding>> {
        let tree = PredicateTree {
            connector: Connector::And,
            predicates: self
                .metadata
                .partition_key()
                .zip(partition)
                .map(|(key, value)| Predicate {
                    field: self.metadata.document_field(key),
                    property: key.clone(),
                    operator: Operator::Equal,
                    ignore_case: false,
                    values: vec![value.clone()],
                })
                .into_iter()
                .collect(),
        };
        self.resolver()
            .require(&tree)
            .map_err(|err| self.rejected(method, err))
    }

    fn rejected(&self, method: &str, err: QueryError) -> QueryError {
        self.metrics.increment_queries_rejected();
        log_event_with_fields(
            Event::QueryRejected,
            &[
                ("code", err.code()),
                ("entity", self.metadata.type_name()),
                ("method", method),
                ("reason", &err.to_string()),
            ],
        );
        err
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityDescriptor, PropertyType};
    use crate::paging::Order;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn address() -> Arc<EntityMetadata> {
        Arc::new(
            EntityMetadata::from_descriptor(
                EntityDescriptor::new("Address")
                    .id("postalCode")
                    .partition_key("city")
                    .property("postalCode", PropertyType::String)
                    .property("street", PropertyType::String)
                    .property("city", PropertyType::String),
            )
            .unwrap(),
        )
    }

    fn engine() -> QueryEngine<MemoryStore> {
        let store = MemoryStore::new();
        store.create_collection("Address", Some("city"));
        for (id, street, city) in [
            ("1", "Main", "Oslo"),
            ("2", "High", "Oslo"),
            ("3", "Low", "Bergen"),
        ] {
            store
                .insert("Address", json!({"id": id, "street": street, "city": city}))
                .unwrap();
        }
        QueryEngine::new(address(), store)
    }

    #[test]
    fn test_prepare_caches_per_name() {
        let engine = engine();
        let first = engine.prepare("findByCity").unwrap();
        let second = engine.prepare("findByCity").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.metrics().snapshot().queries_parsed, 1);
    }

    #[test]
    fn test_rejection_is_counted() {
        let engine = engine();
        let err = engine.prepare("findByZip").unwrap_err();

        assert_eq!(err.code(), "DOCREPO_UNKNOWN_PROPERTY");
        assert_eq!(engine.metrics().snapshot().queries_rejected, 1);
    }

    #[test]
    fn test_find_single_page() {
        let engine = engine();
        let page = engine
            .find("findByCity", &CallArgs::new().arg("Oslo"))
            .unwrap();

        assert_eq!(page.len(), 2);
        assert!(page.is_last());
    }

    #[test]
    fn test_explicit_sort_overrides_name_sort() {
        let engine = engine();
        let call = CallArgs::new().with_sort(Sort::by(Order::asc("street")));
        let descriptor = engine.assemble("findAllOrderByStreetDesc", &call).unwrap();

        let key = descriptor.sort().key().unwrap();
        assert_eq!(key.field(), "street");
        assert_eq!(key.direction().as_str(), "ASC");
    }

    #[test]
    fn test_verb_mismatch_rejected() {
        let engine = engine();
        let err = engine
            .delete("findByCity", &CallArgs::new().arg("Oslo"))
            .unwrap_err();

        assert_eq!(err.code(), "DOCREPO_INVALID_METHOD_NAME");
        assert_eq!(engine.store().len("Address"), 3);
    }

    #[test]
    fn test_invoke_dispatches_on_verb() {
        let engine = engine();
        let oslo = CallArgs::new().arg("Oslo");

        assert_eq!(engine.invoke("countByCity", &oslo).unwrap(), Outcome::Count(2));
        assert_eq!(engine.invoke("existsByCity", &oslo).unwrap(), Outcome::Exists(true));
        match engine.invoke("findByCity", &oslo).unwrap() {
            Outcome::Found(page) => assert_eq!(page.len(), 2),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(engine.invoke("deleteByCity", &oslo).unwrap(), Outcome::Deleted(2));
        assert_eq!(engine.count_all().unwrap(), 1);
    }

    #[test]
    fn test_delete_without_partition_equality_rejected() {
        let engine = engine();
        let err = engine
            .delete("deleteByStreet", &CallArgs::new().arg("Main"))
            .unwrap_err();

        assert!(matches!(err, QueryError::PartitionKeyRequired { .. }));
        assert_eq!(engine.store().len("Address"), 3);
    }

    #[test]
    fn test_point_read_requires_partition() {
        let engine = engine();

        let err = engine.point_read("1", None).unwrap_err();
        assert!(matches!(err, QueryError::PartitionKeyRequired { .. }));

        let found = engine.point_read("1", Some(&json!("Oslo"))).unwrap();
        assert_eq!(found.unwrap()["street"], "Main");
        assert!(engine.point_read("1", Some(&json!("Bergen"))).unwrap().is_none());
    }

    #[test]
    fn test_point_delete_missing_is_not_found() {
        let engine = engine();
        engine.point_delete("3", Some(&json!("Bergen"))).unwrap();

        let err = engine.point_delete("3", Some(&json!("Bergen"))).unwrap_err();
        assert!(matches!(err, QueryError::StoreAccess(StoreError::NotFound(_))));
    }

    #[test]
    fn test_find_by_ids_crosses_partitions() {
        let engine = engine();
        let mut ids: Vec<String> = engine
            .find_by_ids(&["1", "3", "9"])
            .unwrap()
            .iter()
            .map(|doc| doc["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();

        assert_eq!(ids, vec!["1", "3"]);
        assert!(engine.find_by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_delete_document_uses_its_partition() {
        let engine = engine();
        engine
            .delete_document(&json!({"id": "3", "street": "Low", "city": "Bergen"}))
            .unwrap();
        assert_eq!(engine.count_all().unwrap(), 2);

        let err = engine
            .delete_document(&json!({"id": "1", "street": "Main"}))
            .unwrap_err();
        assert!(matches!(err, QueryError::PartitionKeyRequired { .. }));
        assert_eq!(engine.count_all().unwrap(), 2);
    }

    #[test]
    fn test_delete_all_spans_partitions() {
        let engine = engine();
        assert_eq!(engine.delete_all().unwrap(), 3);
        assert_eq!(engine.count_all().unwrap(), 0);
    }

    #[test]
    fn test_explain_rejection() {
        let engine = engine();
        let plan = engine.explain("findByCityOrStreetAndCity", &CallArgs::new());

        assert!(!plan.accepted);
        assert_eq!(plan.rejection_code.as_deref(), Some("DOCREPO_MIXED_CONNECTOR"));
    }

    #[test]
    fn test_explain_shows_partition_binding() {
        let engine = engine();
        let plan = engine.explain("findByCity", &CallArgs::new().arg("Oslo"));

        assert!(plan.accepted);
        assert_eq!(plan.partition_key.unwrap().value(), &json!("Oslo"));
    }
}
