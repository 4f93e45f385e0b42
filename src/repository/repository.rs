//! Typed repository over a domain entity
//!
//! Wraps a `QueryEngine` and maps documents to and from `T` with the
//! entity's `DocumentConverter`.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use super::engine::{CallArgs, Outcome, QueryEngine};
use crate::config::EngineConfig;
use crate::error::QueryResult;
use crate::executor::Pages;
use crate::mapping::{DocumentConverter, Entity, EntityMetadata, MappingContext};
use crate::observability::MetricsRegistry;
use crate::paging::{Page, Sort};
use crate::store::DocumentStore;

/// Data access for entities of type `T`
pub struct Repository<T, S> {
    engine: QueryEngine<S>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: DocumentStore> Repository<T, S> {
    /// Repository with the default configuration
    pub fn new(context: &MappingContext, store: S) -> QueryResult<Self> {
        Self::with_config(context, store, EngineConfig::default())
    }

    pub fn with_config(context: &MappingContext, store: S, config: EngineConfig) -> QueryResult<Self> {
        config.validate()?;
        Ok(Self {
            engine: QueryEngine::with_config(context.metadata::<T>()?, store, config),
            _entity: PhantomData,
        })
    }

    /// Shares a metrics registry with other repositories
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.engine = self.engine.with_metrics(metrics);
        self
    }

    pub fn engine(&self) -> &QueryEngine<S> {
        &self.engine
    }

    pub fn metadata(&self) -> &EntityMetadata {
        self.engine.metadata()
    }

    /// Every match, across all pages
    pub fn find_by(&self, method: &str, args: &[Value]) -> QueryResult<Vec<T>> {
        self.find_all_by(method, &CallArgs::with_args(args.iter().cloned()))?
            .collect_items()
    }

    /// Lazy page iterator
    pub fn find_all_by(&self, method: &str, call: &CallArgs) -> QueryResult<TypedPages<'_, T, S>> {
        Ok(TypedPages {
            pages: self.engine.find_all(method, call)?,
            converter: self.converter(),
            _entity: PhantomData,
        })
    }

    /// One page, as selected by the call's page request
    pub fn find_page_by(&self, method: &str, call: &CallArgs) -> QueryResult<Page<T>> {
        let converter = self.converter();
        self.engine
            .find(method, call)?
            .try_map(|doc| converter.from_document(doc))
    }

    pub fn exists_by(&self, method: &str, args: &[Value]) -> QueryResult<bool> {
        self.engine
            .exists(method, &CallArgs::with_args(args.iter().cloned()))
    }

    pub fn count_by(&self, method: &str, args: &[Value]) -> QueryResult<u64> {
        self.engine
            .count(method, &CallArgs::with_args(args.iter().cloned()))
    }

    /// Deletes every match; returns the number removed
    pub fn delete_by(&self, method: &str, args: &[Value]) -> QueryResult<u64> {
        self.engine
            .delete(method, &CallArgs::with_args(args.iter().cloned()))
    }

    /// Runs any derived operation, mapping found documents to `T`
    pub fn invoke(&self, method: &str, call: &CallArgs) -> QueryResult<Outcome<T>> {
        let converter = self.converter();
        Ok(match self.engine.invoke(method, call)? {
            Outcome::Found(page) => Outcome::Found(page.try_map(|doc| converter.from_document(doc))?),
            Outcome::Exists(found) => Outcome::Exists(found),
            Outcome::Count(n) => Outcome::Count(n),
            Outcome::Deleted(n) => Outcome::Deleted(n),
        })
    }

    /// Inserts or replaces the entity; returns it as stored.
    ///
    /// A missing string id is generated.
    pub fn save(&self, entity: &T) -> QueryResult<T> {
        let converter = self.converter();
        let mut document = converter.to_document(entity)?;
        converter.assign_id(&mut document)?;
        self.engine.upsert(document.clone())?;
        converter.from_document(document)
    }

    pub fn save_all<'e, I>(&self, entities: I) -> QueryResult<Vec<T>>
    where
        I: IntoIterator<Item = &'e T>,
    {
        entities.into_iter().map(|entity| self.save(entity)).collect()
    }

    /// Point read; `partition` is required for partitioned entities
    pub fn find_by_id(&self, id: &str, partition: Option<&Value>) -> QueryResult<Option<T>> {
        let converter = self.converter();
        self.engine
            .point_read(id, partition)?
            .map(|doc| converter.from_document(doc))
            .transpose()
    }

    /// Entities with any of the given ids; order follows the store
    pub fn find_all_by_id(&self, ids: &[&str]) -> QueryResult<Vec<T>> {
        let converter = self.converter();
        self.engine
            .find_by_ids(ids)?
            .into_iter()
            .map(|doc| converter.from_document(doc))
            .collect()
    }

    /// Point delete; `partition` is required for partitioned entities
    pub fn delete_by_id(&self, id: &str, partition: Option<&Value>) -> QueryResult<()> {
        self.engine.point_delete(id, partition)
    }

    /// Deletes the stored copy of `entity`, in the partition it names
    pub fn delete(&self, entity: &T) -> QueryResult<()> {
        let document = self.converter().to_document(entity)?;
        self.engine.delete_document(&document)
    }

    /// Deletes each entity in turn; stops at the first failure
    pub fn delete_entities<'e, I>(&self, entities: I) -> QueryResult<u64>
    where
        I: IntoIterator<Item = &'e T>,
    {
        let mut deleted = 0;
        for entity in entities {
            self.delete(entity)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Every entity, optionally sorted
    pub fn find_all(&self, sort: Option<Sort>) -> QueryResult<Vec<T>> {
        let call = match sort {
            Some(sort) => CallArgs::new().with_sort(sort),
            None => CallArgs::new(),
        };
        self.find_all_by("findAll", &call)?.collect_items()
    }

    pub fn count_all(&self) -> QueryResult<u64> {
        self.engine.count_all()
    }

    pub fn delete_all(&self) -> QueryResult<u64> {
        self.engine.delete_all()
    }

    fn converter(&self) -> DocumentConverter<'_> {
        DocumentConverter::new(self.engine.metadata())
    }
}

/// Lazy iterator of typed pages
pub struct TypedPages<'a, T, S> {
    pages: Pages<'a, S>,
    converter: DocumentConverter<'a>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: DocumentStore> TypedPages<'_, T, S> {
    /// Drains the remaining pages into one list
    pub fn collect_items(self) -> QueryResult<Vec<T>> {
        let mut items = Vec::new();
        for page in self {
            items.extend(page?.into_items());
        }
        Ok(items)
    }
}

impl<T: Entity, S: DocumentStore> Iterator for TypedPages<'_, T, S> {
    type Item = QueryResult<Page<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let converter = self.converter;
        let page = self.pages.next()?;
        Some(page.and_then(|page| page.try_map(|doc| converter.from_document(doc))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityDescriptor, PropertyType};
    use crate::paging::{Order, PageRequest};
    use crate::store::MemoryStore;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Project {
        id: String,
        name: String,
        creator: String,
        star_count: i64,
    }

    impl Entity for Project {
        fn describe() -> EntityDescriptor {
            EntityDescriptor::new("Project")
                .property("id", PropertyType::String)
                .property("name", PropertyType::String)
                .property("creator", PropertyType::String)
                .property("starCount", PropertyType::Int)
        }
    }

    fn project(id: &str, creator: &str, stars: i64) -> Project {
        Project {
            id: id.to_string(),
            name: format!("project-{}", id),
            creator: creator.to_string(),
            star_count: stars,
        }
    }

    fn repository() -> Repository<Project, MemoryStore> {
        let repo = Repository::new(&MappingContext::new(), MemoryStore::new()).unwrap();
        repo.save_all(&[
            project("1", "alice", 10),
            project("2", "bob", 20),
            project("3", "alice", 30),
        ])
        .unwrap();
        repo
    }

    #[test]
    fn test_save_then_find_by_id() {
        let repo = repository();
        let found = repo.find_by_id("2", None).unwrap();
        assert_eq!(found, Some(project("2", "bob", 20)));
    }

    #[test]
    fn test_find_by_and_sort() {
        let repo = repository();
        let found = repo
            .find_by("findByCreatorOrderByStarCountDesc", &[json!("alice")])
            .unwrap();

        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_find_all_by_pages() {
        let repo = repository();
        let call = CallArgs::new()
            .with_page(PageRequest::of(2).unwrap())
            .with_sort(Sort::by(Order::asc("starCount")));

        let sizes: Vec<usize> = repo
            .find_all_by("findAll", &call)
            .unwrap()
            .map(|page| page.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn test_invoke_maps_found_page() {
        let repo = repository();
        let outcome = repo
            .invoke("findByStarCountGreaterThan", &CallArgs::new().arg(15))
            .unwrap();

        match outcome {
            Outcome::Found(page) => assert_eq!(page.len(), 2),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_counts_and_deletes() {
        let repo = repository();
        assert_eq!(repo.count_by("countByCreator", &[json!("alice")]).unwrap(), 2);
        assert!(repo.exists_by("existsByCreator", &[json!("bob")]).unwrap());
        assert_eq!(repo.delete_by("deleteByCreator", &[json!("alice")]).unwrap(), 2);
        assert_eq!(repo.count_all().unwrap(), 1);

        repo.delete_by_id("2", None).unwrap();
        assert_eq!(repo.count_all().unwrap(), 0);
    }

    #[test]
    fn test_find_all_sorted() {
        let repo = repository();
        let all = repo.find_all(Some(Sort::by(Order::desc("starCount")))).unwrap();
        assert_eq!(all.first().map(|p| p.star_count), Some(30));
        assert_eq!(repo.delete_all().unwrap(), 3);
        assert!(repo.find_all(None).unwrap().is_empty());
    }
}
