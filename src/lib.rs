//! docrepo - derived queries over a partitioned document store
//!
//! Operation names such as `findByCityAndStreetOrderByNameAsc` are parsed into
//! predicate trees, checked against what the store can execute, bound to call
//! arguments and run page by page through opaque continuation tokens.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod observability;
pub mod paging;
pub mod planner;
pub mod query;
pub mod repository;
pub mod store;

pub use config::EngineConfig;
pub use error::{QueryError, QueryResult};
pub use repository::{CallArgs, Outcome, QueryEngine, Repository};
