//! Repository surface
//!
//! - `QueryEngine`: derived operations over raw documents for one entity
//! - `Repository<T>`: the same operations over domain objects, plus
//!   save / find-by-id / delete-by-id
//!
//! ```ignore
//! let repo: Repository<Address, _> = Repository::new(&context, MemoryStore::new())?;
//! let oslo = repo.find_by("findByCity", &[json!("Oslo")])?;
//! repo.delete_by_id("0150", Some(&json!("Oslo")))?;
//! ```

mod engine;
mod repository;

pub use engine::{CallArgs, Outcome, QueryEngine};
pub use repository::{Repository, TypedPages};
