//! Query planning
//!
//! Between parsing and execution:
//!
//! 1. `CapabilityValidator` rejects shapes the store cannot execute
//! 2. `QueryAssembler` binds arguments into an immutable `QueryDescriptor`
//! 3. `PartitionKeyResolver` derives a partition binding from the predicates
//! 4. `render` produces the store's parameterized query text
//!
//! Everything here is pure: no I/O, same inputs give the same output.

mod assembler;
mod capability;
mod explain;
mod partition;
mod render;

pub use assembler::{QueryAssembler, QueryDescriptor};
pub use capability::{CapabilityValidator, SortKey, SortSpec};
pub use explain::ExplainPlan;
pub use partition::{PartitionKeyBinding, PartitionKeyResolver};
pub use render::{render, SqlParameter, SqlQuerySpec};
