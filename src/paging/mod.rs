//! Sort and page specifications
//!
//! - `Sort` / `Order`: call-site ordering, unchecked
//! - `PageRequest`: call-site page size and continuation
//! - `PageState`: the resolved page carried by a query descriptor
//! - `Page`: one page of results with the store's next token

mod builder;
mod page;
mod sort;

pub use builder::SortPageBuilder;
pub use page::{ContinuationToken, Page, PageRequest, PageState};
pub use sort::{Direction, Order, Sort};
