//! Sort/page spec builder
//!
//! Sort precedence, highest first:
//! 1. Explicit sort parameter
//! 2. Sort attached to the page request
//! 3. `OrderBy` clause parsed from the operation name

use super::page::{PageRequest, PageState};
use super::sort::Sort;

/// Combines name-derived and call-site sort/page parameters into a `PageState`
#[derive(Debug, Clone)]
pub struct SortPageBuilder<'a> {
    default_page_size: u32,
    name_sort: Option<&'a Sort>,
    explicit_sort: Option<&'a Sort>,
    page: Option<&'a PageRequest>,
}

impl<'a> SortPageBuilder<'a> {
    /// Creates a builder; `default_page_size` applies when no page is requested
    pub fn new(default_page_size: u32) -> Self {
        Self {
            default_page_size: default_page_size.max(1),
            name_sort: None,
            explicit_sort: None,
            page: None,
        }
    }

    /// Sort parsed from the operation name
    pub fn name_sort(mut self, sort: &'a Sort) -> Self {
        self.name_sort = Some(sort);
        self
    }

    /// Explicit call-site sort
    pub fn explicit_sort(mut self, sort: Option<&'a Sort>) -> Self {
        self.explicit_sort = sort;
        self
    }

    /// Explicit call-site page request
    pub fn page(mut self, page: Option<&'a PageRequest>) -> Self {
        self.page = page;
        self
    }

    pub fn build(&self) -> PageState {
        let sort = self
            .explicit_sort
            .filter(|s| s.is_sorted())
            .or_else(|| self.page.and_then(PageRequest::sort).filter(|s| s.is_sorted()))
            .or(self.name_sort)
            .cloned()
            .unwrap_or_default();

        match self.page {
            Some(page) => PageState::new(page.size(), page.continuation().cloned(), sort),
            None => PageState::new(self.default_page_size, None, sort),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{ContinuationToken, Order};

    #[test]
    fn test_default_page_size_without_request() {
        let state = SortPageBuilder::new(100).build();
        assert_eq!(state.page_size(), 100);
        assert!(state.is_first_page());
        assert!(!state.sort().is_sorted());
    }

    #[test]
    fn test_explicit_sort_overrides_name_sort() {
        let from_name = Sort::by(Order::asc("name"));
        let explicit = Sort::by(Order::desc("starCount"));

        let state = SortPageBuilder::new(10)
            .name_sort(&from_name)
            .explicit_sort(Some(&explicit))
            .build();

        assert_eq!(state.sort(), &explicit);
    }

    #[test]
    fn test_page_sort_overrides_name_sort() {
        let from_name = Sort::by(Order::asc("name"));
        let page = PageRequest::of(5)
            .unwrap()
            .with_sort(Sort::by(Order::desc("creator")));

        let state = SortPageBuilder::new(10)
            .name_sort(&from_name)
            .page(Some(&page))
            .build();

        assert_eq!(state.sort(), &Sort::by(Order::desc("creator")));
        assert_eq!(state.page_size(), 5);
    }

    #[test]
    fn test_name_sort_used_when_no_override() {
        let from_name = Sort::by(Order::desc("name"));
        let empty = Sort::unsorted();

        let state = SortPageBuilder::new(10)
            .name_sort(&from_name)
            .explicit_sort(Some(&empty))
            .build();

        assert_eq!(state.sort(), &from_name);
    }

    #[test]
    fn test_continuation_carried_verbatim() {
        let token = ContinuationToken::from_bytes(vec![7, 7, 7]);
        let page = PageRequest::of(2).unwrap().with_continuation(token.clone());

        let state = SortPageBuilder::new(10).page(Some(&page)).build();
        assert_eq!(state.continuation(), Some(&token));
        assert!(!state.is_first_page());
    }
}
