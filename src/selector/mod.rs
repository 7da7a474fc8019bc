//! ID-range selection strategies
//!
//! A selector decides the working set of identifiers to attempt in one crawl
//! cycle: the integer-range family enumerates `1..=highest` for providers
//! with dense numeric IDs, the pagination family extracts candidates from one
//! listing page. Both subtract dead, not-yet-due and already-downloaded
//! identifiers.

pub mod int_range;
pub mod pagination;

pub use int_range::IntRangeSelector;
pub use pagination::PaginationSelector;
