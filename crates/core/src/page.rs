//! Pagination parameters and paged results.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Page size value that asks for the default page instead of an explicit one.
pub const PAGE_SIZE_SENTINEL: i64 = -1;

/// Page size used when the sentinel is supplied.
pub const SENTINEL_PAGE_SIZE: u64 = 100;

/// Largest offset any store is asked to skip; drivers encode skips as `i64`.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Normalized, validated pagination request.
///
/// Pages are 1-based. Constructing one applies the caller-facing rules:
/// - `page_size == -1` resets to page 1 with 100 records, whatever `page` was
/// - `page_size <= -2` and `page_size == 0` are rejected
/// - `page <= 0` is read as page 1 (the offset clamps to zero)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> DomainResult<Self> {
        if page_size == PAGE_SIZE_SENTINEL {
            return Ok(Self {
                page: 1,
                page_size: SENTINEL_PAGE_SIZE,
            });
        }
        if page_size <= 0 {
            return Err(DomainError::InvalidPagination(page_size));
        }

        Ok(Self {
            page: page.max(1) as u64,
            page_size: page_size as u64,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of records to skip, capped at [`MAX_OFFSET`].
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(MAX_OFFSET)
    }

    /// Maximum number of records to return.
    pub fn limit(&self) -> u64 {
        self.page_size
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }
}

/// One page of records plus the number of records matching the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Records matching the query's filter across all pages.
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sentinel_resets_to_first_default_page() {
        let req = PageRequest::new(7, -1).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 100);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn rejects_sizes_below_sentinel_and_zero() {
        assert_eq!(
            PageRequest::new(1, -2).unwrap_err(),
            DomainError::InvalidPagination(-2)
        );
        assert_eq!(
            PageRequest::new(1, 0).unwrap_err(),
            DomainError::InvalidPagination(0)
        );
    }

    #[test]
    fn non_positive_page_clamps_offset_to_zero() {
        let req = PageRequest::new(0, 10).unwrap();
        assert_eq!(req.offset(), 0);
        assert!(req.is_first());

        let req = PageRequest::new(-4, 10).unwrap();
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn offset_is_previous_pages_times_size() {
        let req = PageRequest::new(3, 2).unwrap();
        assert_eq!(req.offset(), 4);
        assert_eq!(req.limit(), 2);
        assert!(!req.is_first());
    }

    #[test]
    fn huge_pages_cap_the_offset() {
        let req = PageRequest::new(4_611_686_018_427_387_904, 4).unwrap();
        assert_eq!(req.offset(), MAX_OFFSET);
        assert!(i64::try_from(req.offset()).is_ok());

        let req = PageRequest::new(i64::MAX, i64::MAX).unwrap();
        assert_eq!(req.offset(), MAX_OFFSET);
    }

    #[test]
    fn has_more_compares_against_total() {
        let req = PageRequest::new(2, 2).unwrap();
        assert!(Page::new(vec![1, 2], 5, req).has_more());

        let req = PageRequest::new(3, 2).unwrap();
        assert!(!Page::new(vec![5], 5, req).has_more());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: the sentinel ignores whatever page was asked for.
        #[test]
        fn sentinel_ignores_page(page in any::<i64>()) {
            let req = PageRequest::new(page, PAGE_SIZE_SENTINEL).unwrap();
            prop_assert_eq!(req, PageRequest::new(1, 100).unwrap());
        }

        /// Property: consecutive pages never overlap and leave no gaps.
        #[test]
        fn consecutive_pages_tile_the_offset_space(
            page in 1i64..10_000,
            size in 1i64..1_000,
        ) {
            let this = PageRequest::new(page, size).unwrap();
            let next = PageRequest::new(page + 1, size).unwrap();
            prop_assert_eq!(this.offset() + this.limit(), next.offset());
        }

        /// Property: every offset fits the signed range stores encode it in.
        #[test]
        fn offset_always_fits_i64(page in any::<i64>(), size in 1i64..=i64::MAX) {
            let req = PageRequest::new(page, size).unwrap();
            prop_assert!(i64::try_from(req.offset()).is_ok());
        }
    }
}
