/// A normalized page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Falls back to page 1 and `default_limit` for missing or non-positive values,
    /// and caps the limit at `max_limit`.
    #[must_use]
    pub fn normalize(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit.filter(|l| *l >= 1).unwrap_or(default_limit).min(max_limit);
        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    #[must_use]
    pub const fn paginate(&self, total: i64) -> Pagination {
        let total_pages = if total == 0 { 0 } else { (total + self.limit - 1) / self.limit };
        Pagination { page: self.page, limit: self.limit, total, total_pages, has_more: self.page < total_pages }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_caps() {
        assert_eq!(PageRequest::normalize(None, None, 20, 50), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::normalize(Some(0), Some(-3), 50, 100), PageRequest { page: 1, limit: 50 });
        assert_eq!(PageRequest::normalize(Some(3), Some(500), 20, 50), PageRequest { page: 3, limit: 50 });
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest { page: 1, limit: 20 }.offset(), 0);
        assert_eq!(PageRequest { page: 4, limit: 25 }.offset(), 75);
    }

    #[test]
    fn test_huge_page_saturates_instead_of_overflowing() {
        let req = PageRequest::normalize(Some(i64::MAX), Some(20), 20, 50);
        assert_eq!(req.page, i64::MAX);
        assert_eq!(req.offset(), i64::MAX);

        let meta = req.paginate(45);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_paginate_metadata() {
        let meta = PageRequest { page: 1, limit: 20 }.paginate(45);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let last = PageRequest { page: 3, limit: 20 }.paginate(45);
        assert!(!last.has_more);

        let empty = PageRequest { page: 1, limit: 20 }.paginate(0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }
}
