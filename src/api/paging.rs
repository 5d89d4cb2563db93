/// Largest page a listing endpoint will return, whatever `limit` asks for.
pub const MAX_PAGE_SIZE: usize = 100;

/// A 1-based page window resolved from the `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paging {
    pub page: usize,
    pub limit: usize,
}

impl Paging {
    pub fn new(page: Option<usize>, limit: Option<usize>, default_limit: usize) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Items to skip; a window past `usize::MAX` is simply empty.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }

    pub fn window<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_limit_cap() {
        assert_eq!(Paging::new(None, None, 20), Paging { page: 1, limit: 20 });
        assert_eq!(Paging::new(Some(0), Some(0), 20), Paging { page: 1, limit: 1 });
        assert_eq!(Paging::new(Some(2), Some(usize::MAX), 20).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_huge_page_is_empty() {
        let paging = Paging::new(Some(usize::MAX), Some(2), 20);
        assert_eq!(paging.offset(), usize::MAX);
        assert!(paging.window(0..10).is_empty());
        assert_eq!(paging.pages(10), 5);
    }

    #[test]
    fn test_window_slices_the_requested_page() {
        let paging = Paging::new(Some(2), Some(3), 20);
        assert_eq!(paging.window(0..10), vec![3, 4, 5]);
        assert_eq!(paging.pages(10), 4);
    }
}
