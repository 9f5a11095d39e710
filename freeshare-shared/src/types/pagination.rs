use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: u64 = 100;

/// Largest offset a SQL `OFFSET` (bigint) accepts.
const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page: page.max(1), per_page }
    }

    /// Rows to skip; saturates instead of overflowing on huge page numbers.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(MAX_OFFSET)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`.
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_uses_clamped_limit() {
        let params = PaginationParams::new(3, 500);
        assert_eq!(params.limit(), MAX_PER_PAGE);
        assert_eq!(params.offset(), 200);
    }

    #[test]
    fn page_zero_is_first_page() {
        let params = PaginationParams::new(0, 20);
        assert_eq!(params.page, 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let params = PaginationParams::new(u64::MAX, 100);
        assert_eq!(params.offset(), i64::MAX as u64);

        let params = PaginationParams::new(i64::MAX as u64 / 10, 100);
        assert_eq!(params.offset(), i64::MAX as u64);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams::new(1, 20);
        let page: Paginated<u8> = Paginated::new(vec![], 41, &params);
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
