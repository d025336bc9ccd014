//! Domain models served by the API.

pub mod blog;
pub mod calculator;
pub mod category;
pub mod invoice;
pub mod order;
pub mod pack;
pub mod product;
pub mod user;

pub use blog::{BlogPost, BlogPostSummary};
pub use calculator::CalculatorConfig;
pub use category::Category;
pub use invoice::Invoice;
pub use order::{
    CancelOrderInput, CreateOrderInput, Order, OrderItem, OrderLineInput, OrderPage,
    OrderWithItems, UpdateStatusInput,
};
pub use pack::{Pack, PackItem, PackWithItems};
pub use product::{Product, StockUpdateInput};
pub use user::User;

use serde::Deserialize;

/// Page/limit query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const MAX_PAGE_SIZE: i64 = 100;

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Pagination {
    /// Page number clamped to at least 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=100`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = self.limit();
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination { page: 0, limit: 500 };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_offsets_and_pages() {
        let p = Pagination { page: 3, limit: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.total_pages(41), 3);
        assert_eq!(p.total_pages(40), 2);
        assert_eq!(p.total_pages(0), 0);
    }
}
