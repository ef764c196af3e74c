use crate::models::{ActivePage, ListingDetail};
use crate::trading::ApiError;
use async_trait::async_trait;

/// The two calls the retriever needs from a seller's marketplace account.
/// `TradingClient` talks to the live endpoint; tests script their own.
#[async_trait]
pub trait SellingApi: Send + Sync {
    /// One page of the authenticated seller's active listings
    async fn active_listings_page(
        &self,
        page_number: u32,
        entries_per_page: u32,
    ) -> Result<ActivePage, ApiError>;

    /// Full record for a single listing
    async fn item_detail(&self, item_id: &str) -> Result<ListingDetail, ApiError>;
}
