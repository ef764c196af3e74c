use crate::config::ApiSettings;
use crate::models::{ActivePage, ListingDetail};
use crate::trading::request::{self, CallName};
use crate::trading::response;
use crate::trading::traits::SellingApi;
use crate::trading::ApiError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Trading API client over XML-over-HTTP
pub struct TradingClient {
    client: Client,
    settings: ApiSettings,
}

impl TradingClient {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }

    /// POST one call and return the response body of a 2xx reply
    async fn call(&self, call: CallName, body: String) -> Result<String, ApiError> {
        debug!(call = call.as_str(), endpoint = %self.settings.endpoint, "Sending request");

        let response = self
            .client
            .post(&self.settings.endpoint)
            .header("X-EBAY-API-SITEID", self.settings.site_id.to_string())
            .header(
                "X-EBAY-API-COMPATIBILITY-LEVEL",
                self.settings.compatibility_level.to_string(),
            )
            .header("X-EBAY-API-CALL-NAME", call.as_str())
            .header("X-EBAY-API-IAF-TOKEN", &self.settings.token)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let text = response.text().await?;
        debug!(call = call.as_str(), bytes = text.len(), "Received response");
        Ok(text)
    }
}

#[async_trait]
impl SellingApi for TradingClient {
    async fn active_listings_page(
        &self,
        page_number: u32,
        entries_per_page: u32,
    ) -> Result<ActivePage, ApiError> {
        let body = request::active_list_body(page_number, entries_per_page);
        let text = self.call(CallName::GetMyeBaySelling, body).await?;
        response::parse_active_page(&text)
    }

    async fn item_detail(&self, item_id: &str) -> Result<ListingDetail, ApiError> {
        let body = request::get_item_body(item_id);
        let text = self.call(CallName::GetItem, body).await?;
        response::parse_item_detail(&text)
    }
}
