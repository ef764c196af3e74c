use crate::config::RetrievalSettings;
use crate::models::{ActivePage, DetailOutcome, ListingSummary};
use crate::trading::{ApiError, SellingApi};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Pulls the seller's active list page by page, then the detail record for each listing
pub struct Retriever<A> {
    api: Arc<A>,
    settings: RetrievalSettings,
}

impl<A: SellingApi + 'static> Retriever<A> {
    pub fn new(api: A, settings: RetrievalSettings) -> Self {
        Self {
            api: Arc::new(api),
            settings,
        }
    }

    /// Summaries and details for every active listing
    pub async fn run(&self) -> Vec<DetailOutcome> {
        let summaries = self.fetch_summaries().await;
        info!("Total listings fetched: {}", summaries.len());
        self.fetch_details(summaries).await
    }

    /// Walk the active list until the declared page count is reached.
    ///
    /// Gives up early, keeping what it has, when a page fails for good or
    /// comes back without a page count. The page without a count is dropped.
    pub async fn fetch_summaries(&self) -> Vec<ListingSummary> {
        let mut summaries = Vec::new();
        let mut page_number = 1;

        loop {
            info!("Fetching page {}...", page_number);

            let page = match self.fetch_page_with_retry(page_number).await {
                Ok(page) => page,
                Err(err) => {
                    error!(
                        page = page_number,
                        kept = summaries.len(),
                        "Abandoning pagination: {}",
                        err
                    );
                    break;
                }
            };

            let Some(total_pages) = page.total_pages else {
                error!(
                    page = page_number,
                    kept = summaries.len(),
                    "Response has no TotalNumberOfPages, stopping"
                );
                break;
            };

            debug!(page = page_number, total_pages, items = page.items.len(), "Page fetched");
            summaries.extend(page.items);

            if page_number >= total_pages {
                break;
            }
            page_number += 1;
        }

        summaries
    }

    /// One page, retried with doubling waits on transient and throttling failures.
    /// The wait starts over for every page.
    async fn fetch_page_with_retry(&self, page_number: u32) -> Result<ActivePage, ApiError> {
        let policy = self.settings.retry;
        let mut delay = policy.initial_delay;
        let mut attempt = 1;

        loop {
            match self
                .api
                .active_listings_page(page_number, self.settings.entries_per_page)
                .await
            {
                Ok(page) => return Ok(page),
                Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                    warn!(
                        page = page_number,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Page request failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Fetch every detail record through a fixed number of workers.
    /// Output order follows `summaries`; a failed fetch marks only that listing unavailable.
    pub async fn fetch_details(&self, summaries: Vec<ListingSummary>) -> Vec<DetailOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut handles = Vec::with_capacity(summaries.len());

        for summary in summaries.iter().cloned() {
            let api = Arc::clone(&self.api);
            let sem = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return DetailOutcome::Unavailable {
                            summary,
                            reason: e.to_string(),
                        }
                    }
                };

                debug!(item_id = %summary.item_id, "Fetching details");
                match api.item_detail(&summary.item_id).await {
                    Ok(detail) => DetailOutcome::Fetched { summary, detail },
                    Err(err) => DetailOutcome::Unavailable {
                        summary,
                        reason: err.to_string(),
                    },
                }
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (summary, handle) in summaries.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => DetailOutcome::Unavailable {
                    summary,
                    reason: join_err.to_string(),
                },
            };

            if let DetailOutcome::Unavailable { summary, reason } = &outcome {
                warn!(item_id = %summary.item_id, "Details unavailable: {}", reason);
            }
            outcomes.push(outcome);
        }

        let fetched = outcomes.iter().filter(|o| o.detail().is_some()).count();
        info!(
            fetched,
            unavailable = outcomes.len() - fetched,
            "Detail fetch complete"
        );
        outcomes
    }
}
