use crate::config::ApiConfig;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::detail::{
    parse_detail_page, DetailPage, PageAccumulator, PagedResult, Termination, MAX_PAGES,
};
use drugfinder_core::FetchError;
use std::future::Future;

/// Anything that can run a paged detail search.
///
/// Implemented by [`DetailClient`] against the live API; the resolver and the
/// request handlers only depend on this trait.
pub trait DetailSearch {
    fn search(&self, criteria: &SearchCriteria) -> impl Future<Output = PagedResult> + Send;
}

/// HTTP client for the XML detail search endpoint
#[derive(Debug, Clone)]
pub struct DetailClient {
    client: reqwest::Client,
    url: String,
    service_key: String,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl DetailClient {
    pub fn new(config: &ApiConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            url: config.detail_url.clone(),
            service_key: config.service_key.clone(),
        }
    }

    /// Fetch and decode one page
    async fn fetch_page(
        &self,
        criteria: &SearchCriteria,
        page_no: u32,
    ) -> Result<DetailPage, FetchError> {
        let num_rows = criteria.page_size().to_string();
        let page = page_no.to_string();

        let mut params = vec![
            ("ServiceKey", self.service_key.as_str()),
            ("numOfRows", num_rows.as_str()),
            ("pageNo", page.as_str()),
        ];
        params.extend(criteria.query_pairs());

        let response = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "Detail search page {} failed with HTTP {}: {}",
                page_no,
                status,
                excerpt(&body, 500)
            );
            return Err(FetchError::http_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(format!("failed to read response body: {e}")))?;

        parse_detail_page(&body)
    }

    /// Run a search across at most `max_pages` pages
    pub async fn search_pages(&self, criteria: &SearchCriteria, max_pages: u32) -> PagedResult {
        log::info!("Detail search: {}", criteria.describe());

        let mut acc = PageAccumulator::new(max_pages);
        let termination = loop {
            let page_no = acc.next_page();
            let outcome = self.fetch_page(criteria, page_no).await;
            if let Some(termination) = acc.accept(outcome) {
                break termination;
            }
            if page_no % 10 == 0 {
                log::info!(
                    "In progress... {}/{} records collected (page {})",
                    acc.collected(),
                    acc.total().unwrap_or_default(),
                    page_no
                );
            }
        };

        let result = acc.finish(termination);
        log_result(&result);
        result
    }

    /// Run a search through every page, up to the global page cap
    pub async fn fetch_all(&self, criteria: &SearchCriteria) -> PagedResult {
        self.search_pages(criteria, MAX_PAGES).await
    }
}

impl DetailSearch for DetailClient {
    async fn search(&self, criteria: &SearchCriteria) -> PagedResult {
        self.fetch_all(criteria).await
    }
}

fn log_result(result: &PagedResult) {
    match &result.termination {
        Termination::Complete | Termination::EmptyPage => log::info!(
            "Collected {} of {} records",
            result.records.len(),
            result.total_count
        ),
        Termination::PageLimit => log::warn!(
            "Reached the page limit; {} of {} records collected",
            result.records.len(),
            result.total_count
        ),
        Termination::Aborted(FetchError::NotFound) => log::info!("No matching records"),
        Termination::Aborted(e) => log::warn!(
            "Detail search stopped after {} page(s) with {} record(s): {}",
            result.pages_fetched,
            result.records.len(),
            e
        ),
    }
}
