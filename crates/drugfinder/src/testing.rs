//! Fixtures and fakes shared by the shell tests

use crate::bulk::DatasetSource;
use crate::config::ApiConfig;
use crate::detail::DetailSearch;
use drugfinder_core::bulk::BulkDataset;
use drugfinder_core::criteria::SearchCriteria;
use drugfinder_core::detail::{PagedResult, Termination};
use drugfinder_core::{DrugRecord, FetchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serve `app` on an ephemeral local port; returns its base URL
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn create_test_config(detail_url: &str, bulk_url: &str) -> ApiConfig {
    ApiConfig {
        service_key: "test-key".to_string(),
        bulk_service_key: "bulk-key".to_string(),
        detail_url: detail_url.to_string(),
        bulk_url: bulk_url.to_string(),
        timeout: Duration::from_secs(5),
        insecure: false,
    }
}

/// A detail search response page with one item per product code
pub fn detail_xml(result_code: &str, total: Option<u64>, product_codes: &[&str]) -> String {
    let items: String = product_codes
        .iter()
        .map(|code| {
            format!(
                "<item><mdsCd>{code}</mdsCd><itmNm>Item {code}</itmNm>\
                 <gnlNmCd>281700ATB</gnlNmCd><mnfEntpNm>가나제약</mnfEntpNm></item>"
            )
        })
        .collect();
    let total = total
        .map(|t| format!("<totalCount>{t}</totalCount>"))
        .unwrap_or_default();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <response><header><resultCode>{result_code}</resultCode>\
         <resultMsg>TEST MESSAGE</resultMsg></header>\
         <body><items>{items}</items><numOfRows>10</numOfRows><pageNo>1</pageNo>{total}</body>\
         </response>"
    )
}

/// A bulk JSON page; each row is `(ingredient code, item name)`
pub fn bulk_json(total: u64, rows: &[(&str, &str)]) -> String {
    let data: Vec<String> = rows
        .iter()
        .map(|(code, name)| {
            format!(
                "{{\"주성분코드\":{},\"제품명\":{}}}",
                serde_json::Value::from(*code),
                serde_json::Value::from(*name)
            )
        })
        .collect();
    format!(
        "{{\"page\":1,\"perPage\":2,\"totalCount\":{total},\"currentCount\":{},\"data\":[{}]}}",
        rows.len(),
        data.join(",")
    )
}

pub fn bulk_row(ingredient_code: &str, item_name: &str) -> DrugRecord {
    DrugRecord::from_iter([
        ("주성분코드", Some(ingredient_code.to_string())),
        ("제품명", Some(item_name.to_string())),
    ])
}

pub fn detail_record(product_code: &str, item_name: &str, manufacturer: &str) -> DrugRecord {
    DrugRecord::from_iter([
        ("mdsCd", Some(product_code.to_string())),
        ("itmNm", Some(item_name.to_string())),
        ("gnlNmCd", Some("281700ATB".to_string())),
        ("mnfEntpNm", Some(manufacturer.to_string())),
    ])
}

/// Three rows for 281700ATB named A, B, A and one unrelated row
pub fn create_test_dataset() -> BulkDataset {
    BulkDataset::from_rows(vec![
        bulk_row("281700ATB", "A"),
        bulk_row("281700ATB", "B"),
        bulk_row("281700ATB", "A"),
        bulk_row("111111ATB", "C"),
    ])
}

/// Detail search answering from canned results keyed by item name.
///
/// Unknown names (and criteria without a name) get the default answer,
/// which is "no results" unless set.
#[derive(Debug)]
pub struct FakeDetail {
    answers: HashMap<String, Result<Vec<DrugRecord>, FetchError>>,
    default: Result<Vec<DrugRecord>, FetchError>,
    calls: Mutex<Vec<SearchCriteria>>,
}

impl FakeDetail {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            default: Ok(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, item_name: &str, records: Vec<DrugRecord>) -> Self {
        self.answers.insert(item_name.to_string(), Ok(records));
        self
    }

    pub fn failing(mut self, item_name: &str, error: FetchError) -> Self {
        self.answers.insert(item_name.to_string(), Err(error));
        self
    }

    pub fn with_default(mut self, answer: Result<Vec<DrugRecord>, FetchError>) -> Self {
        self.default = answer;
        self
    }

    pub fn calls(&self) -> Vec<SearchCriteria> {
        self.calls.lock().unwrap().clone()
    }

    pub fn item_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.item_name)
            .collect()
    }
}

impl DetailSearch for FakeDetail {
    async fn search(&self, criteria: &SearchCriteria) -> PagedResult {
        self.calls.lock().unwrap().push(criteria.clone());

        let answer = criteria
            .item_name
            .as_ref()
            .and_then(|name| self.answers.get(name))
            .unwrap_or(&self.default);

        match answer {
            Ok(records) if records.is_empty() => PagedResult::aborted(FetchError::NotFound),
            Ok(records) => PagedResult {
                records: records.clone(),
                total_count: records.len() as u64,
                pages_fetched: 1,
                termination: Termination::Complete,
            },
            Err(e) => PagedResult::aborted(e.clone()),
        }
    }
}

/// Dataset source returning a fixed outcome and counting loads
#[derive(Debug)]
pub struct FakeSource {
    outcome: Result<BulkDataset, FetchError>,
    loads: AtomicUsize,
}

impl FakeSource {
    pub fn new(outcome: Result<BulkDataset, FetchError>) -> Self {
        Self {
            outcome,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DatasetSource for FakeSource {
    async fn load(&self) -> Result<BulkDataset, FetchError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.outcome.clone()
    }
}
