//! Detail search pages: XML decoding and the paging state machine
//!
//! The shell performs the HTTP calls; everything that decides what a page
//! means and whether to ask for the next one lives here.

use crate::error::FetchError;
use crate::record::DrugRecord;
use quick_xml::events::Event;
use quick_xml::Reader;

/// `header/resultCode` value of a successful response
pub const SUCCESS_CODE: &str = "00";

/// Hard cap on pages per search, guarding against an API that never runs dry
pub const MAX_PAGES: u32 = 1000;

/// One decoded response page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    pub result_code: Option<String>,
    pub result_msg: Option<String>,
    /// Whether a `body` element was present at all
    pub has_body: bool,
    /// Raw `body/totalCount` text
    pub total_count: Option<String>,
    /// `None` when `body/items` is absent
    pub items: Option<Vec<DrugRecord>>,
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn append_text(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

/// Decode one XML response page.
///
/// Paths are matched below the root element, whatever its name: the
/// endpoint answers with `<response>`, gateways sometimes with other roots.
pub fn parse_detail_page(xml: &str) -> Result<DetailPage, FetchError> {
    let mut reader = Reader::from_str(xml);

    let mut page = DetailPage::default();
    let mut path: Vec<String> = Vec::new();
    let mut text: Option<String> = None;
    let mut current_item: Option<DrugRecord> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FetchError::Schema(format!("XML parse error: {e}")))?;

        match event {
            Event::Start(e) => {
                path.push(element_name(e.name().as_ref()));
                text = None;
                on_open(&path, &mut page, &mut current_item);
            }
            Event::Empty(e) => {
                path.push(element_name(e.name().as_ref()));
                on_open(&path, &mut page, &mut current_item);
                on_close(&path, None, &mut page, &mut current_item);
                path.pop();
            }
            Event::Text(e) => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| FetchError::Schema(format!("XML text error: {e}")))?;
                append_text(&mut text, &unescaped);
            }
            Event::CData(e) => {
                append_text(&mut text, &String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(_) => {
                on_close(&path, text.take(), &mut page, &mut current_item);
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(FetchError::Schema("unexpected end of document".to_string()));
    }

    Ok(page)
}

/// Element path below the root
fn relative(path: &[String]) -> Vec<&str> {
    path.iter().skip(1).map(String::as_str).collect()
}

fn on_open(path: &[String], page: &mut DetailPage, current_item: &mut Option<DrugRecord>) {
    match relative(path).as_slice() {
        ["body"] => page.has_body = true,
        ["body", "items"] => {
            page.items.get_or_insert_with(Vec::new);
        }
        ["body", "items", "item"] => *current_item = Some(DrugRecord::new()),
        _ => {}
    }
}

fn on_close(
    path: &[String],
    text: Option<String>,
    page: &mut DetailPage,
    current_item: &mut Option<DrugRecord>,
) {
    let text = text.filter(|t| !t.is_empty());
    // Envelope values are trimmed; item values are kept as sent
    let trimmed = || {
        text.as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };
    match relative(path).as_slice() {
        ["header", "resultCode"] => page.result_code = trimmed(),
        ["header", "resultMsg"] => page.result_msg = trimmed(),
        ["body", "totalCount"] => page.total_count = trimmed(),
        ["body", "items", "item", field] => {
            if let Some(item) = current_item.as_mut() {
                item.insert(*field, text);
            }
        }
        ["body", "items", "item"] => {
            if let (Some(item), Some(items)) = (current_item.take(), page.items.as_mut()) {
                items.push(item);
            }
        }
        _ => {}
    }
}

/// Why a paged search stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Collected as many records as the first page declared
    Complete,
    /// A page came back without items
    EmptyPage,
    /// Hit [`MAX_PAGES`]
    PageLimit,
    /// A page failed; earlier records are kept
    Aborted(FetchError),
}

/// Everything a paged search produced
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult {
    pub records: Vec<DrugRecord>,
    /// `totalCount` from the first page, 0 when it never arrived
    pub total_count: u64,
    /// Pages whose items were accepted
    pub pages_fetched: u32,
    pub termination: Termination,
}

impl PagedResult {
    pub fn error(&self) -> Option<&FetchError> {
        match &self.termination {
            Termination::Aborted(e) => Some(e),
            _ => None,
        }
    }

    /// An empty result for a search that never reached the remote
    pub fn aborted(error: FetchError) -> Self {
        Self {
            records: Vec::new(),
            total_count: 0,
            pages_fetched: 0,
            termination: Termination::Aborted(error),
        }
    }
}

/// Paging state machine for the detail search.
///
/// Feed it each page (or the failure fetching it) in order; it answers
/// whether to stop. Page numbers start at 1.
#[derive(Debug)]
pub struct PageAccumulator {
    page: u32,
    max_pages: u32,
    total: Option<u64>,
    records: Vec<DrugRecord>,
}

impl Default for PageAccumulator {
    fn default() -> Self {
        Self::new(MAX_PAGES)
    }
}

impl PageAccumulator {
    pub fn new(max_pages: u32) -> Self {
        Self {
            page: 1,
            max_pages: max_pages.max(1),
            total: None,
            records: Vec::new(),
        }
    }

    /// Page number to request next
    pub fn next_page(&self) -> u32 {
        self.page
    }

    pub fn collected(&self) -> usize {
        self.records.len()
    }

    /// Declared total, known once page 1 has been accepted
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Take in the outcome for [`Self::next_page`]. Returns the termination
    /// reason when paging is over, `None` to continue.
    pub fn accept(&mut self, outcome: Result<DetailPage, FetchError>) -> Option<Termination> {
        let page = match outcome {
            Ok(page) => page,
            Err(e) => return Some(Termination::Aborted(e)),
        };

        if let Some(code) = page.result_code.as_deref() {
            if code != SUCCESS_CODE {
                return Some(Termination::Aborted(FetchError::Api {
                    code: code.to_string(),
                    message: page
                        .result_msg
                        .unwrap_or_else(|| "unknown error".to_string()),
                }));
            }
        }

        if !page.has_body {
            return Some(Termination::Aborted(FetchError::Schema(
                "response has no body element".to_string(),
            )));
        }

        if self.total.is_none() {
            let total = match page.total_count.as_deref().map(str::trim) {
                None => 0,
                Some(raw) => match raw.parse::<u64>() {
                    Ok(n) => n,
                    Err(_) => {
                        return Some(Termination::Aborted(FetchError::Schema(format!(
                            "invalid totalCount: {raw}"
                        ))))
                    }
                },
            };
            self.total = Some(total);
            if total == 0 {
                return Some(Termination::Aborted(FetchError::NotFound));
            }
        }
        let total = self.total.unwrap_or(0);

        let items = match page.items {
            Some(items) => items,
            None => {
                return Some(Termination::Aborted(FetchError::Schema(format!(
                    "page {} has no items element",
                    self.page
                ))))
            }
        };

        if items.is_empty() {
            return Some(Termination::EmptyPage);
        }

        self.records.extend(items);

        if self.records.len() as u64 >= total {
            self.records.truncate(total as usize);
            return Some(Termination::Complete);
        }

        if self.page >= self.max_pages {
            return Some(Termination::PageLimit);
        }

        self.page += 1;
        None
    }

    pub fn finish(self, termination: Termination) -> PagedResult {
        let pages_fetched = match termination {
            Termination::Aborted(_) => self.page - 1,
            _ => self.page,
        };
        PagedResult {
            records: self.records,
            total_count: self.total.unwrap_or(0),
            pages_fetched,
            termination,
        }
    }
}
