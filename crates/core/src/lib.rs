//! Core library for drugfinder
//!
//! This crate implements the **Functional Core** of the drugfinder application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The drugfinder project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`drugfinder_core`** (this crate): Decoding, paging decisions and resolution logic, no network I/O
//! - **`drugfinder`**: HTTP calls, caching, the server and the CLI (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **No network access**: response bodies come in as strings, decisions come out as values
//! - **Deterministic**: the same pages always produce the same result set
//! - **Testable**: paging, resolution and merging are exercised with fixture data, no mocking
//!
//! # Module Organization
//!
//! - [`criteria`]: Search criteria and their query parameters
//! - [`record`]: Drug records with a dynamic field set
//! - [`detail`]: XML detail-search pages and the paging state machine
//! - [`bulk`]: The bulk JSON dataset and its paging state machine
//! - [`schema`]: Column lookup over the bulk dataset's dynamic schema
//! - [`resolver`]: Identical-ingredient planning and result merging
//! - [`export`]: CSV encoding of the bulk dataset
//! - [`error`]: The fetch failure taxonomy
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use drugfinder_core::detail::{parse_detail_page, PageAccumulator};
//!
//! let mut acc = PageAccumulator::default();
//! let termination = loop {
//!     let body = fetch(acc.next_page()); // supplied by the shell
//!     if let Some(t) = acc.accept(parse_detail_page(&body)) {
//!         break t;
//!     }
//! };
//! let result = acc.finish(termination);
//! ```

pub mod bulk;
pub mod criteria;
pub mod detail;
pub mod error;
pub mod export;
pub mod record;
pub mod resolver;
pub mod schema;

pub use error::FetchError;
pub use record::DrugRecord;
