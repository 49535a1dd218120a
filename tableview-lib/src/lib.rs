//! Remote table controller
//!
//! Mediates between list-style views and a page-based REST backend:
//! translates pagination, sort and filter state into API parameters, caches
//! the last fetched page per table, coalesces bursts of requests and
//! normalizes empty and error states.
//!
//! # Example
//!
//! ```ignore
//! use tableview_lib::controller::TableController;
//! use tableview_lib::fetch::HttpFetcher;
//! use tableview_lib::query::{ColumnFieldMap, TableQuery, Translator};
//!
//! let fetcher = HttpFetcher::builder()
//!     .url("https://lms.example.com/api/v1/enterprise/{scope}/enrollments/")
//!     .build()?;
//!
//! let controller = TableController::builder()
//!     .table_id("enrollments")
//!     .fetcher(fetcher)
//!     .scope_id("acme")
//!     .translator(Translator::new().columns(ColumnFieldMap::new().with("date", "last_activity_date")))
//!     .build();
//!
//! controller.fetch_immediate(TableQuery::first_page(20)).await;
//! let state = controller.state().unwrap();
//! println!("{} enrollments", state.data.item_count());
//! ```

pub mod analytics;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod deeplink;
pub mod error;
pub mod export;
pub mod fetch;
pub mod normalize;
pub mod query;
pub mod sort;
pub mod store;

mod typestate;

pub use controller::Requested;
pub use controller::TableController;
pub use store::TableState;
pub use store::TableStore;
pub use typestate::Missing;
pub use typestate::Set;
