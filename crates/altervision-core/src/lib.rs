//! Altervision core library: HTTP-agnostic sales aggregation.
//!
//! # Modules
//!
//! - [`sales`] — [`SalesAggregate`] rows, the range-checked [`SalesFilter`],
//!   ISO timestamp parsing, and the [`SalesRepository`] store seam with its
//!   MySQL implementation.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod error;
pub mod sales;

pub use error::{CoreError, CoreResult};
pub use sales::datetime::parse_iso_datetime;
pub use sales::repository::{MySqlSalesRepository, SalesRepository, SALES_AGGREGATE_SQL};
pub use sales::{SalesAggregate, SalesFilter, MAX_RANGE_DAYS};
