//! Altervision web API: bearer-token issuance and rate-limited sales queries.
//!
//! Exposed as a library so the router can be driven in tests without a
//! listening socket.

pub mod api;
pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod state;
