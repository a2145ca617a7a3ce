//! dreamy-dl library crate.
//!
//! Exposes the HTTP boundary for integration testing.

pub mod error;
pub mod routes;
pub mod server;
