//! HomeSeer JSON API -- the structured-query channel.
//!
//! Request/response over HTTP: `GET /JSON?request=...` with basic auth.
//! [`models`] holds the raw wire records; `seerly-core` converts them
//! into domain types.

mod client;
pub mod models;

pub use client::JsonClient;
