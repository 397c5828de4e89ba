//! HTTP API layer.
//!
//! [`handlers`] holds the axum route handlers; [`models`] the request and
//! response shapes they speak. Persistence stays behind the repositories in
//! [`crate::db`] - handlers translate between the wire and the store.

pub mod handlers;
pub mod models;
