//! Database layer: repository handlers and entity models over SQLite.
//!
//! Each entity has a repository in [`handlers`] that owns its queries and a
//! model in [`models`] describing the stored row plus the request/response
//! shapes the repository speaks. Handlers borrow a connection, so callers
//! decide pooling and transaction scope.

pub mod errors;
pub mod handlers;
pub mod models;
