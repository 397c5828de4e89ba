//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`PrdId`]: PRD instance identifier (equals the intake [`SessionId`] in
//!   the common path, where the session that produced the questionnaire also
//!   names the PRD it becomes)
//! - [`SessionId`]: intake session identifier
//! - [`OwnerId`]: authenticated owner identifier
//! - [`PaymentId`]: payment record identifier

use uuid::Uuid;

// Type aliases for IDs
pub type PrdId = Uuid;
pub type SessionId = Uuid;
pub type OwnerId = Uuid;
pub type PaymentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
