//! Shared types for the connector fleet workspace.
//!
//! Keep coordinator wire DTOs here so the CLI and its tests agree on one shape.

#![warn(missing_docs)]

/// Coordinator REST API DTOs.
pub mod api;
