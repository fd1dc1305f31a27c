//! Infrastructure layer for cross-cutting concerns.
//!
//! - Configuration (per-operation signing options and persisted defaults)
//! - Error handling and result types

pub mod config;
pub mod error;
