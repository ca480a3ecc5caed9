//! Database models for the Inventory Management Platform
//!
//! Re-exports models from the shared crate; the persisted ones derive
//! `sqlx::FromRow` through the shared crate's `sqlx` feature.

pub use shared::models::*;
