//! Shared types and domain logic for the Inventory Management Platform
//!
//! This crate contains the models, the stock ledger arithmetic and the request
//! workflow shared between the backend, the frontend (via WASM), and tests.
//! Nothing in here performs I/O.

pub mod access;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use access::*;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
