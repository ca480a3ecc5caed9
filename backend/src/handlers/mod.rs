//! HTTP request handlers

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod requests;
pub mod restock;
pub mod sales;
pub mod suppliers;
pub mod users;

pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use products::*;
pub use requests::*;
pub use restock::*;
pub use sales::*;
pub use suppliers::*;
pub use users::*;
