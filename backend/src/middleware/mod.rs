//! HTTP middleware and extractors

pub mod auth;
pub mod body;

pub use auth::{auth_middleware, CurrentUser};
pub use body::OptionalJson;
