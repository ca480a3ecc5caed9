//! Domain models for the Inventory Management Platform

mod product;
mod request;
mod restock;
mod sale;
mod supplier;
mod user;

pub use product::*;
pub use request::*;
pub use restock::*;
pub use sale::*;
pub use supplier::*;
pub use user::*;
