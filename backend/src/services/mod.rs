//! Business logic services for the Inventory Management Platform

pub mod auth;
pub mod dashboard;
pub mod ledger;
pub mod products;
pub mod requests;
pub mod restock;
pub mod sales;
pub mod suppliers;
pub mod users;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use products::ProductService;
pub use requests::RequestService;
pub use restock::RestockService;
pub use sales::SalesService;
pub use suppliers::SupplierService;
pub use users::UserService;

#[cfg(test)]
mod db_tests;
