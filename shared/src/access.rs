//! Role-based capability checks
//!
//! Every service call receives the acting [`Actor`] and asks it to authorize
//! the [`Operation`] it is about to perform.

use serde::Serialize;
use thiserror::Error;

use crate::types::{Actor, Role};

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    RecordSale,
    RecordRestock,
    CreateRequest,
    FulfillRequest,
    RejectRequest,
    ManageProducts,
    ManageSuppliers,
    ManageUsers,
    ViewDashboard,
}

impl Operation {
    /// Roles allowed to perform this operation
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::RecordSale => &[Role::Admin, Role::Sales],
            Operation::RecordRestock => &[Role::Admin, Role::Supplier],
            Operation::CreateRequest => &[Role::Admin, Role::Inventory],
            Operation::FulfillRequest | Operation::RejectRequest => {
                &[Role::Admin, Role::Supplier]
            }
            Operation::ManageProducts => &[Role::Admin, Role::Inventory],
            Operation::ManageSuppliers => &[Role::Admin, Role::Supplier],
            Operation::ManageUsers | Operation::ViewDashboard => &[Role::Admin],
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Returned when an actor's role does not permit an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Role '{role}' may not perform {operation:?}")]
pub struct AccessDenied {
    pub role: Role,
    pub operation: Operation,
}

impl Actor {
    /// Check that this actor may perform `operation`
    pub fn authorize(&self, operation: Operation) -> Result<(), AccessDenied> {
        if operation.permits(self.role) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                operation,
            })
        }
    }

    /// Inventory controllers only ever see the requests they raised
    pub fn sees_only_own_requests(&self) -> bool {
        self.role == Role::Inventory
    }
}
