//! Common types used across the platform

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roles a user account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Inventory controller
    Inventory,
    /// Sales staff
    Sales,
    /// Supplier manager
    Supplier,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Inventory, Role::Sales, Role::Supplier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Inventory => "inventory",
            Role::Sales => "sales",
            Role::Supplier => "supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "inventory" => Ok(Role::Inventory),
            "sales" => Ok(Role::Sales),
            "supplier" => Ok(Role::Supplier),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

/// The authenticated identity performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

/// Inclusive UTC bounds of a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayBounds {
    /// Bounds `[00:00:00.000, 23:59:59.999]` of `date` as observed in `tz`.
    ///
    /// Returns `None` only when the time zone has no valid mapping for the
    /// start or end of that day.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<Self> {
        let start = date.and_hms_opt(0, 0, 0)?;
        let end = date.and_hms_milli_opt(23, 59, 59, 999)?;

        let start = tz.from_local_datetime(&start).earliest()?.with_timezone(&Utc);
        let end = tz.from_local_datetime(&end).latest()?.with_timezone(&Utc);

        Some(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Generic message body for delete-style endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
