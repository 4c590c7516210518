//! Dashboard user domain entity
//!
//! A user is whoever holds a bearer token: back-office staff or a delivery
//! agent logging in from the field app. Role decides which panels (and
//! which slices of data) the user can see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentId;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dashboard role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    InventoryOfficer,
    DeliveryAgent,
}

impl Role {
    /// Back-office staff (everyone except field DAs)
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::DeliveryAgent)
    }

    /// May approve/reject deliveries, confirm payments, and review fraud flags
    pub fn can_review_operations(&self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }

    /// May assign consignment stock and inspect returns
    pub fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::InventoryOfficer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::InventoryOfficer => write!(f, "inventory_officer"),
            Role::DeliveryAgent => write!(f, "delivery_agent"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "inventory_officer" | "inventoryofficer" => Ok(Role::InventoryOfficer),
            "delivery_agent" | "deliveryagent" | "da" => Ok(Role::DeliveryAgent),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A dashboard user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// The DA record this user acts for (set iff role is `DeliveryAgent`)
    pub da_id: Option<AgentId>,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl User {
    /// The DA this user is limited to, if any.
    ///
    /// `None` for staff, who see everything their role allows.
    pub fn da_scope(&self) -> Option<AgentId> {
        match self.role {
            Role::DeliveryAgent => self.da_id,
            _ => None,
        }
    }
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub da_id: Option<AgentId>,
    pub token_hash: String,
}
