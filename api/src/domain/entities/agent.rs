//! Delivery agent (DA) domain entity
//!
//! A DA is a field sales agent holding consignment inventory: company stock
//! signed out to them, sold customer by customer, and settled through
//! payment confirmations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a delivery agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AgentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DA status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Working normally
    Active,
    /// Suspended after a confirmed fraud flag; cannot dispatch, submit
    /// OTPs, or initiate payments
    Suspended,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AgentStatus::Active),
            "suspended" => Ok(AgentStatus::Suspended),
            _ => Err(format!("Unknown agent status: {}", s)),
        }
    }
}

/// A field delivery agent holding consignment stock
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAgent {
    pub id: AgentId,
    pub name: String,
    /// Nigerian mobile number, `0` + 10 digits
    pub phone: String,
    pub territory: String,
    pub status: AgentStatus,
    pub joined_at: DateTime<Utc>,
}

impl DeliveryAgent {
    /// Whether the DA may perform field operations right now
    pub fn is_operational(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// Data needed to register a new DA
#[derive(Debug, Clone)]
pub struct NewDeliveryAgent {
    pub name: String,
    pub phone: String,
    pub territory: String,
}

/// Validate a Nigerian mobile number (e.g. `08031234567`)
pub fn is_valid_phone(phone: &str) -> bool {
    // Compiled per call; registration volume makes caching pointless.
    regex::Regex::new(r"^0[789][01]\d{8}$")
        .map(|re| re.is_match(phone))
        .unwrap_or(false)
}
