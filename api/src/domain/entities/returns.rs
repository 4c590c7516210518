//! Stock return entities
//!
//! DAs hand unsold, damaged, or expired stock back to the warehouse.
//! An inventory officer inspects the return and records what actually
//! arrived; only accepted unsold units go back into warehouse stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentId;
use super::stock::Sku;
use super::user::UserId;

/// Unique identifier for a stock return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnId(pub Uuid);

impl ReturnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReturnId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReturnId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ReturnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the stock is coming back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Unsold,
    Damaged,
    Expired,
}

impl ReturnReason {
    /// Only unsold stock is resellable after inspection
    pub fn restockable(&self) -> bool {
        matches!(self, ReturnReason::Unsold)
    }
}

impl std::fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnReason::Unsold => write!(f, "unsold"),
            ReturnReason::Damaged => write!(f, "damaged"),
            ReturnReason::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    PendingInspection,
    Accepted,
    Rejected,
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnStatus::PendingInspection => write!(f, "pending_inspection"),
            ReturnStatus::Accepted => write!(f, "accepted"),
            ReturnStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A return submitted by a DA
#[derive(Debug, Clone, Serialize)]
pub struct StockReturn {
    pub id: ReturnId,
    pub da_id: AgentId,
    pub sku: Sku,
    pub claimed_qty: i64,
    pub reason: ReturnReason,
    pub status: ReturnStatus,
    /// Counted at inspection; None until then
    pub received_qty: Option<i64>,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub inspected_at: Option<DateTime<Utc>>,
    pub inspected_by: Option<UserId>,
}

impl StockReturn {
    /// Units claimed but not received, known only after inspection
    pub fn shortfall(&self) -> Option<i64> {
        self.received_qty.map(|got| (self.claimed_qty - got).max(0))
    }
}

/// Data needed to submit a return
#[derive(Debug, Clone)]
pub struct NewStockReturn {
    pub da_id: AgentId,
    pub sku: Sku,
    pub claimed_qty: i64,
    pub reason: ReturnReason,
    pub note: Option<String>,
}
