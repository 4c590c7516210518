//! Delivery order domain entities
//!
//! A delivery order moves stock from a DA's consignment to a customer.
//! Lifecycle: pending_dispatch -> out_for_delivery -> awaiting_approval
//! -> approved | rejected, with failed and cancelled as exits along the way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentId;
use super::stock::Sku;
use super::user::UserId;

/// Unique identifier for a delivery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(pub Uuid);

impl DeliveryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DeliveryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the order sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    PendingDispatch,
    OutForDelivery,
    AwaitingApproval,
    Approved,
    Rejected,
    Failed,
    Cancelled,
}

impl DeliveryStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Approved
                | DeliveryStatus::Rejected
                | DeliveryStatus::Failed
                | DeliveryStatus::Cancelled
        )
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::PendingDispatch => write!(f, "pending_dispatch"),
            DeliveryStatus::OutForDelivery => write!(f, "out_for_delivery"),
            DeliveryStatus::AwaitingApproval => write!(f, "awaiting_approval"),
            DeliveryStatus::Approved => write!(f, "approved"),
            DeliveryStatus::Rejected => write!(f, "rejected"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_dispatch" => Ok(DeliveryStatus::PendingDispatch),
            "out_for_delivery" => Ok(DeliveryStatus::OutForDelivery),
            "awaiting_approval" => Ok(DeliveryStatus::AwaitingApproval),
            "approved" => Ok(DeliveryStatus::Approved),
            "rejected" => Ok(DeliveryStatus::Rejected),
            "failed" => Ok(DeliveryStatus::Failed),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(format!("unknown delivery status: {}", s)),
        }
    }
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Prepaid,
    PayOnDelivery,
}

/// One SKU line on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: Sku,
    pub qty: i64,
    pub unit_price_kobo: i64,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.qty * self.unit_price_kobo
    }
}

/// A delivery order assigned to a DA
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOrder {
    pub id: DeliveryId,
    /// Human-facing reference, e.g. `DO-1042`
    pub reference: String,
    pub da_id: AgentId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<LineItem>,
    pub amount_kobo: i64,
    pub payment_method: PaymentMethod,
    pub status: DeliveryStatus,
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    pub otp_attempts: u32,
    pub otp_locked: bool,
    pub otp_verified_at: Option<DateTime<Utc>>,
    pub proof_photo_ref: Option<String>,
    /// Frozen at approval time; None until then
    pub bonus_eligible: Option<bool>,
    /// Why the order was rejected or failed
    pub resolution_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
}

impl DeliveryOrder {
    pub fn can_dispatch(&self) -> bool {
        self.status == DeliveryStatus::PendingDispatch
    }

    /// Orders that still count against the DA's consignment
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Data needed to create a delivery order
#[derive(Debug, Clone)]
pub struct NewDeliveryOrder {
    pub da_id: AgentId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
}
