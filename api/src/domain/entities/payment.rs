//! Payment confirmation entities
//!
//! Every pay-on-delivery order carries payment confirmations. Moniepoint
//! references follow the sandbox format `MP-` plus ten uppercase
//! alphanumerics; cash confirmations carry no reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentId;
use super::delivery::DeliveryId;
use super::user::UserId;

/// Unique identifier for a payment confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PaymentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the money moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    MoniepointTransfer,
    MoniepointPos,
    Cash,
}

impl PaymentChannel {
    /// Channels that settle through the gateway and carry a reference
    pub fn needs_reference(&self) -> bool {
        !matches!(self, PaymentChannel::Cash)
    }
}

impl std::fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentChannel::MoniepointTransfer => write!(f, "moniepoint_transfer"),
            PaymentChannel::MoniepointPos => write!(f, "moniepoint_pos"),
            PaymentChannel::Cash => write!(f, "cash"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Flagged,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Confirmed => write!(f, "confirmed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Flagged => write!(f, "flagged"),
        }
    }
}

/// Validate a Moniepoint transaction reference
pub fn is_valid_reference(reference: &str) -> bool {
    // Compiled per call; confirmations arrive a few per minute at peak
    regex::Regex::new(r"^MP-[A-Z0-9]{10}$")
        .map(|re| re.is_match(reference))
        .unwrap_or(false)
}

/// A recorded payment against a delivery order
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub id: PaymentId,
    pub order_id: DeliveryId,
    pub da_id: AgentId,
    pub amount_kobo: i64,
    pub channel: PaymentChannel,
    pub reference: Option<String>,
    pub status: PaymentStatus,
    pub initiated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<UserId>,
}

impl PaymentConfirmation {
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }
}

/// Data needed to record a payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: DeliveryId,
    pub da_id: AgentId,
    pub amount_kobo: i64,
    pub channel: PaymentChannel,
    pub reference: Option<String>,
}
