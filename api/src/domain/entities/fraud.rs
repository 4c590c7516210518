//! Fraud flag entities
//!
//! Flags are raised by the system (OTP lockouts, duplicate payment
//! references, stock shortfalls) or manually by staff. An open flag on a
//! DA holds every one of their approvals until a supervisor reviews it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentId;
use super::delivery::DeliveryId;
use super::user::UserId;

/// Unique identifier for a fraud flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagId(pub Uuid);

impl FlagId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FlagId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for FlagId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FlagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the flag was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudReason {
    OtpRetriesExceeded,
    DuplicatePaymentReference,
    StockDiscrepancy,
    ManualReport,
}

impl std::fmt::Display for FraudReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FraudReason::OtpRetriesExceeded => write!(f, "otp_retries_exceeded"),
            FraudReason::DuplicatePaymentReference => write!(f, "duplicate_payment_reference"),
            FraudReason::StockDiscrepancy => write!(f, "stock_discrepancy"),
            FraudReason::ManualReport => write!(f, "manual_report"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudSeverity {
    Low,
    Medium,
    High,
}

impl FraudSeverity {
    /// Severity assigned when the system raises the flag itself
    pub fn default_for(reason: FraudReason) -> Self {
        match reason {
            FraudReason::OtpRetriesExceeded => FraudSeverity::Medium,
            FraudReason::DuplicatePaymentReference => FraudSeverity::High,
            FraudReason::StockDiscrepancy => FraudSeverity::Medium,
            FraudReason::ManualReport => FraudSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    Open,
    Cleared,
    Confirmed,
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagStatus::Open => write!(f, "open"),
            FlagStatus::Cleared => write!(f, "cleared"),
            FlagStatus::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// What the flag is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FlagSubject {
    Order(DeliveryId),
    Agent(AgentId),
}

/// A fraud flag under review
#[derive(Debug, Clone, Serialize)]
pub struct FraudFlag {
    pub id: FlagId,
    pub subject: FlagSubject,
    pub da_id: AgentId,
    pub reason: FraudReason,
    pub severity: FraudSeverity,
    pub status: FlagStatus,
    pub detail: String,
    /// None when raised automatically
    pub raised_by: Option<UserId>,
    pub raised_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
}

impl FraudFlag {
    pub fn is_open(&self) -> bool {
        self.status == FlagStatus::Open
    }
}

/// Data needed to raise a flag
#[derive(Debug, Clone)]
pub struct NewFraudFlag {
    pub subject: FlagSubject,
    pub da_id: AgentId,
    pub reason: FraudReason,
    pub severity: FraudSeverity,
    pub detail: String,
    pub raised_by: Option<UserId>,
}
