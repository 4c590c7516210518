//! Delivery approval rules
//!
//! The rules behind the supervisor's approve button: which blockers an
//! order has, where it stands against its SLA clock, and whether the DA
//! earned the fast-delivery bonus. Everything here is pure; the approval
//! service gathers the inputs and persists the outcomes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::entities::delivery::{DeliveryOrder, DeliveryStatus};

/// Hours from dispatch to the delivery SLA deadline
pub const SLA_WINDOW_HOURS: i64 = 24;
/// An order inside this many hours of its deadline shows as at-risk
pub const SLA_AT_RISK_HOURS: i64 = 6;
/// Delivering within this many hours of dispatch earns the DA bonus
pub const BONUS_WINDOW_HOURS: i64 = 12;

/// One reason an order cannot be approved yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalBlocker {
    NotAwaitingApproval,
    OtpNotVerified,
    MissingProofPhoto,
    PaymentNotSettled,
    FraudHold,
}

impl std::fmt::Display for ApprovalBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalBlocker::NotAwaitingApproval => write!(f, "order is not awaiting approval"),
            ApprovalBlocker::OtpNotVerified => write!(f, "customer OTP has not been verified"),
            ApprovalBlocker::MissingProofPhoto => {
                write!(f, "no proof-of-delivery photo attached")
            }
            ApprovalBlocker::PaymentNotSettled => write!(f, "payment has not been confirmed"),
            ApprovalBlocker::FraudHold => {
                write!(f, "open fraud flag on this order or its DA")
            }
        }
    }
}

/// Every reason approval is currently blocked, in display order.
///
/// `payment_settled` means a confirmed payment covers the order amount;
/// `has_open_flags` means an open fraud flag targets the order or its DA.
pub fn approval_blockers(
    order: &DeliveryOrder,
    has_open_flags: bool,
    payment_settled: bool,
) -> Vec<ApprovalBlocker> {
    let mut blockers = Vec::new();
    if order.status != DeliveryStatus::AwaitingApproval {
        blockers.push(ApprovalBlocker::NotAwaitingApproval);
    }
    if order.otp_verified_at.is_none() {
        blockers.push(ApprovalBlocker::OtpNotVerified);
    }
    if order.proof_photo_ref.is_none() {
        blockers.push(ApprovalBlocker::MissingProofPhoto);
    }
    if !payment_settled {
        blockers.push(ApprovalBlocker::PaymentNotSettled);
    }
    if has_open_flags {
        blockers.push(ApprovalBlocker::FraudHold);
    }
    blockers
}

pub fn can_approve(order: &DeliveryOrder, has_open_flags: bool, payment_settled: bool) -> bool {
    approval_blockers(order, has_open_flags, payment_settled).is_empty()
}

/// Where a dispatched order stands against its 24h delivery SLA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaStatus {
    OnTrack { remaining: Duration },
    AtRisk { remaining: Duration },
    Breached { overdue: Duration },
}

impl SlaStatus {
    pub fn at(dispatched_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let deadline = dispatched_at + Duration::hours(SLA_WINDOW_HOURS);
        if now >= deadline {
            SlaStatus::Breached {
                overdue: now - deadline,
            }
        } else {
            let remaining = deadline - now;
            if remaining <= Duration::hours(SLA_AT_RISK_HOURS) {
                SlaStatus::AtRisk { remaining }
            } else {
                SlaStatus::OnTrack { remaining }
            }
        }
    }

    pub fn deadline(dispatched_at: DateTime<Utc>) -> DateTime<Utc> {
        dispatched_at + Duration::hours(SLA_WINDOW_HOURS)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SlaStatus::OnTrack { .. } => "on_track",
            SlaStatus::AtRisk { .. } => "at_risk",
            SlaStatus::Breached { .. } => "breached",
        }
    }

    pub fn is_breached(&self) -> bool {
        matches!(self, SlaStatus::Breached { .. })
    }
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlaStatus::OnTrack { remaining } | SlaStatus::AtRisk { remaining } => {
                write!(f, "{} remaining", format_duration(*remaining))
            }
            SlaStatus::Breached { overdue } => {
                write!(f, "overdue by {}", format_duration(*overdue))
            }
        }
    }
}

/// Bonus badge for a dispatched order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusStatus {
    /// Not yet delivered and the window is still open
    Pending { until: DateTime<Utc> },
    Eligible,
    Missed,
}

impl BonusStatus {
    pub fn at(
        dispatched_at: DateTime<Utc>,
        delivered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let window_end = dispatched_at + Duration::hours(BONUS_WINDOW_HOURS);
        match delivered_at {
            Some(delivered) if delivered <= window_end => BonusStatus::Eligible,
            Some(_) => BonusStatus::Missed,
            None if now <= window_end => BonusStatus::Pending { until: window_end },
            None => BonusStatus::Missed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BonusStatus::Pending { .. } => "pending",
            BonusStatus::Eligible => "eligible",
            BonusStatus::Missed => "missed",
        }
    }
}

/// Whether the delivery earned the bonus, frozen into the order at approval
pub fn bonus_eligible(dispatched_at: DateTime<Utc>, delivered_at: DateTime<Utc>) -> bool {
    delivered_at <= dispatched_at + Duration::hours(BONUS_WINDOW_HOURS)
}

/// Render a duration the way the dashboard timers do: `5h 30m`, `45m`, `3h`
pub fn format_duration(d: Duration) -> String {
    let total_minutes = d.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours == 0 {
        format!("{}m", minutes)
    } else if minutes == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::agent::AgentId;
    use crate::domain::entities::delivery::{DeliveryId, LineItem, PaymentMethod};
    use crate::domain::entities::stock::Sku;

    fn make_order(status: DeliveryStatus) -> DeliveryOrder {
        let now = Utc::now();
        DeliveryOrder {
            id: DeliveryId::new(),
            reference: "DO-1".to_string(),
            da_id: AgentId::new(),
            customer_name: "Mr. Okafor".to_string(),
            customer_phone: "08051234567".to_string(),
            customer_address: "3 Awolowo Rd, Ikoyi, Lagos".to_string(),
            items: vec![LineItem {
                sku: Sku::from("SKU-BEV-001"),
                qty: 2,
                unit_price_kobo: 180_000,
            }],
            amount_kobo: 360_000,
            payment_method: PaymentMethod::PayOnDelivery,
            status,
            otp_hash: None,
            otp_attempts: 0,
            otp_locked: false,
            otp_verified_at: None,
            proof_photo_ref: None,
            bonus_eligible: None,
            resolution_reason: None,
            created_at: now,
            dispatched_at: None,
            delivered_at: None,
            resolved_at: None,
            reviewed_by: None,
        }
    }

    fn make_ready_order() -> DeliveryOrder {
        let mut order = make_order(DeliveryStatus::AwaitingApproval);
        order.otp_verified_at = Some(Utc::now());
        order.proof_photo_ref = Some("photos/do-1.jpg".to_string());
        order
    }

    #[test]
    fn ready_order_has_no_blockers() {
        let order = make_ready_order();
        assert!(approval_blockers(&order, false, true).is_empty());
        assert!(can_approve(&order, false, true));
    }

    #[test]
    fn wrong_status_blocks() {
        let order = make_order(DeliveryStatus::OutForDelivery);
        let blockers = approval_blockers(&order, false, true);
        assert!(blockers.contains(&ApprovalBlocker::NotAwaitingApproval));
        assert!(!can_approve(&order, false, true));
    }

    #[test]
    fn missing_otp_blocks() {
        let mut order = make_ready_order();
        order.otp_verified_at = None;
        assert_eq!(
            approval_blockers(&order, false, true),
            vec![ApprovalBlocker::OtpNotVerified]
        );
    }

    #[test]
    fn missing_photo_blocks() {
        let mut order = make_ready_order();
        order.proof_photo_ref = None;
        assert_eq!(
            approval_blockers(&order, false, true),
            vec![ApprovalBlocker::MissingProofPhoto]
        );
    }

    #[test]
    fn unsettled_payment_blocks() {
        let order = make_ready_order();
        assert_eq!(
            approval_blockers(&order, false, false),
            vec![ApprovalBlocker::PaymentNotSettled]
        );
    }

    #[test]
    fn open_fraud_flag_blocks() {
        let order = make_ready_order();
        assert_eq!(
            approval_blockers(&order, true, true),
            vec![ApprovalBlocker::FraudHold]
        );
    }

    #[test]
    fn blockers_accumulate() {
        let order = make_order(DeliveryStatus::PendingDispatch);
        let blockers = approval_blockers(&order, true, false);
        assert_eq!(
            blockers,
            vec![
                ApprovalBlocker::NotAwaitingApproval,
                ApprovalBlocker::OtpNotVerified,
                ApprovalBlocker::MissingProofPhoto,
                ApprovalBlocker::PaymentNotSettled,
                ApprovalBlocker::FraudHold,
            ]
        );
    }

    #[test]
    fn blocker_serializes_snake_case() {
        let json = serde_json::to_string(&ApprovalBlocker::OtpNotVerified).unwrap();
        assert_eq!(json, "\"otp_not_verified\"");
    }

    #[test]
    fn sla_on_track_early_in_the_window() {
        let dispatched = Utc::now();
        let now = dispatched + Duration::hours(2);
        let status = SlaStatus::at(dispatched, now);
        assert_eq!(status.label(), "on_track");
        assert_eq!(status.to_string(), "22h remaining");
    }

    #[test]
    fn sla_at_risk_inside_final_six_hours() {
        let dispatched = Utc::now();
        let now = dispatched + Duration::hours(18) + Duration::minutes(30);
        let status = SlaStatus::at(dispatched, now);
        assert_eq!(status.label(), "at_risk");
        assert_eq!(status.to_string(), "5h 30m remaining");
    }

    #[test]
    fn sla_at_risk_boundary_is_inclusive() {
        let dispatched = Utc::now();
        let status = SlaStatus::at(dispatched, dispatched + Duration::hours(18));
        assert_eq!(status.label(), "at_risk");
        let status = SlaStatus::at(
            dispatched,
            dispatched + Duration::hours(18) - Duration::minutes(1),
        );
        assert_eq!(status.label(), "on_track");
    }

    #[test]
    fn sla_breached_past_deadline() {
        let dispatched = Utc::now();
        let now = dispatched + Duration::hours(26) + Duration::minutes(10);
        let status = SlaStatus::at(dispatched, now);
        assert!(status.is_breached());
        assert_eq!(status.to_string(), "overdue by 2h 10m");
    }

    #[test]
    fn sla_breached_exactly_at_deadline() {
        let dispatched = Utc::now();
        let status = SlaStatus::at(dispatched, dispatched + Duration::hours(24));
        assert!(status.is_breached());
        assert_eq!(status.to_string(), "overdue by 0m");
    }

    #[test]
    fn minutes_only_under_an_hour() {
        let dispatched = Utc::now();
        let now = dispatched + Duration::hours(23) + Duration::minutes(15);
        assert_eq!(SlaStatus::at(dispatched, now).to_string(), "45m remaining");
    }

    #[test]
    fn bonus_eligible_within_twelve_hours() {
        let dispatched = Utc::now();
        assert!(bonus_eligible(dispatched, dispatched + Duration::hours(11)));
        assert!(bonus_eligible(dispatched, dispatched + Duration::hours(12)));
        assert!(!bonus_eligible(
            dispatched,
            dispatched + Duration::hours(12) + Duration::minutes(1)
        ));
    }

    #[test]
    fn bonus_badge_states() {
        let dispatched = Utc::now();
        let window_end = dispatched + Duration::hours(12);

        let pending = BonusStatus::at(dispatched, None, dispatched + Duration::hours(3));
        assert_eq!(pending, BonusStatus::Pending { until: window_end });
        assert_eq!(pending.label(), "pending");

        let eligible =
            BonusStatus::at(dispatched, Some(dispatched + Duration::hours(10)), Utc::now());
        assert_eq!(eligible, BonusStatus::Eligible);

        let missed_late_delivery =
            BonusStatus::at(dispatched, Some(dispatched + Duration::hours(13)), Utc::now());
        assert_eq!(missed_late_delivery, BonusStatus::Missed);

        let missed_window_closed =
            BonusStatus::at(dispatched, None, dispatched + Duration::hours(13));
        assert_eq!(missed_window_closed, BonusStatus::Missed);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(3)), "3h");
        assert_eq!(
            format_duration(Duration::hours(5) + Duration::minutes(30)),
            "5h 30m"
        );
        assert_eq!(format_duration(Duration::zero()), "0m");
        assert_eq!(format_duration(Duration::minutes(-5)), "0m");
        assert_eq!(format_duration(Duration::seconds(59)), "0m");
    }
}
