//! Approval service
//!
//! The supervisor's side of the delivery lifecycle: the blocker checklist,
//! approve/reject, and the SLA board. The pure rules live in
//! `domain::approval`; this service feeds them live payment and fraud state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::approval::{
    approval_blockers, bonus_eligible, ApprovalBlocker, BonusStatus, SlaStatus,
};
use crate::domain::entities::{
    AgentId, DeliveryId, DeliveryOrder, DeliveryStatus, FlagSubject, FraudReason, FraudSeverity,
    NewFraudFlag, PaymentStatus, User,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentRepository, StockRepository,
};
use crate::error::{AppError, DomainError};

/// Live badges for one order: SLA timer, bonus badge, and the approval
/// checklist the dashboard renders against the Approve button
#[derive(Debug, Clone, Serialize)]
pub struct OrderBadges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_state: Option<String>,
    pub blockers: Vec<ApprovalBlocker>,
    pub can_approve: bool,
}

/// One row of the SLA board, most urgent first
#[derive(Debug, Clone, Serialize)]
pub struct SlaBoardRow {
    pub order_id: DeliveryId,
    pub reference: String,
    pub da_id: AgentId,
    pub da_name: String,
    pub customer_name: String,
    pub status: DeliveryStatus,
    pub amount_kobo: i64,
    pub dispatched_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub sla_state: String,
    pub sla_display: String,
    pub bonus_state: String,
}

/// One order waiting on a supervisor, with its checklist
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalQueueRow {
    pub order_id: DeliveryId,
    pub reference: String,
    pub da_id: AgentId,
    pub da_name: String,
    pub customer_name: String,
    pub amount_kobo: i64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub blockers: Vec<ApprovalBlocker>,
    pub can_approve: bool,
}

/// Service for delivery review
pub struct ApprovalService<DR, PR, FR, SR, AR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    SR: StockRepository,
    AR: AgentRepository,
{
    deliveries: Arc<DR>,
    payments: Arc<PR>,
    flags: Arc<FR>,
    stocks: Arc<SR>,
    agents: Arc<AR>,
}

impl<DR, PR, FR, SR, AR> ApprovalService<DR, PR, FR, SR, AR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    SR: StockRepository,
    AR: AgentRepository,
{
    pub fn new(
        deliveries: Arc<DR>,
        payments: Arc<PR>,
        flags: Arc<FR>,
        stocks: Arc<SR>,
        agents: Arc<AR>,
    ) -> Self {
        Self {
            deliveries,
            payments,
            flags,
            stocks,
            agents,
        }
    }

    /// Whether confirmed payments cover the order amount
    async fn payment_settled(&self, order: &DeliveryOrder) -> Result<bool, AppError> {
        let confirmed: i64 = self
            .payments
            .list_by_order(&order.id)
            .await?
            .iter()
            .filter(|p| p.status == PaymentStatus::Confirmed)
            .map(|p| p.amount_kobo)
            .sum();
        Ok(confirmed >= order.amount_kobo)
    }

    /// Every reason this order cannot be approved right now
    pub async fn blockers_for(&self, order: &DeliveryOrder) -> Result<Vec<ApprovalBlocker>, AppError> {
        let has_open_flags = self.flags.has_open_for_da(&order.da_id).await?;
        let settled = self.payment_settled(order).await?;
        Ok(approval_blockers(order, has_open_flags, settled))
    }

    /// The dashboard badges for one order
    pub async fn badges_for(&self, order: &DeliveryOrder) -> Result<OrderBadges, AppError> {
        let blockers = self.blockers_for(order).await?;
        let can_approve = blockers.is_empty();

        let on_clock = matches!(
            order.status,
            DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
        );
        let badges = match (on_clock, order.dispatched_at) {
            (true, Some(dispatched)) => {
                let now = Utc::now();
                let sla = SlaStatus::at(dispatched, now);
                let bonus = BonusStatus::at(dispatched, order.delivered_at, now);
                OrderBadges {
                    sla_state: Some(sla.label().to_string()),
                    sla_display: Some(sla.to_string()),
                    sla_deadline: Some(SlaStatus::deadline(dispatched)),
                    bonus_state: Some(bonus.label().to_string()),
                    blockers,
                    can_approve,
                }
            }
            _ => OrderBadges {
                sla_state: None,
                sla_display: None,
                sla_deadline: None,
                bonus_state: None,
                blockers,
                can_approve,
            },
        };
        Ok(badges)
    }

    /// Approve a delivery
    ///
    /// Refused with the full blocker list unless every box is ticked. On
    /// approval the bonus outcome is frozen and the sold quantities come
    /// off the DA's consignment; a ledger shortfall raises a discrepancy
    /// flag rather than blocking the sale.
    pub async fn approve(&self, actor: &User, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        let order = self.fetch(id).await?;

        let blockers = self.blockers_for(&order).await?;
        if !blockers.is_empty() {
            return Err(AppError::ApprovalBlocked(blockers));
        }

        let bonus = match (order.dispatched_at, order.delivered_at) {
            (Some(dispatched), Some(delivered)) => bonus_eligible(dispatched, delivered),
            _ => false,
        };

        for item in &order.items {
            let held = self.stocks.holding_qty(&order.da_id, &item.sku).await?;
            if held < item.qty {
                let flag = NewFraudFlag {
                    subject: FlagSubject::Order(order.id),
                    da_id: order.da_id,
                    reason: FraudReason::StockDiscrepancy,
                    severity: FraudSeverity::default_for(FraudReason::StockDiscrepancy),
                    detail: format!(
                        "order {}: ledger holds {} of {}, sold {}",
                        order.reference, held, item.sku, item.qty
                    ),
                    raised_by: None,
                };
                self.flags.create(&flag).await?;
                tracing::warn!(
                    reference = %order.reference,
                    sku = %item.sku,
                    held,
                    sold = item.qty,
                    "Consignment ledger short at approval, discrepancy flag raised"
                );
            }
            self.stocks
                .adjust_holding(&order.da_id, &item.sku, -item.qty)
                .await?;
        }

        self.deliveries
            .approve(id, &actor.id, Utc::now(), bonus)
            .await?;
        tracing::info!(reference = %order.reference, bonus, "Delivery approved");
        self.fetch(id).await
    }

    /// Reject a delivery with a reason
    pub async fn reject(
        &self,
        actor: &User,
        id: &DeliveryId,
        reason: &str,
    ) -> Result<DeliveryOrder, AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::BadRequest(
                "A rejection reason is required".to_string(),
            ));
        }
        let order = self.fetch(id).await?;
        if order.status != DeliveryStatus::AwaitingApproval {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, not awaiting approval",
                order.reference, order.status
            ))));
        }

        self.deliveries
            .reject(id, &actor.id, Utc::now(), reason)
            .await?;
        tracing::info!(reference = %order.reference, reason, "Delivery rejected");
        self.fetch(id).await
    }

    /// Dispatched orders still on the clock, closest to breach first
    pub async fn sla_board(&self) -> Result<Vec<SlaBoardRow>, AppError> {
        let now = Utc::now();
        let mut names: HashMap<AgentId, String> = HashMap::new();
        let mut rows = Vec::new();

        for order in self.deliveries.find_on_sla_clock().await? {
            let Some(dispatched) = order.dispatched_at else {
                continue;
            };
            let da_name = match names.get(&order.da_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .agents
                        .find_by_id(&order.da_id)
                        .await?
                        .map(|da| da.name)
                        .unwrap_or_else(|| "unknown".to_string());
                    names.insert(order.da_id, name.clone());
                    name
                }
            };
            let sla = SlaStatus::at(dispatched, now);
            let bonus = BonusStatus::at(dispatched, order.delivered_at, now);
            rows.push(SlaBoardRow {
                order_id: order.id,
                reference: order.reference,
                da_id: order.da_id,
                da_name,
                customer_name: order.customer_name,
                status: order.status,
                amount_kobo: order.amount_kobo,
                dispatched_at: dispatched,
                deadline: SlaStatus::deadline(dispatched),
                sla_state: sla.label().to_string(),
                sla_display: sla.to_string(),
                bonus_state: bonus.label().to_string(),
            });
        }
        Ok(rows)
    }

    /// Orders awaiting approval with their checklists, oldest first
    pub async fn approval_queue(&self) -> Result<Vec<ApprovalQueueRow>, AppError> {
        let mut names: HashMap<AgentId, String> = HashMap::new();
        let mut rows = Vec::new();

        let mut waiting = self
            .deliveries
            .list(Some(DeliveryStatus::AwaitingApproval), None)
            .await?;
        waiting.sort_by_key(|o| o.delivered_at);

        for order in waiting {
            let blockers = self.blockers_for(&order).await?;
            let da_name = match names.get(&order.da_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .agents
                        .find_by_id(&order.da_id)
                        .await?
                        .map(|da| da.name)
                        .unwrap_or_else(|| "unknown".to_string());
                    names.insert(order.da_id, name.clone());
                    name
                }
            };
            rows.push(ApprovalQueueRow {
                order_id: order.id,
                reference: order.reference,
                da_id: order.da_id,
                da_name,
                customer_name: order.customer_name,
                amount_kobo: order.amount_kobo,
                delivered_at: order.delivered_at,
                can_approve: blockers.is_empty(),
                blockers,
            });
        }
        Ok(rows)
    }

    async fn fetch(&self, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        self.deliveries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("delivery order {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::adapters::memory::{
        MemoryAgentRepository, MemoryDeliveryRepository, MemoryFraudFlagRepository,
        MemoryPaymentRepository, MemoryStockRepository,
    };
    use crate::domain::entities::{
        LineItem, NewDeliveryAgent, NewDeliveryOrder, NewPayment, NewProductStock, PaymentChannel,
        PaymentMethod, Sku,
    };
    use crate::test_utils::test_supervisor;

    type Service = ApprovalService<
        MemoryDeliveryRepository,
        MemoryPaymentRepository,
        MemoryFraudFlagRepository,
        MemoryStockRepository,
        MemoryAgentRepository,
    >;

    struct Harness {
        service: Service,
        deliveries: Arc<MemoryDeliveryRepository>,
        payments: Arc<MemoryPaymentRepository>,
        flags: Arc<MemoryFraudFlagRepository>,
        stocks: Arc<MemoryStockRepository>,
        agents: Arc<MemoryAgentRepository>,
    }

    fn create_service() -> Harness {
        let deliveries = Arc::new(MemoryDeliveryRepository::new());
        let payments = Arc::new(MemoryPaymentRepository::new());
        let flags = Arc::new(MemoryFraudFlagRepository::new());
        let stocks = Arc::new(MemoryStockRepository::new());
        let agents = Arc::new(MemoryAgentRepository::new());
        let service = ApprovalService::new(
            deliveries.clone(),
            payments.clone(),
            flags.clone(),
            stocks.clone(),
            agents.clone(),
        );
        Harness {
            service,
            deliveries,
            payments,
            flags,
            stocks,
            agents,
        }
    }

    /// An order dispatched 20h ago, delivered 10h ago, with photo attached
    /// and payment confirmed: approvable as it stands.
    async fn approvable_order(h: &Harness) -> (AgentId, DeliveryOrder) {
        let da = h
            .agents
            .create(&NewDeliveryAgent {
                name: "Aisha Bello".to_string(),
                phone: "08021112222".to_string(),
                territory: "Ikeja".to_string(),
            })
            .await
            .unwrap();
        h.stocks
            .create_product(&NewProductStock {
                sku: Sku::from("SKU-BEV-001"),
                name: "Bottled water 75cl".to_string(),
                category: "Beverages".to_string(),
                unit_price_kobo: 25_000,
                warehouse_qty: 100,
                reorder_level: 20,
            })
            .await
            .unwrap();
        h.stocks
            .transfer_to_da(&da.id, &Sku::from("SKU-BEV-001"), 10)
            .await
            .unwrap();

        let order = h
            .deliveries
            .create(
                &NewDeliveryOrder {
                    da_id: da.id,
                    customer_name: "Bisi Ade".to_string(),
                    customer_phone: "08087654321".to_string(),
                    customer_address: "4 Bode Thomas, Surulere".to_string(),
                    items: vec![LineItem {
                        sku: Sku::from("SKU-BEV-001"),
                        qty: 4,
                        unit_price_kobo: 25_000,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                100_000,
            )
            .await
            .unwrap();

        let now = Utc::now();
        h.deliveries
            .dispatch(&order.id, "otp-hash", now - Duration::hours(20))
            .await
            .unwrap();
        h.deliveries
            .mark_delivered(&order.id, now - Duration::hours(10))
            .await
            .unwrap();
        h.deliveries
            .set_proof_photo(&order.id, "photos/do-1001.jpg")
            .await
            .unwrap();
        h.payments
            .create_confirmed(
                &NewPayment {
                    order_id: order.id,
                    da_id: da.id,
                    amount_kobo: 100_000,
                    channel: PaymentChannel::MoniepointTransfer,
                    reference: Some("MP-TEST000001".to_string()),
                },
                now - Duration::hours(9),
            )
            .await
            .unwrap();

        let order = h.deliveries.find_by_id(&order.id).await.unwrap().unwrap();
        (da.id, order)
    }

    #[tokio::test]
    async fn approve_happy_path_freezes_bonus_and_decrements_stock() {
        let h = create_service();
        let (da_id, order) = approvable_order(&h).await;

        let approved = h
            .service
            .approve(&test_supervisor(), &order.id)
            .await
            .unwrap();

        assert_eq!(approved.status, DeliveryStatus::Approved);
        // Delivered 10h after dispatch, inside the 12h bonus window
        assert_eq!(approved.bonus_eligible, Some(true));
        assert!(approved.resolved_at.is_some());
        assert_eq!(
            h.stocks
                .holding_qty(&da_id, &Sku::from("SKU-BEV-001"))
                .await
                .unwrap(),
            6
        );
    }

    #[tokio::test]
    async fn blocked_approval_reports_every_blocker() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;
        // Strip the photo off an otherwise approvable order
        let bare = DeliveryOrder {
            proof_photo_ref: None,
            otp_verified_at: None,
            ..order.clone()
        };

        let approved = h.service.approve(&test_supervisor(), &order.id).await;
        assert!(approved.is_ok(), "untouched order should approve");

        let blockers = h.service.blockers_for(&bare).await.unwrap();
        assert_eq!(
            blockers,
            vec![
                ApprovalBlocker::OtpNotVerified,
                ApprovalBlocker::MissingProofPhoto,
            ]
        );
    }

    #[tokio::test]
    async fn unsettled_payment_blocks_approval() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;
        // A second, larger order with no payment behind it
        let unpaid = h
            .deliveries
            .create(
                &NewDeliveryOrder {
                    da_id: order.da_id,
                    customer_name: "Kunle A".to_string(),
                    customer_phone: "08087650000".to_string(),
                    customer_address: "12 Allen Ave".to_string(),
                    items: vec![LineItem {
                        sku: Sku::from("SKU-BEV-001"),
                        qty: 2,
                        unit_price_kobo: 25_000,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                50_000,
            )
            .await
            .unwrap();
        let now = Utc::now();
        h.deliveries
            .dispatch(&unpaid.id, "otp-hash", now - Duration::hours(2))
            .await
            .unwrap();
        h.deliveries.mark_delivered(&unpaid.id, now).await.unwrap();
        h.deliveries
            .set_proof_photo(&unpaid.id, "photos/x.jpg")
            .await
            .unwrap();

        let result = h.service.approve(&test_supervisor(), &unpaid.id).await;

        match result {
            Err(AppError::ApprovalBlocked(blockers)) => {
                assert_eq!(blockers, vec![ApprovalBlocker::PaymentNotSettled]);
            }
            other => panic!("expected ApprovalBlocked, got {:?}", other.map(|o| o.status)),
        }
    }

    #[tokio::test]
    async fn open_flag_holds_the_whole_da() {
        let h = create_service();
        let (da_id, order) = approvable_order(&h).await;
        h.flags
            .create(&NewFraudFlag {
                subject: FlagSubject::Agent(da_id),
                da_id,
                reason: FraudReason::ManualReport,
                severity: FraudSeverity::Low,
                detail: "tip-off".to_string(),
                raised_by: None,
            })
            .await
            .unwrap();

        let result = h.service.approve(&test_supervisor(), &order.id).await;

        match result {
            Err(AppError::ApprovalBlocked(blockers)) => {
                assert_eq!(blockers, vec![ApprovalBlocker::FraudHold]);
            }
            other => panic!("expected ApprovalBlocked, got {:?}", other.map(|o| o.status)),
        }
    }

    #[tokio::test]
    async fn ledger_shortfall_flags_but_does_not_block() {
        let h = create_service();
        let (da_id, order) = approvable_order(&h).await;
        // Ledger says the DA holds less than the order line
        h.stocks
            .adjust_holding(&da_id, &Sku::from("SKU-BEV-001"), -8)
            .await
            .unwrap();

        let approved = h
            .service
            .approve(&test_supervisor(), &order.id)
            .await
            .unwrap();

        assert_eq!(approved.status, DeliveryStatus::Approved);
        assert!(h.flags.has_open_for_da(&da_id).await.unwrap());
        assert_eq!(
            h.stocks
                .holding_qty(&da_id, &Sku::from("SKU-BEV-001"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn reject_requires_reason() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;

        let result = h.service.reject(&test_supervisor(), &order.id, "  ").await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("reason"));
    }

    #[tokio::test]
    async fn reject_records_reason_and_reviewer() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;
        let supervisor = test_supervisor();

        let rejected = h
            .service
            .reject(&supervisor, &order.id, "photo shows wrong goods")
            .await
            .unwrap();

        assert_eq!(rejected.status, DeliveryStatus::Rejected);
        assert_eq!(
            rejected.resolution_reason.as_deref(),
            Some("photo shows wrong goods")
        );
        assert_eq!(rejected.reviewed_by, Some(supervisor.id));
    }

    #[tokio::test]
    async fn sla_board_sorts_most_urgent_first() {
        let h = create_service();
        let (da_id, order) = approvable_order(&h).await;
        // A fresher dispatch alongside the 20h-old one
        let fresh = h
            .deliveries
            .create(
                &NewDeliveryOrder {
                    da_id,
                    customer_name: "Kunle A".to_string(),
                    customer_phone: "08087650000".to_string(),
                    customer_address: "12 Allen Ave".to_string(),
                    items: vec![LineItem {
                        sku: Sku::from("SKU-BEV-001"),
                        qty: 1,
                        unit_price_kobo: 25_000,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                25_000,
            )
            .await
            .unwrap();
        h.deliveries
            .dispatch(&fresh.id, "otp-hash", Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        let board = h.service.sla_board().await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].order_id, order.id);
        assert_eq!(board[0].sla_state, "at_risk");
        assert_eq!(board[0].da_name, "Aisha Bello");
        assert_eq!(board[1].order_id, fresh.id);
        assert_eq!(board[1].sla_state, "on_track");
    }

    #[tokio::test]
    async fn approval_queue_carries_checklists() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;

        let queue = h.service.approval_queue().await.unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].order_id, order.id);
        assert!(queue[0].can_approve);
        assert!(queue[0].blockers.is_empty());
    }

    #[tokio::test]
    async fn badges_track_the_clock() {
        let h = create_service();
        let (_, order) = approvable_order(&h).await;

        let badges = h.service.badges_for(&order).await.unwrap();

        assert_eq!(badges.sla_state.as_deref(), Some("at_risk"));
        assert!(badges.sla_display.unwrap().contains("remaining"));
        // Delivered inside the window
        assert_eq!(badges.bonus_state.as_deref(), Some("eligible"));
        assert!(badges.can_approve);
    }
}
