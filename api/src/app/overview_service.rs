//! Overview service
//!
//! Backs the role-tailored dashboard: one request returns every section
//! that role's home screen renders. Sections a role does not see are
//! omitted from the JSON entirely.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::inventory_service::WarehouseStockRow;
use crate::app::ops_config::{SUCCESS_RATE_AMBER, SUCCESS_RATE_GREEN};
use crate::domain::approval::{approval_blockers, ApprovalBlocker, BonusStatus, SlaStatus};
use crate::domain::entities::{
    ratio, AgentId, DeliveryId, DeliveryOrder, DeliveryStatus, FlagId, FlagStatus, FraudReason,
    FraudSeverity, PaymentChannel, PaymentId, PaymentStatus, Quarter, Rag, ReturnId, ReturnReason,
    ReturnStatus, Role, Sku, StockHealth, User,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentRepository, ReturnRepository,
    StockRepository,
};
use crate::error::AppError;

/// How many DAs the supervisor leaderboard strip shows
const TOP_DA_LIMIT: usize = 5;

/// The rendered dashboard for one user
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub role: Role,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub da: Option<DaHome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<OperationsHome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryHome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanySnapshot>,
}

/// A delivery on the DA's home screen. SLA and bonus badges only appear
/// while the order is on the clock.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryCard {
    pub order_id: DeliveryId,
    pub reference: String,
    pub customer_name: String,
    pub customer_address: String,
    pub amount_kobo: i64,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_state: Option<String>,
}

/// A consignment line with its health badge
#[derive(Debug, Clone, Serialize)]
pub struct HoldingCard {
    pub sku: Sku,
    pub name: String,
    pub qty: i64,
    pub health: StockHealth,
}

/// A payment the DA recorded that a supervisor has not confirmed yet
#[derive(Debug, Clone, Serialize)]
pub struct PendingPaymentCard {
    pub payment_id: PaymentId,
    pub order_reference: String,
    pub amount_kobo: i64,
    pub channel: PaymentChannel,
    pub initiated_at: DateTime<Utc>,
}

/// Quarter-to-date headline numbers for one DA
#[derive(Debug, Clone, Serialize)]
pub struct QuarterSnapshot {
    pub quarter: String,
    pub delivered: u64,
    pub resolved: u64,
    pub success_rate: f64,
    pub success: Rag,
    pub bonus_count: u64,
    pub revenue_kobo: i64,
}

/// The DA home screen
#[derive(Debug, Clone, Serialize)]
pub struct DaHome {
    pub pending_dispatch: Vec<DeliveryCard>,
    pub active_deliveries: Vec<DeliveryCard>,
    pub holdings: Vec<HoldingCard>,
    pub pending_payments: Vec<PendingPaymentCard>,
    pub open_flags: u64,
    pub quarter: QuarterSnapshot,
}

/// One order waiting on the supervisor, with its approval checklist
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalCard {
    pub order_id: DeliveryId,
    pub reference: String,
    pub da_id: AgentId,
    pub da_name: String,
    pub amount_kobo: i64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub blockers: Vec<ApprovalBlocker>,
    pub can_approve: bool,
}

/// A payment waiting for supervisor confirmation
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReviewCard {
    pub payment_id: PaymentId,
    pub order_reference: String,
    pub da_id: AgentId,
    pub da_name: String,
    pub amount_kobo: i64,
    pub channel: PaymentChannel,
    pub reference: Option<String>,
    pub initiated_at: DateTime<Utc>,
}

/// An open fraud flag on the supervisor's board
#[derive(Debug, Clone, Serialize)]
pub struct FlagCard {
    pub flag_id: FlagId,
    pub da_id: AgentId,
    pub da_name: String,
    pub reason: FraudReason,
    pub severity: FraudSeverity,
    pub raised_at: DateTime<Utc>,
}

/// A leaderboard strip entry
#[derive(Debug, Clone, Serialize)]
pub struct TopDa {
    pub da_id: AgentId,
    pub name: String,
    pub success_rate: f64,
    pub revenue_kobo: i64,
}

/// The supervisor home screen
#[derive(Debug, Clone, Serialize)]
pub struct OperationsHome {
    pub approval_queue: Vec<ApprovalCard>,
    pub sla_at_risk: u64,
    pub sla_breached: u64,
    pub pending_payments: Vec<PaymentReviewCard>,
    pub open_flags: Vec<FlagCard>,
    pub top_das: Vec<TopDa>,
}

/// A return waiting in the inspection bay
#[derive(Debug, Clone, Serialize)]
pub struct ReturnCard {
    pub return_id: ReturnId,
    pub da_id: AgentId,
    pub da_name: String,
    pub sku: Sku,
    pub claimed_qty: i64,
    pub reason: ReturnReason,
    pub submitted_at: DateTime<Utc>,
}

/// The inventory officer home screen
#[derive(Debug, Clone, Serialize)]
pub struct InventoryHome {
    pub restock: Vec<WarehouseStockRow>,
    pub pending_returns: Vec<ReturnCard>,
    pub out_for_delivery: u64,
}

/// Company headline numbers for the admin's top strip. The full RAG
/// board lives on the company scorecard.
#[derive(Debug, Clone, Serialize)]
pub struct CompanySnapshot {
    pub quarter: String,
    pub revenue_kobo: i64,
    pub orders_approved: u64,
    pub orders_rejected: u64,
    pub orders_failed: u64,
    pub orders_in_flight: u64,
    pub success_rate: f64,
    pub success: Rag,
}

/// Service assembling the per-role dashboard
pub struct OverviewService<DR, PR, FR, SR, AR, RR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    SR: StockRepository,
    AR: AgentRepository,
    RR: ReturnRepository,
{
    deliveries: Arc<DR>,
    payments: Arc<PR>,
    flags: Arc<FR>,
    stocks: Arc<SR>,
    agents: Arc<AR>,
    returns: Arc<RR>,
}

impl<DR, PR, FR, SR, AR, RR> OverviewService<DR, PR, FR, SR, AR, RR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    SR: StockRepository,
    AR: AgentRepository,
    RR: ReturnRepository,
{
    pub fn new(
        deliveries: Arc<DR>,
        payments: Arc<PR>,
        flags: Arc<FR>,
        stocks: Arc<SR>,
        agents: Arc<AR>,
        returns: Arc<RR>,
    ) -> Self {
        Self {
            deliveries,
            payments,
            flags,
            stocks,
            agents,
            returns,
        }
    }

    /// Assemble the dashboard for the requesting user's role
    pub async fn overview(&self, actor: &User) -> Result<Overview, AppError> {
        let now = Utc::now();
        let mut overview = Overview {
            role: actor.role,
            generated_at: now,
            da: None,
            operations: None,
            inventory: None,
            company: None,
        };

        match actor.role {
            Role::DeliveryAgent => {
                let da_id = actor.da_scope().ok_or(AppError::Forbidden)?;
                overview.da = Some(self.da_home(&da_id, now).await?);
            }
            Role::Supervisor => {
                overview.operations = Some(self.operations_home(now).await?);
            }
            Role::InventoryOfficer => {
                overview.inventory = Some(self.inventory_home().await?);
            }
            Role::Admin => {
                overview.company = Some(self.company_snapshot(now).await?);
                overview.operations = Some(self.operations_home(now).await?);
                overview.inventory = Some(self.inventory_home().await?);
            }
        }

        Ok(overview)
    }

    async fn da_home(&self, da_id: &AgentId, now: DateTime<Utc>) -> Result<DaHome, AppError> {
        let orders = self.deliveries.list(None, Some(da_id)).await?;

        let mut pending_dispatch = Vec::new();
        let mut active_deliveries = Vec::new();
        for order in &orders {
            match order.status {
                DeliveryStatus::PendingDispatch => pending_dispatch.push(delivery_card(order, now)),
                DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval => {
                    active_deliveries.push(delivery_card(order, now))
                }
                _ => {}
            }
        }

        let mut holdings = Vec::new();
        for holding in self.stocks.holdings_by_da(da_id).await? {
            let Some(product) = self.stocks.find_by_sku(&holding.sku).await? else {
                continue;
            };
            holdings.push(HoldingCard {
                sku: holding.sku,
                name: product.name,
                qty: holding.qty,
                health: StockHealth::from_qty(holding.qty, product.reorder_level),
            });
        }

        let pending_payments = self
            .payments
            .list(Some(PaymentStatus::Pending), Some(da_id))
            .await?
            .into_iter()
            .map(|payment| {
                let order_reference = orders
                    .iter()
                    .find(|o| o.id == payment.order_id)
                    .map(|o| o.reference.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                PendingPaymentCard {
                    payment_id: payment.id,
                    order_reference,
                    amount_kobo: payment.amount_kobo,
                    channel: payment.channel,
                    initiated_at: payment.initiated_at,
                }
            })
            .collect();

        let open_flags = self.flags.list(Some(FlagStatus::Open), Some(da_id)).await?.len() as u64;

        Ok(DaHome {
            pending_dispatch,
            active_deliveries,
            holdings,
            pending_payments,
            open_flags,
            quarter: quarter_snapshot(&orders, Quarter::current(now)),
        })
    }

    async fn operations_home(&self, now: DateTime<Utc>) -> Result<OperationsHome, AppError> {
        let names = self.da_names().await?;

        // Approval queue, oldest delivery first
        let mut waiting = self
            .deliveries
            .list(Some(DeliveryStatus::AwaitingApproval), None)
            .await?;
        waiting.sort_by_key(|o| o.delivered_at);
        let mut approval_queue = Vec::with_capacity(waiting.len());
        for order in &waiting {
            let has_open_flags = self.flags.has_open_for_da(&order.da_id).await?;
            let settled = self.payment_settled(order).await?;
            let blockers = approval_blockers(order, has_open_flags, settled);
            approval_queue.push(ApprovalCard {
                order_id: order.id,
                reference: order.reference.clone(),
                da_id: order.da_id,
                da_name: da_name(&names, &order.da_id),
                amount_kobo: order.amount_kobo,
                delivered_at: order.delivered_at,
                can_approve: blockers.is_empty(),
                blockers,
            });
        }

        let mut sla_at_risk = 0;
        let mut sla_breached = 0;
        for order in self.deliveries.find_on_sla_clock().await? {
            if let Some(dispatched) = order.dispatched_at {
                match SlaStatus::at(dispatched, now) {
                    SlaStatus::AtRisk { .. } => sla_at_risk += 1,
                    SlaStatus::Breached { .. } => sla_breached += 1,
                    SlaStatus::OnTrack { .. } => {}
                }
            }
        }

        let mut pending_payments = Vec::new();
        for payment in self.payments.list(Some(PaymentStatus::Pending), None).await? {
            let order_reference = self
                .deliveries
                .find_by_id(&payment.order_id)
                .await?
                .map(|o| o.reference)
                .unwrap_or_else(|| "unknown".to_string());
            pending_payments.push(PaymentReviewCard {
                payment_id: payment.id,
                order_reference,
                da_id: payment.da_id,
                da_name: da_name(&names, &payment.da_id),
                amount_kobo: payment.amount_kobo,
                channel: payment.channel,
                reference: payment.reference,
                initiated_at: payment.initiated_at,
            });
        }

        let open_flags = self
            .flags
            .list(Some(FlagStatus::Open), None)
            .await?
            .into_iter()
            .map(|flag| FlagCard {
                flag_id: flag.id,
                da_id: flag.da_id,
                da_name: da_name(&names, &flag.da_id),
                reason: flag.reason,
                severity: flag.severity,
                raised_at: flag.raised_at,
            })
            .collect();

        let top_das = self.top_das(&names, Quarter::current(now)).await?;

        Ok(OperationsHome {
            approval_queue,
            sla_at_risk,
            sla_breached,
            pending_payments,
            open_flags,
            top_das,
        })
    }

    async fn inventory_home(&self) -> Result<InventoryHome, AppError> {
        let mut restock: Vec<WarehouseStockRow> = self
            .stocks
            .list_products()
            .await?
            .into_iter()
            .map(WarehouseStockRow::from)
            .filter(|row| row.health != StockHealth::Healthy)
            .collect();
        restock.sort_by_key(|row| std::cmp::Reverse(row.health.severity()));

        let names = self.da_names().await?;
        let pending_returns = self
            .returns
            .list(Some(ReturnStatus::PendingInspection), None)
            .await?
            .into_iter()
            .map(|ret| ReturnCard {
                return_id: ret.id,
                da_id: ret.da_id,
                da_name: da_name(&names, &ret.da_id),
                sku: ret.sku,
                claimed_qty: ret.claimed_qty,
                reason: ret.reason,
                submitted_at: ret.submitted_at,
            })
            .collect();

        let out_for_delivery = self
            .deliveries
            .list(Some(DeliveryStatus::OutForDelivery), None)
            .await?
            .len() as u64;

        Ok(InventoryHome {
            restock,
            pending_returns,
            out_for_delivery,
        })
    }

    async fn company_snapshot(&self, now: DateTime<Utc>) -> Result<CompanySnapshot, AppError> {
        let quarter = Quarter::current(now);
        let mut snapshot = CompanySnapshot {
            quarter: quarter.to_string(),
            revenue_kobo: 0,
            orders_approved: 0,
            orders_rejected: 0,
            orders_failed: 0,
            orders_in_flight: 0,
            success_rate: 1.0,
            success: Rag::Green,
        };

        for order in self.deliveries.list(None, None).await? {
            if matches!(
                order.status,
                DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
            ) {
                snapshot.orders_in_flight += 1;
            }
            let Some(resolved_at) = order.resolved_at else {
                continue;
            };
            if !quarter.contains(resolved_at) {
                continue;
            }
            match order.status {
                DeliveryStatus::Approved => {
                    snapshot.orders_approved += 1;
                    snapshot.revenue_kobo += order.amount_kobo;
                }
                DeliveryStatus::Rejected => snapshot.orders_rejected += 1,
                DeliveryStatus::Failed => snapshot.orders_failed += 1,
                _ => {}
            }
        }

        let resolved =
            snapshot.orders_approved + snapshot.orders_rejected + snapshot.orders_failed;
        snapshot.success_rate = ratio(snapshot.orders_approved, resolved);
        snapshot.success = Rag::rate(snapshot.success_rate, SUCCESS_RATE_GREEN, SUCCESS_RATE_AMBER);
        Ok(snapshot)
    }

    /// Quarter success standings across every DA with resolved orders
    async fn top_das(
        &self,
        names: &HashMap<AgentId, String>,
        quarter: Quarter,
    ) -> Result<Vec<TopDa>, AppError> {
        // approved, resolved, revenue per DA
        let mut tallies: HashMap<AgentId, (u64, u64, i64)> = HashMap::new();
        for order in self.deliveries.list(None, None).await? {
            let Some(resolved_at) = order.resolved_at else {
                continue;
            };
            if !quarter.contains(resolved_at) {
                continue;
            }
            let entry = tallies.entry(order.da_id).or_default();
            match order.status {
                DeliveryStatus::Approved => {
                    entry.0 += 1;
                    entry.1 += 1;
                    entry.2 += order.amount_kobo;
                }
                DeliveryStatus::Rejected | DeliveryStatus::Failed => entry.1 += 1,
                _ => {}
            }
        }

        let mut top: Vec<TopDa> = tallies
            .into_iter()
            .filter(|(_, (_, resolved, _))| *resolved > 0)
            .map(|(da_id, (approved, resolved, revenue))| TopDa {
                da_id,
                name: da_name(names, &da_id),
                success_rate: ratio(approved, resolved),
                revenue_kobo: revenue,
            })
            .collect();
        top.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.revenue_kobo.cmp(&a.revenue_kobo))
        });
        top.truncate(TOP_DA_LIMIT);
        Ok(top)
    }

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

    async fn da_names(&self) -> Result<HashMap<AgentId, String>, AppError> {
        Ok(self
            .agents
            .list()
            .await?
            .into_iter()
            .map(|da| (da.id, da.name))
            .collect())
    }
}

fn da_name(names: &HashMap<AgentId, String>, da_id: &AgentId) -> String {
    names
        .get(da_id)
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}

fn delivery_card(order: &DeliveryOrder, now: DateTime<Utc>) -> DeliveryCard {
    let on_clock = matches!(
        order.status,
        DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
    );
    let (sla_state, sla_display, bonus_state) = match (on_clock, order.dispatched_at) {
        (true, Some(dispatched)) => {
            let sla = SlaStatus::at(dispatched, now);
            let bonus = BonusStatus::at(dispatched, order.delivered_at, now);
            (
                Some(sla.label().to_string()),
                Some(sla.to_string()),
                Some(bonus.label().to_string()),
            )
        }
        _ => (None, None, None),
    };
    DeliveryCard {
        order_id: order.id,
        reference: order.reference.clone(),
        customer_name: order.customer_name.clone(),
        customer_address: order.customer_address.clone(),
        amount_kobo: order.amount_kobo,
        status: order.status,
        sla_state,
        sla_display,
        bonus_state,
    }
}

fn quarter_snapshot(orders: &[DeliveryOrder], quarter: Quarter) -> QuarterSnapshot {
    let mut delivered = 0;
    let mut resolved = 0;
    let mut bonus_count = 0;
    let mut revenue_kobo = 0;
    for order in orders {
        let Some(resolved_at) = order.resolved_at else {
            continue;
        };
        if !quarter.contains(resolved_at) {
            continue;
        }
        match order.status {
            DeliveryStatus::Approved => {
                delivered += 1;
                resolved += 1;
                revenue_kobo += order.amount_kobo;
                if order.bonus_eligible == Some(true) {
                    bonus_count += 1;
                }
            }
            DeliveryStatus::Rejected | DeliveryStatus::Failed => resolved += 1,
            _ => {}
        }
    }
    let success_rate = ratio(delivered, resolved);
    QuarterSnapshot {
        quarter: quarter.to_string(),
        delivered,
        resolved,
        success_rate,
        success: Rag::rate(success_rate, SUCCESS_RATE_GREEN, SUCCESS_RATE_AMBER),
        bonus_count,
        revenue_kobo,
    }
}
