//! Scorecard service
//!
//! QBR aggregation: rolls resolved orders, payments, and fraud flags up
//! into RAG-rated quarterly scorecards, per DA and company-wide.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::app::ops_config::{
    BONUS_RATE_AMBER, BONUS_RATE_GREEN, COLLECTION_RATE_AMBER, COLLECTION_RATE_GREEN,
    FRAUD_FLAGS_AMBER_MAX, ON_TIME_RATE_AMBER, ON_TIME_RATE_GREEN, SUCCESS_RATE_AMBER,
    SUCCESS_RATE_GREEN,
};
use crate::domain::approval::SlaStatus;
use crate::domain::entities::{
    overall_rating, ratio, AgentId, CompanyScorecard, DaStanding, DeliveryAgent, DeliveryStatus,
    KpiMetric, PaymentStatus, Quarter, Rag, Scorecard, TrendPoint,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentRepository,
};
use crate::error::AppError;

/// Everything one DA did in a quarter, before rating
#[derive(Debug, Default, Clone, Copy)]
struct QuarterTally {
    approved: u64,
    rejected: u64,
    failed: u64,
    on_time: u64,
    bonus: u64,
    revenue_kobo: i64,
    collected_kobo: i64,
    fraud_flags: u64,
}

impl QuarterTally {
    fn resolved(&self) -> u64 {
        self.approved + self.rejected + self.failed
    }

    fn success_rate(&self) -> f64 {
        ratio(self.approved, self.resolved())
    }

    fn add(&mut self, other: &QuarterTally) {
        self.approved += other.approved;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.on_time += other.on_time;
        self.bonus += other.bonus;
        self.revenue_kobo += other.revenue_kobo;
        self.collected_kobo += other.collected_kobo;
        self.fraud_flags += other.fraud_flags;
    }

    fn metrics(&self) -> Vec<KpiMetric> {
        vec![
            KpiMetric::rate(
                "delivery_success_rate",
                self.success_rate(),
                SUCCESS_RATE_GREEN,
                SUCCESS_RATE_AMBER,
            ),
            KpiMetric::rate(
                "on_time_rate",
                ratio(self.on_time, self.approved),
                ON_TIME_RATE_GREEN,
                ON_TIME_RATE_AMBER,
            ),
            KpiMetric::rate(
                "collection_rate",
                ratio(self.collected_kobo as u64, self.revenue_kobo as u64),
                COLLECTION_RATE_GREEN,
                COLLECTION_RATE_AMBER,
            ),
            KpiMetric::rate(
                "bonus_rate",
                ratio(self.bonus, self.approved),
                BONUS_RATE_GREEN,
                BONUS_RATE_AMBER,
            ),
            KpiMetric::count("fraud_flags", self.fraud_flags, FRAUD_FLAGS_AMBER_MAX),
        ]
    }
}

/// Service for quarterly reporting
pub struct ScorecardService<DR, PR, FR, AR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    AR: AgentRepository,
{
    deliveries: Arc<DR>,
    payments: Arc<PR>,
    flags: Arc<FR>,
    agents: Arc<AR>,
}

impl<DR, PR, FR, AR> ScorecardService<DR, PR, FR, AR>
where
    DR: DeliveryRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    AR: AgentRepository,
{
    pub fn new(deliveries: Arc<DR>, payments: Arc<PR>, flags: Arc<FR>, agents: Arc<AR>) -> Self {
        Self {
            deliveries,
            payments,
            flags,
            agents,
        }
    }

    /// One DA's scorecard; defaults to the current quarter
    pub async fn da_scorecard(
        &self,
        da_id: &AgentId,
        quarter: Option<Quarter>,
    ) -> Result<Scorecard, AppError> {
        let da = self
            .agents
            .find_by_id(da_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("DA {}", da_id)))?;
        let quarter = quarter.unwrap_or_else(|| Quarter::current(Utc::now()));
        let tally = self.tally(da_id, quarter).await?;
        Ok(self.card(&da, quarter, &tally))
    }

    /// Every DA's scorecard, best quarter first
    pub async fn leaderboard(&self, quarter: Option<Quarter>) -> Result<Vec<Scorecard>, AppError> {
        let quarter = quarter.unwrap_or_else(|| Quarter::current(Utc::now()));
        let mut cards = Vec::new();
        for da in self.agents.list().await? {
            let tally = self.tally(&da.id, quarter).await?;
            cards.push((tally.success_rate(), self.card(&da, quarter, &tally)));
        }
        cards.sort_by(|(a_rate, a), (b_rate, b)| {
            b_rate
                .partial_cmp(a_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.revenue_kobo.cmp(&a.revenue_kobo))
        });
        Ok(cards.into_iter().map(|(_, card)| card).collect())
    }

    /// The company-wide quarter in review
    pub async fn company(&self, quarter: Option<Quarter>) -> Result<CompanyScorecard, AppError> {
        let quarter = quarter.unwrap_or_else(|| Quarter::current(Utc::now()));

        let mut total = QuarterTally::default();
        let mut best: Option<(f64, DaStanding)> = None;
        let mut worst: Option<(f64, DaStanding)> = None;
        let mut das_active = 0;

        for da in self.agents.list().await? {
            let tally = self.tally(&da.id, quarter).await?;
            total.add(&tally);
            if tally.resolved() == 0 {
                continue;
            }
            das_active += 1;
            let rate = tally.success_rate();
            let standing = DaStanding {
                da_id: da.id,
                name: da.name.clone(),
                success_rate: rate,
                overall: overall_rating(&tally.metrics()),
            };
            if best.as_ref().map_or(true, |(r, _)| rate > *r) {
                best = Some((rate, standing.clone()));
            }
            if worst.as_ref().map_or(true, |(r, _)| rate < *r) {
                worst = Some((rate, standing));
            }
        }

        let metrics = total.metrics();
        let trend = self.trend(quarter).await?;

        Ok(CompanyScorecard {
            quarter,
            das_active,
            approved: total.approved,
            rejected: total.rejected,
            failed: total.failed,
            revenue_kobo: total.revenue_kobo,
            collected_kobo: total.collected_kobo,
            overall: overall_rating(&metrics),
            metrics,
            trend,
            best_da: best.map(|(_, s)| s),
            worst_da: worst.map(|(_, s)| s),
        })
    }

    fn card(&self, da: &DeliveryAgent, quarter: Quarter, tally: &QuarterTally) -> Scorecard {
        let metrics = tally.metrics();
        Scorecard {
            da_id: da.id,
            da_name: da.name.clone(),
            quarter,
            approved: tally.approved,
            rejected: tally.rejected,
            failed: tally.failed,
            revenue_kobo: tally.revenue_kobo,
            overall: overall_rating(&metrics),
            metrics,
        }
    }

    /// Walk a DA's quarter: resolved orders, their payments, their flags
    async fn tally(&self, da_id: &AgentId, quarter: Quarter) -> Result<QuarterTally, AppError> {
        let mut tally = QuarterTally::default();

        let confirmed_by_order: HashMap<_, i64> = self
            .payments
            .list(Some(PaymentStatus::Confirmed), Some(da_id))
            .await?
            .into_iter()
            .fold(HashMap::new(), |mut acc, p| {
                *acc.entry(p.order_id).or_insert(0) += p.amount_kobo;
                acc
            });

        for order in self.deliveries.list(None, Some(da_id)).await? {
            let Some(resolved_at) = order.resolved_at else {
                continue;
            };
            if !quarter.contains(resolved_at) {
                continue;
            }
            match order.status {
                DeliveryStatus::Approved => {
                    tally.approved += 1;
                    tally.revenue_kobo += order.amount_kobo;
                    let collected = confirmed_by_order.get(&order.id).copied().unwrap_or(0);
                    tally.collected_kobo += collected.min(order.amount_kobo);
                    if order.bonus_eligible == Some(true) {
                        tally.bonus += 1;
                    }
                    if let (Some(dispatched), Some(delivered)) =
                        (order.dispatched_at, order.delivered_at)
                    {
                        if delivered <= SlaStatus::deadline(dispatched) {
                            tally.on_time += 1;
                        }
                    }
                }
                DeliveryStatus::Rejected => tally.rejected += 1,
                DeliveryStatus::Failed => tally.failed += 1,
                _ => {}
            }
        }

        tally.fraud_flags = self
            .flags
            .count_for_da_between(da_id, quarter.start(), quarter.end())
            .await?;

        Ok(tally)
    }

    /// Weekly buckets of approved deliveries across the quarter, up to now
    async fn trend(&self, quarter: Quarter) -> Result<Vec<TrendPoint>, AppError> {
        let approved: Vec<_> = self
            .deliveries
            .list(Some(DeliveryStatus::Approved), None)
            .await?
            .into_iter()
            .filter(|o| o.resolved_at.map_or(false, |at| quarter.contains(at)))
            .collect();

        let now = Utc::now();
        let mut points = Vec::new();
        let mut week_start = quarter.start();
        while week_start < quarter.end() && week_start <= now {
            let week_end = week_start + Duration::weeks(1);
            let in_week = |at| at >= week_start && at < week_end;
            let deliveries = approved
                .iter()
                .filter(|o| o.resolved_at.map_or(false, in_week))
                .count() as u64;
            let revenue_kobo = approved
                .iter()
                .filter(|o| o.resolved_at.map_or(false, in_week))
                .map(|o| o.amount_kobo)
                .sum();
            points.push(TrendPoint {
                week_start,
                deliveries,
                revenue_kobo,
            });
            week_start = week_end;
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    use crate::adapters::memory::{
        MemoryAgentRepository, MemoryDeliveryRepository, MemoryFraudFlagRepository,
        MemoryPaymentRepository,
    };
    use crate::domain::entities::{
        DeliveryOrder, LineItem, NewDeliveryAgent, NewDeliveryOrder, NewPayment, PaymentChannel,
        PaymentMethod, Sku, UserId,
    };

    type Service = ScorecardService<
        MemoryDeliveryRepository,
        MemoryPaymentRepository,
        MemoryFraudFlagRepository,
        MemoryAgentRepository,
    >;

    struct Harness {
        service: Service,
        deliveries: Arc<MemoryDeliveryRepository>,
        payments: Arc<MemoryPaymentRepository>,
        agents: Arc<MemoryAgentRepository>,
    }

    fn create_service() -> Harness {
        let deliveries = Arc::new(MemoryDeliveryRepository::new());
        let payments = Arc::new(MemoryPaymentRepository::new());
        let flags = Arc::new(MemoryFraudFlagRepository::new());
        let agents = Arc::new(MemoryAgentRepository::new());
        let service = ScorecardService::new(
            deliveries.clone(),
            payments.clone(),
            flags.clone(),
            agents.clone(),
        );
        Harness {
            service,
            deliveries,
            payments,
            agents,
        }
    }

    async fn make_da(h: &Harness, name: &str) -> AgentId {
        h.agents
            .create(&NewDeliveryAgent {
                name: name.to_string(),
                phone: "08031234567".to_string(),
                territory: "Surulere".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    /// A fixed mid-quarter instant so resolution times never straddle a
    /// quarter boundary when the suite runs
    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 15, 12, 0, 0).single().unwrap()
    }

    fn anchor_quarter() -> Quarter {
        Quarter {
            year: 2026,
            quarter: 2,
        }
    }

    /// Create an order resolved at `resolved_at`. `delivered_hours_after`
    /// positions delivery relative to dispatch (24h earlier than delivery).
    async fn resolved_order(
        h: &Harness,
        da_id: AgentId,
        amount_kobo: i64,
        resolved_at: DateTime<Utc>,
        delivered_hours_after_dispatch: i64,
        outcome: DeliveryStatus,
        pay_kobo: i64,
    ) -> DeliveryOrder {
        let order = h
            .deliveries
            .create(
                &NewDeliveryOrder {
                    da_id,
                    customer_name: "Bisi Ade".to_string(),
                    customer_phone: "08087654321".to_string(),
                    customer_address: "4 Bode Thomas".to_string(),
                    items: vec![LineItem {
                        sku: Sku::from("SKU-BEV-001"),
                        qty: 1,
                        unit_price_kobo: amount_kobo,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                amount_kobo,
            )
            .await
            .unwrap();

        let dispatched = resolved_at - Duration::hours(delivered_hours_after_dispatch + 1);
        let delivered = dispatched + Duration::hours(delivered_hours_after_dispatch);
        h.deliveries
            .dispatch(&order.id, "otp-hash", dispatched)
            .await
            .unwrap();
        let reviewer = UserId::new();
        match outcome {
            DeliveryStatus::Approved => {
                h.deliveries.mark_delivered(&order.id, delivered).await.unwrap();
                if pay_kobo > 0 {
                    h.payments
                        .create_confirmed(
                            &NewPayment {
                                order_id: order.id,
                                da_id,
                                amount_kobo: pay_kobo,
                                channel: PaymentChannel::MoniepointTransfer,
                                reference: None,
                            },
                            delivered,
                        )
                        .await
                        .unwrap();
                }
                let bonus = delivered <= dispatched + Duration::hours(12);
                h.deliveries
                    .approve(&order.id, &reviewer, resolved_at, bonus)
                    .await
                    .unwrap();
            }
            DeliveryStatus::Rejected => {
                h.deliveries.mark_delivered(&order.id, delivered).await.unwrap();
                h.deliveries
                    .reject(&order.id, &reviewer, resolved_at, "short delivery")
                    .await
                    .unwrap();
            }
            DeliveryStatus::Failed => {
                h.deliveries
                    .fail(&order.id, resolved_at, Some("customer not home"))
                    .await
                    .unwrap();
            }
            other => panic!("unsupported outcome {:?}", other),
        }
        h.deliveries.find_by_id(&order.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn da_scorecard_rates_the_quarter() {
        let h = create_service();
        let da = make_da(&h, "Emeka Obi").await;
        let at = anchor();

        // On time, in bonus window, fully collected
        resolved_order(&h, da, 100_000, at - Duration::hours(2), 10, DeliveryStatus::Approved, 100_000).await;
        // Late (30h after dispatch), no payment behind it
        resolved_order(&h, da, 50_000, at - Duration::hours(1), 30, DeliveryStatus::Approved, 0).await;
        resolved_order(&h, da, 25_000, at, 5, DeliveryStatus::Rejected, 0).await;

        let card = h
            .service
            .da_scorecard(&da, Some(anchor_quarter()))
            .await
            .unwrap();

        assert_eq!(card.approved, 2);
        assert_eq!(card.rejected, 1);
        assert_eq!(card.failed, 0);
        assert_eq!(card.revenue_kobo, 150_000);

        let by_name: HashMap<_, _> = card
            .metrics
            .iter()
            .map(|m| (m.name.as_str(), m))
            .collect();
        let success = by_name["delivery_success_rate"];
        assert!((success.value - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(success.rating, Rag::Red);
        let on_time = by_name["on_time_rate"];
        assert!((on_time.value - 0.5).abs() < 1e-9);
        let collection = by_name["collection_rate"];
        assert!((collection.value - 100_000.0 / 150_000.0).abs() < 1e-9);
        let bonus = by_name["bonus_rate"];
        assert!((bonus.value - 0.5).abs() < 1e-9);
        assert_eq!(by_name["fraud_flags"].value, 0.0);
        assert_eq!(card.overall, Rag::Red);
    }

    #[tokio::test]
    async fn empty_quarter_rates_green() {
        let h = create_service();
        let da = make_da(&h, "Emeka Obi").await;

        let card = h
            .service
            .da_scorecard(&da, Some(anchor_quarter()))
            .await
            .unwrap();

        assert_eq!(card.approved, 0);
        assert_eq!(card.revenue_kobo, 0);
        assert_eq!(card.overall, Rag::Green);
    }

    #[tokio::test]
    async fn quarter_filter_excludes_other_quarters() {
        let h = create_service();
        let da = make_da(&h, "Emeka Obi").await;
        // Resolved just before the quarter opened
        let old = anchor_quarter().start() - Duration::hours(1);
        resolved_order(&h, da, 100_000, old, 5, DeliveryStatus::Approved, 100_000).await;

        let card = h
            .service
            .da_scorecard(&da, Some(anchor_quarter()))
            .await
            .unwrap();

        assert_eq!(card.approved, 0);
        assert_eq!(card.revenue_kobo, 0);
    }

    #[tokio::test]
    async fn company_rolls_up_and_picks_best_and_worst() {
        let h = create_service();
        let good = make_da(&h, "Aisha Bello").await;
        let bad = make_da(&h, "Yusuf Danladi").await;
        // A third DA with no activity, to keep das_active honest
        let _idle = make_da(&h, "Emeka Obi").await;
        let at = anchor();

        resolved_order(&h, good, 100_000, at - Duration::hours(3), 8, DeliveryStatus::Approved, 100_000).await;
        resolved_order(&h, good, 80_000, at - Duration::hours(2), 9, DeliveryStatus::Approved, 80_000).await;
        resolved_order(&h, bad, 60_000, at - Duration::hours(1), 5, DeliveryStatus::Failed, 0).await;

        let company = h.service.company(Some(anchor_quarter())).await.unwrap();

        assert_eq!(company.das_active, 2);
        assert_eq!(company.approved, 2);
        assert_eq!(company.failed, 1);
        assert_eq!(company.revenue_kobo, 180_000);
        assert_eq!(company.collected_kobo, 180_000);
        assert_eq!(company.best_da.as_ref().unwrap().name, "Aisha Bello");
        assert_eq!(company.worst_da.as_ref().unwrap().name, "Yusuf Danladi");

        let total_trend: u64 = company.trend.iter().map(|p| p.deliveries).sum();
        assert_eq!(total_trend, 2);
        let trend_revenue: i64 = company.trend.iter().map(|p| p.revenue_kobo).sum();
        assert_eq!(trend_revenue, 180_000);
    }

    #[tokio::test]
    async fn leaderboard_sorts_best_first() {
        let h = create_service();
        let strong = make_da(&h, "Aisha Bello").await;
        let weak = make_da(&h, "Yusuf Danladi").await;
        let at = anchor();

        resolved_order(&h, strong, 100_000, at - Duration::hours(2), 8, DeliveryStatus::Approved, 100_000).await;
        resolved_order(&h, weak, 50_000, at - Duration::hours(2), 8, DeliveryStatus::Approved, 50_000).await;
        resolved_order(&h, weak, 50_000, at - Duration::hours(1), 5, DeliveryStatus::Failed, 0).await;

        let board = h.service.leaderboard(Some(anchor_quarter())).await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].da_name, "Aisha Bello");
        assert_eq!(board[1].da_name, "Yusuf Danladi");
    }

    #[tokio::test]
    async fn overpayment_does_not_inflate_collection() {
        let h = create_service();
        let da = make_da(&h, "Emeka Obi").await;
        resolved_order(&h, da, 100_000, anchor(), 5, DeliveryStatus::Approved, 120_000).await;

        let card = h
            .service
            .da_scorecard(&da, Some(anchor_quarter()))
            .await
            .unwrap();

        let collection = card
            .metrics
            .iter()
            .find(|m| m.name == "collection_rate")
            .unwrap();
        assert!((collection.value - 1.0).abs() < 1e-9);
    }
}
