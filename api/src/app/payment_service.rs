//! Payment service
//!
//! Collection at the door: the DA initiates against the Moniepoint rail
//! (or records cash), staff confirm once the money shows. Duplicate
//! references are flagged rather than silently confirmed.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{
    is_valid_reference, DeliveryId, DeliveryStatus, FlagSubject, FraudReason, FraudSeverity,
    NewFraudFlag, NewPayment, PaymentChannel, PaymentConfirmation, PaymentId, PaymentMethod,
    PaymentStatus, User,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, PaymentGateway, PaymentRepository,
};
use crate::error::{AppError, DomainError};

/// Service for payment collection and confirmation
pub struct PaymentService<PR, DR, FR, AR, G>
where
    PR: PaymentRepository,
    DR: DeliveryRepository,
    FR: FraudFlagRepository,
    AR: AgentRepository,
    G: PaymentGateway,
{
    payments: Arc<PR>,
    deliveries: Arc<DR>,
    flags: Arc<FR>,
    agents: Arc<AR>,
    gateway: Arc<G>,
}

impl<PR, DR, FR, AR, G> PaymentService<PR, DR, FR, AR, G>
where
    PR: PaymentRepository,
    DR: DeliveryRepository,
    FR: FraudFlagRepository,
    AR: AgentRepository,
    G: PaymentGateway,
{
    pub fn new(
        payments: Arc<PR>,
        deliveries: Arc<DR>,
        flags: Arc<FR>,
        agents: Arc<AR>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            payments,
            deliveries,
            flags,
            agents,
            gateway,
        }
    }

    /// DA starts collection for a pay-on-delivery order
    ///
    /// Moniepoint channels get a transaction reference from the gateway;
    /// cash is recorded as-is and confirmed by staff later.
    pub async fn initiate(
        &self,
        actor: &User,
        order_id: &DeliveryId,
        channel: PaymentChannel,
    ) -> Result<PaymentConfirmation, AppError> {
        let order = self
            .deliveries
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("delivery order {}", order_id)))?;
        match actor.da_scope() {
            Some(own) if own == order.da_id => {}
            _ => return Err(AppError::Forbidden),
        }

        if order.payment_method == PaymentMethod::Prepaid {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is prepaid, nothing to collect",
                order.reference
            ))));
        }
        if !matches!(
            order.status,
            DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
        ) {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, collection happens at the door",
                order.reference, order.status
            ))));
        }
        let da = self
            .agents
            .find_by_id(&order.da_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("DA {}", order.da_id)))?;
        if !da.is_operational() {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "DA {} is suspended",
                da.name
            ))));
        }
        if self.settled_amount(order_id).await? >= order.amount_kobo {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is already settled",
                order.reference
            ))));
        }

        let reference = if channel.needs_reference() {
            let intent = self
                .gateway
                .initiate(&order.reference, order.amount_kobo)
                .await?;
            Some(intent.reference)
        } else {
            None
        };

        let payment = self
            .payments
            .create(&NewPayment {
                order_id: order.id,
                da_id: order.da_id,
                amount_kobo: order.amount_kobo,
                channel,
                reference,
            })
            .await?;

        tracing::info!(
            reference = %order.reference,
            payment_id = %payment.id,
            %channel,
            "Collection initiated"
        );
        Ok(payment)
    }

    /// Staff confirm a pending payment
    ///
    /// Moniepoint payments are verified against the gateway first. A
    /// reference already confirmed on another payment marks this one
    /// flagged and raises a fraud flag instead of confirming.
    pub async fn confirm(
        &self,
        actor: &User,
        id: &PaymentId,
    ) -> Result<PaymentConfirmation, AppError> {
        let payment = self.fetch(id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "payment {} is already {}",
                payment.id, payment.status
            ))));
        }

        if payment.channel.needs_reference() {
            let reference = payment.reference.as_deref().ok_or_else(|| {
                AppError::BadRequest(format!(
                    "payment {} has no transaction reference",
                    payment.id
                ))
            })?;
            if !is_valid_reference(reference) {
                return Err(AppError::BadRequest(format!(
                    "'{}' is not a Moniepoint reference",
                    reference
                )));
            }

            let duplicate = self
                .payments
                .find_by_reference(reference)
                .await?
                .into_iter()
                .any(|other| other.id != payment.id && other.status == PaymentStatus::Confirmed);
            if duplicate {
                self.payments.mark_flagged(id).await?;
                self.flags
                    .create(&NewFraudFlag {
                        subject: FlagSubject::Order(payment.order_id),
                        da_id: payment.da_id,
                        reason: FraudReason::DuplicatePaymentReference,
                        severity: FraudSeverity::default_for(
                            FraudReason::DuplicatePaymentReference,
                        ),
                        detail: format!(
                            "payment {}: reference {} already confirmed elsewhere",
                            payment.id, reference
                        ),
                        raised_by: None,
                    })
                    .await?;
                tracing::warn!(
                    payment_id = %payment.id,
                    reference,
                    "Duplicate payment reference, flagged"
                );
                return Err(AppError::Domain(DomainError::Conflict(format!(
                    "reference {} is already confirmed on another payment; this payment has been flagged",
                    reference
                ))));
            }

            let verification = self.gateway.verify(reference).await?;
            if !verification.settled {
                return Err(AppError::Domain(DomainError::Conflict(format!(
                    "gateway reports {} unsettled",
                    reference
                ))));
            }
            if verification.amount_kobo != payment.amount_kobo {
                return Err(AppError::Domain(DomainError::Conflict(format!(
                    "gateway settled {} kobo, payment records {}",
                    verification.amount_kobo, payment.amount_kobo
                ))));
            }
        }

        self.payments.confirm(id, &actor.id, Utc::now()).await?;
        tracing::info!(payment_id = %payment.id, "Payment confirmed");
        self.fetch(id).await
    }

    /// List payments. DAs only see their own.
    pub async fn list_payments(
        &self,
        actor: &User,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentConfirmation>, AppError> {
        let scope = actor.da_scope();
        Ok(self.payments.list(status, scope.as_ref()).await?)
    }

    /// Find a payment. DAs only see their own.
    pub async fn get_payment(
        &self,
        actor: &User,
        id: &PaymentId,
    ) -> Result<PaymentConfirmation, AppError> {
        let payment = self.fetch(id).await?;
        if let Some(own) = actor.da_scope() {
            if payment.da_id != own {
                return Err(AppError::Forbidden);
            }
        }
        Ok(payment)
    }

    async fn settled_amount(&self, order_id: &DeliveryId) -> Result<i64, AppError> {
        Ok(self
            .payments
            .list_by_order(order_id)
            .await?
            .iter()
            .filter(|p| p.status == PaymentStatus::Confirmed)
            .map(|p| p.amount_kobo)
            .sum())
    }

    async fn fetch(&self, id: &PaymentId) -> Result<PaymentConfirmation, AppError> {
        self.payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::adapters::memory::{
        MemoryAgentRepository, MemoryDeliveryRepository, MemoryFraudFlagRepository,
        MemoryPaymentRepository,
    };
    use crate::adapters::SandboxGateway;
    use crate::domain::entities::{
        AgentId, AgentStatus, DeliveryOrder, LineItem, NewDeliveryAgent, NewDeliveryOrder, Sku,
    };
    use crate::test_utils::{test_da_user, test_supervisor, FailingGateway};

    struct Harness<G: PaymentGateway> {
        service: PaymentService<
            MemoryPaymentRepository,
            MemoryDeliveryRepository,
            MemoryFraudFlagRepository,
            MemoryAgentRepository,
            G,
        >,
        deliveries: Arc<MemoryDeliveryRepository>,
        payments: Arc<MemoryPaymentRepository>,
        flags: Arc<MemoryFraudFlagRepository>,
        agents: Arc<MemoryAgentRepository>,
    }

    fn create_service() -> Harness<SandboxGateway> {
        create_service_with(SandboxGateway::new())
    }

    fn create_service_with<G: PaymentGateway>(gateway: G) -> Harness<G> {
        let deliveries = Arc::new(MemoryDeliveryRepository::new());
        let payments = Arc::new(MemoryPaymentRepository::new());
        let flags = Arc::new(MemoryFraudFlagRepository::new());
        let agents = Arc::new(MemoryAgentRepository::new());
        let service = PaymentService::new(
            payments.clone(),
            deliveries.clone(),
            flags.clone(),
            agents.clone(),
            Arc::new(gateway),
        );
        Harness {
            service,
            deliveries,
            payments,
            flags,
            agents,
        }
    }

    /// An out-for-delivery POD order worth 75,000 kobo
    async fn door_order<G: PaymentGateway>(h: &Harness<G>) -> (AgentId, DeliveryOrder) {
        let da = h
            .agents
            .create(&NewDeliveryAgent {
                name: "Tunde Alabi".to_string(),
                phone: "08031234567".to_string(),
                territory: "Surulere".to_string(),
            })
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
                        qty: 3,
                        unit_price_kobo: 25_000,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                75_000,
            )
            .await
            .unwrap();
        h.deliveries
            .dispatch(&order.id, "otp-hash", Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        let order = h.deliveries.find_by_id(&order.id).await.unwrap().unwrap();
        (da.id, order)
    }

    #[tokio::test]
    async fn initiate_moniepoint_assigns_reference() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;

        let payment = h
            .service
            .initiate(
                &test_da_user(da_id),
                &order.id,
                PaymentChannel::MoniepointTransfer,
            )
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount_kobo, 75_000);
        let reference = payment.reference.unwrap();
        assert!(is_valid_reference(&reference));
    }

    #[tokio::test]
    async fn initiate_requires_owning_da() {
        let h = create_service();
        let (_, order) = door_order(&h).await;

        let result = h
            .service
            .initiate(
                &test_da_user(AgentId::new()),
                &order.id,
                PaymentChannel::MoniepointTransfer,
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn suspended_da_cannot_initiate() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;
        h.agents
            .set_status(&da_id, AgentStatus::Suspended)
            .await
            .unwrap();

        let result = h
            .service
            .initiate(&test_da_user(da_id), &order.id, PaymentChannel::Cash)
            .await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("suspended"));
    }

    #[tokio::test]
    async fn initiate_rejects_order_not_at_the_door() {
        let h = create_service();
        let da_id = AgentId::new();
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
                        unit_price_kobo: 25_000,
                    }],
                    payment_method: PaymentMethod::PayOnDelivery,
                },
                25_000,
            )
            .await
            .unwrap();

        let result = h
            .service
            .initiate(&test_da_user(da_id), &order.id, PaymentChannel::Cash)
            .await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("at the door"));
    }

    #[tokio::test]
    async fn confirm_settles_via_gateway() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;
        let supervisor = test_supervisor();
        let payment = h
            .service
            .initiate(
                &test_da_user(da_id),
                &order.id,
                PaymentChannel::MoniepointTransfer,
            )
            .await
            .unwrap();

        let confirmed = h.service.confirm(&supervisor, &payment.id).await.unwrap();

        assert_eq!(confirmed.status, PaymentStatus::Confirmed);
        assert_eq!(confirmed.confirmed_by, Some(supervisor.id));
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn settled_order_refuses_another_collection() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;
        let actor = test_da_user(da_id);
        let payment = h
            .service
            .initiate(&actor, &order.id, PaymentChannel::MoniepointTransfer)
            .await
            .unwrap();
        h.service
            .confirm(&test_supervisor(), &payment.id)
            .await
            .unwrap();

        let result = h
            .service
            .initiate(&actor, &order.id, PaymentChannel::Cash)
            .await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("already settled"));
    }

    #[tokio::test]
    async fn duplicate_reference_flags_instead_of_confirming() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;
        let supervisor = test_supervisor();
        let first = h
            .service
            .initiate(
                &test_da_user(da_id),
                &order.id,
                PaymentChannel::MoniepointTransfer,
            )
            .await
            .unwrap();
        h.service.confirm(&supervisor, &first.id).await.unwrap();

        // Same reference shows up again on a different payment
        let second = h
            .payments
            .create(&NewPayment {
                order_id: order.id,
                da_id,
                amount_kobo: 75_000,
                channel: PaymentChannel::MoniepointPos,
                reference: first.reference.clone(),
            })
            .await
            .unwrap();

        let result = h.service.confirm(&supervisor, &second.id).await;

        assert!(result.is_err());
        let flagged = h.payments.find_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(flagged.status, PaymentStatus::Flagged);
        assert!(h.flags.has_open_for_da(&da_id).await.unwrap());
    }

    #[tokio::test]
    async fn cash_confirms_without_gateway() {
        let h = create_service_with(FailingGateway);
        let (da_id, order) = door_order(&h).await;
        let payment = h
            .service
            .initiate(&test_da_user(da_id), &order.id, PaymentChannel::Cash)
            .await
            .unwrap();

        let confirmed = h
            .service
            .confirm(&test_supervisor(), &payment.id)
            .await
            .unwrap();

        assert_eq!(confirmed.status, PaymentStatus::Confirmed);
        assert!(confirmed.reference.is_none());
    }

    #[tokio::test]
    async fn gateway_outage_blocks_moniepoint_initiation() {
        let h = create_service_with(FailingGateway);
        let (da_id, order) = door_order(&h).await;

        let result = h
            .service
            .initiate(
                &test_da_user(da_id),
                &order.id,
                PaymentChannel::MoniepointPos,
            )
            .await;

        assert!(matches!(result, Err(AppError::Gateway(_))));
    }

    #[tokio::test]
    async fn confirm_requires_pending() {
        let h = create_service();
        let (da_id, order) = door_order(&h).await;
        let supervisor = test_supervisor();
        let payment = h
            .service
            .initiate(
                &test_da_user(da_id),
                &order.id,
                PaymentChannel::MoniepointTransfer,
            )
            .await
            .unwrap();
        h.service.confirm(&supervisor, &payment.id).await.unwrap();

        let result = h.service.confirm(&supervisor, &payment.id).await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("already"));
    }
}
