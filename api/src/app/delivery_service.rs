//! Delivery service
//!
//! The order lifecycle from creation through dispatch, OTP verification at
//! the door, and the failure paths. Approval itself lives in
//! `approval_service`.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;

use crate::app::ops_config::{MAX_OTP_ATTEMPTS, OTP_DIGITS};
use crate::app::user_service::hash_token;
use crate::domain::entities::{
    is_valid_phone, AgentId, DeliveryId, DeliveryOrder, DeliveryStatus, FlagSubject, FraudReason,
    FraudSeverity, LineItem, NewDeliveryOrder, NewFraudFlag, NewPayment, PaymentChannel,
    PaymentMethod, Sku, User,
};
use crate::domain::ports::{
    AgentRepository, DeliveryRepository, FraudFlagRepository, OtpNotifier, PaymentRepository,
    StockRepository,
};
use crate::error::{AppError, DomainError};

/// One requested line of an order, priced by the service
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub sku: Sku,
    pub qty: i64,
}

/// Data needed to open a delivery order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub da_id: AgentId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

/// Service for the delivery order lifecycle
pub struct DeliveryService<DR, AR, SR, PR, FR, N>
where
    DR: DeliveryRepository,
    AR: AgentRepository,
    SR: StockRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    N: OtpNotifier,
{
    deliveries: Arc<DR>,
    agents: Arc<AR>,
    stocks: Arc<SR>,
    payments: Arc<PR>,
    flags: Arc<FR>,
    notifier: Arc<N>,
}

impl<DR, AR, SR, PR, FR, N> DeliveryService<DR, AR, SR, PR, FR, N>
where
    DR: DeliveryRepository,
    AR: AgentRepository,
    SR: StockRepository,
    PR: PaymentRepository,
    FR: FraudFlagRepository,
    N: OtpNotifier,
{
    pub fn new(
        deliveries: Arc<DR>,
        agents: Arc<AR>,
        stocks: Arc<SR>,
        payments: Arc<PR>,
        flags: Arc<FR>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            deliveries,
            agents,
            stocks,
            payments,
            flags,
            notifier,
        }
    }

    /// Open an order against a DA's consignment
    ///
    /// Lines are priced from the catalogue at creation time. Prepaid orders
    /// get a settled payment record up front.
    pub async fn create_order(&self, req: CreateOrder) -> Result<DeliveryOrder, AppError> {
        if req.customer_name.is_empty() || req.customer_name.len() > 100 {
            return Err(AppError::BadRequest(
                "Customer name must be between 1 and 100 characters".to_string(),
            ));
        }
        if !is_valid_phone(&req.customer_phone) {
            return Err(AppError::BadRequest(format!(
                "'{}' is not a valid Nigerian mobile number",
                req.customer_phone
            )));
        }
        if req.customer_address.is_empty() {
            return Err(AppError::BadRequest(
                "Delivery address must not be empty".to_string(),
            ));
        }
        if req.items.is_empty() {
            return Err(AppError::BadRequest(
                "Order must have at least one line".to_string(),
            ));
        }

        let da = self
            .agents
            .find_by_id(&req.da_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("DA {}", req.da_id)))?;
        if !da.is_operational() {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "DA {} is suspended and cannot take orders",
                da.name
            ))));
        }

        // Price each line and check it against the DA's consignment
        let mut items = Vec::with_capacity(req.items.len());
        for line in &req.items {
            if line.qty <= 0 {
                return Err(AppError::BadRequest(format!(
                    "Quantity for {} must be positive",
                    line.sku
                )));
            }
            if items.iter().any(|i: &LineItem| i.sku == line.sku) {
                return Err(AppError::BadRequest(format!(
                    "Duplicate line for {}",
                    line.sku
                )));
            }
            let product = self
                .stocks
                .find_by_sku(&line.sku)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product {}", line.sku)))?;
            let held = self.stocks.holding_qty(&req.da_id, &line.sku).await?;
            if held < line.qty {
                return Err(AppError::Domain(DomainError::Conflict(format!(
                    "DA holds {} of {}, order needs {}",
                    held, line.sku, line.qty
                ))));
            }
            items.push(LineItem {
                sku: line.sku.clone(),
                qty: line.qty,
                unit_price_kobo: product.unit_price_kobo,
            });
        }
        let amount_kobo: i64 = items.iter().map(LineItem::line_total).sum();

        let new_order = NewDeliveryOrder {
            da_id: req.da_id,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            customer_address: req.customer_address,
            items,
            payment_method: req.payment_method,
        };
        let order = self.deliveries.create(&new_order, amount_kobo).await?;

        if order.payment_method == PaymentMethod::Prepaid {
            let payment = NewPayment {
                order_id: order.id,
                da_id: order.da_id,
                amount_kobo,
                channel: PaymentChannel::MoniepointTransfer,
                reference: None,
            };
            self.payments.create_confirmed(&payment, Utc::now()).await?;
        }

        tracing::info!(reference = %order.reference, da_id = %order.da_id, amount_kobo, "Order created");
        Ok(order)
    }

    /// DA takes the order out; generates the OTP and texts the customer
    pub async fn dispatch(&self, actor: &User, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        let order = self.get_owned(actor, id).await?;
        if !order.can_dispatch() {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, not pending dispatch",
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

        // Customer must hold the code before the order moves
        let code = generate_otp();
        self.notifier
            .send_otp(&order.customer_phone, &code, &order.reference)
            .await?;
        self.deliveries
            .dispatch(id, &hash_token(&code), Utc::now())
            .await?;

        tracing::info!(reference = %order.reference, "Order dispatched, OTP sent");
        self.fetch(id).await
    }

    /// Customer reads their OTP back to the DA at the door
    pub async fn submit_otp(
        &self,
        actor: &User,
        id: &DeliveryId,
        code: &str,
    ) -> Result<DeliveryOrder, AppError> {
        let order = self.get_owned(actor, id).await?;
        if order.status != DeliveryStatus::OutForDelivery {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, not out for delivery",
                order.reference, order.status
            ))));
        }
        if order.otp_locked {
            return Err(AppError::Domain(DomainError::Conflict(
                "OTP is locked after too many failed attempts; a supervisor can reissue it"
                    .to_string(),
            )));
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

        if order.otp_hash.as_deref() == Some(hash_token(code).as_str()) {
            self.deliveries.mark_delivered(id, Utc::now()).await?;
            tracing::info!(reference = %order.reference, "OTP verified, delivery awaiting approval");
            return self.fetch(id).await;
        }

        let attempts = self.deliveries.record_failed_otp(id).await?;
        if attempts >= MAX_OTP_ATTEMPTS {
            self.deliveries.lock_otp(id).await?;
            let flag = NewFraudFlag {
                subject: FlagSubject::Order(*id),
                da_id: order.da_id,
                reason: FraudReason::OtpRetriesExceeded,
                severity: FraudSeverity::default_for(FraudReason::OtpRetriesExceeded),
                detail: format!(
                    "order {}: OTP locked after {} failed attempts",
                    order.reference, attempts
                ),
                raised_by: None,
            };
            self.flags.create(&flag).await?;
            tracing::warn!(reference = %order.reference, attempts, "OTP locked, fraud flag raised");
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "Incorrect OTP; locked after {} failed attempts",
                attempts
            ))));
        }

        Err(AppError::BadRequest(format!(
            "Incorrect OTP, {} attempts remaining",
            MAX_OTP_ATTEMPTS - attempts
        )))
    }

    /// Supervisor resets a locked or lost OTP and re-texts the customer
    pub async fn reissue_otp(&self, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        let order = self.fetch(id).await?;
        if order.status != DeliveryStatus::OutForDelivery {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, not out for delivery",
                order.reference, order.status
            ))));
        }

        let code = generate_otp();
        self.notifier
            .send_otp(&order.customer_phone, &code, &order.reference)
            .await?;
        self.deliveries.reset_otp(id, &hash_token(&code)).await?;

        tracing::info!(reference = %order.reference, "OTP reissued");
        self.fetch(id).await
    }

    /// Attach the proof-of-delivery photo reference
    pub async fn attach_photo(
        &self,
        actor: &User,
        id: &DeliveryId,
        photo_ref: &str,
    ) -> Result<DeliveryOrder, AppError> {
        if photo_ref.is_empty() {
            return Err(AppError::BadRequest(
                "Photo reference must not be empty".to_string(),
            ));
        }
        let order = self.get_owned(actor, id).await?;
        if !matches!(
            order.status,
            DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
        ) {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, photo no longer expected",
                order.reference, order.status
            ))));
        }

        self.deliveries.set_proof_photo(id, photo_ref).await?;
        self.fetch(id).await
    }

    /// DA could not complete the delivery
    pub async fn mark_failed(
        &self,
        actor: &User,
        id: &DeliveryId,
        reason: Option<&str>,
    ) -> Result<DeliveryOrder, AppError> {
        let order = self.get_owned(actor, id).await?;
        if order.status != DeliveryStatus::OutForDelivery {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, not out for delivery",
                order.reference, order.status
            ))));
        }

        self.deliveries.fail(id, Utc::now(), reason).await?;
        tracing::info!(reference = %order.reference, "Delivery marked failed");
        self.fetch(id).await
    }

    /// Withdraw an order that has not left the warehouse
    pub async fn cancel(&self, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        let order = self.fetch(id).await?;
        if order.status != DeliveryStatus::PendingDispatch {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "order {} is {}, only pending orders can be cancelled",
                order.reference, order.status
            ))));
        }

        self.deliveries.cancel(id, Utc::now()).await?;
        self.fetch(id).await
    }

    /// List orders. DAs only see their own.
    pub async fn list_orders(
        &self,
        actor: &User,
        status: Option<DeliveryStatus>,
        da_id: Option<AgentId>,
    ) -> Result<Vec<DeliveryOrder>, AppError> {
        let scope = actor.da_scope().or(da_id);
        Ok(self.deliveries.list(status, scope.as_ref()).await?)
    }

    /// Find an order. DAs only see their own.
    pub async fn get_order(&self, actor: &User, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        self.get_owned(actor, id).await
    }

    async fn fetch(&self, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        self.deliveries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("delivery order {}", id)))
    }

    async fn get_owned(&self, actor: &User, id: &DeliveryId) -> Result<DeliveryOrder, AppError> {
        let order = self.fetch(id).await?;
        if let Some(own) = actor.da_scope() {
            if order.da_id != own {
                return Err(AppError::Forbidden);
            }
        }
        Ok(order)
    }
}

/// Generate a numeric one-time code
fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}
