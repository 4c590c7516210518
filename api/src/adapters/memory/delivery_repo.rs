//! In-memory adapter for DeliveryRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::{
    AgentId, DeliveryId, DeliveryOrder, DeliveryStatus, NewDeliveryOrder, UserId,
};
use crate::domain::ports::DeliveryRepository;
use crate::error::DomainError;

struct DeliveryState {
    orders: HashMap<DeliveryId, DeliveryOrder>,
    next_ref: u64,
}

impl Default for DeliveryState {
    fn default() -> Self {
        Self {
            orders: HashMap::new(),
            next_ref: 1001,
        }
    }
}

/// In-memory implementation of DeliveryRepository
#[derive(Default)]
pub struct MemoryDeliveryRepository {
    state: RwLock<DeliveryState>,
}

impl MemoryDeliveryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: &DeliveryId, apply: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut DeliveryOrder),
    {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("delivery order {}", id)))?;
        apply(order);
        Ok(())
    }
}

#[async_trait]
impl DeliveryRepository for MemoryDeliveryRepository {
    async fn create(
        &self,
        new_order: &NewDeliveryOrder,
        amount_kobo: i64,
    ) -> Result<DeliveryOrder, DomainError> {
        let mut state = self.state.write().await;
        let reference = format!("DO-{}", state.next_ref);
        state.next_ref += 1;

        let order = DeliveryOrder {
            id: DeliveryId::new(),
            reference,
            da_id: new_order.da_id,
            customer_name: new_order.customer_name.clone(),
            customer_phone: new_order.customer_phone.clone(),
            customer_address: new_order.customer_address.clone(),
            items: new_order.items.clone(),
            amount_kobo,
            payment_method: new_order.payment_method,
            status: DeliveryStatus::PendingDispatch,
            otp_hash: None,
            otp_attempts: 0,
            otp_locked: false,
            otp_verified_at: None,
            proof_photo_ref: None,
            bonus_eligible: None,
            resolution_reason: None,
            created_at: Utc::now(),
            dispatched_at: None,
            delivered_at: None,
            resolved_at: None,
            reviewed_by: None,
        };

        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: &DeliveryId) -> Result<Option<DeliveryOrder>, DomainError> {
        let state = self.state.read().await;
        Ok(state.orders.get(id).cloned())
    }

    async fn list(
        &self,
        status: Option<DeliveryStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<DeliveryOrder>, DomainError> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .filter(|o| da_id.map_or(true, |da| &o.da_id == da))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_on_sla_clock(&self) -> Result<Vec<DeliveryOrder>, DomainError> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| {
                matches!(
                    o.status,
                    DeliveryStatus::OutForDelivery | DeliveryStatus::AwaitingApproval
                ) && o.dispatched_at.is_some()
            })
            .cloned()
            .collect();
        // Oldest dispatch first: closest to breach at the top
        orders.sort_by_key(|o| o.dispatched_at);
        Ok(orders)
    }

    async fn dispatch(
        &self,
        id: &DeliveryId,
        otp_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.update(id, |order| {
            order.status = DeliveryStatus::OutForDelivery;
            order.otp_hash = Some(otp_hash.to_string());
            order.otp_attempts = 0;
            order.otp_locked = false;
            order.dispatched_at = Some(at);
        })
        .await
    }

    async fn record_failed_otp(&self, id: &DeliveryId) -> Result<u32, DomainError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("delivery order {}", id)))?;
        order.otp_attempts += 1;
        Ok(order.otp_attempts)
    }

    async fn lock_otp(&self, id: &DeliveryId) -> Result<(), DomainError> {
        self.update(id, |order| order.otp_locked = true).await
    }

    async fn reset_otp(&self, id: &DeliveryId, otp_hash: &str) -> Result<(), DomainError> {
        self.update(id, |order| {
            order.otp_hash = Some(otp_hash.to_string());
            order.otp_attempts = 0;
            order.otp_locked = false;
        })
        .await
    }

    async fn mark_delivered(&self, id: &DeliveryId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.update(id, |order| {
            order.otp_verified_at = Some(at);
            order.delivered_at = Some(at);
            order.status = DeliveryStatus::AwaitingApproval;
        })
        .await
    }

    async fn set_proof_photo(&self, id: &DeliveryId, photo_ref: &str) -> Result<(), DomainError> {
        self.update(id, |order| order.proof_photo_ref = Some(photo_ref.to_string()))
            .await
    }

    async fn approve(
        &self,
        id: &DeliveryId,
        by: &UserId,
        at: DateTime<Utc>,
        bonus_eligible: bool,
    ) -> Result<(), DomainError> {
        let by = *by;
        self.update(id, move |order| {
            order.status = DeliveryStatus::Approved;
            order.reviewed_by = Some(by);
            order.resolved_at = Some(at);
            order.bonus_eligible = Some(bonus_eligible);
        })
        .await
    }

    async fn reject(
        &self,
        id: &DeliveryId,
        by: &UserId,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), DomainError> {
        let by = *by;
        let reason = reason.to_string();
        self.update(id, move |order| {
            order.status = DeliveryStatus::Rejected;
            order.reviewed_by = Some(by);
            order.resolved_at = Some(at);
            order.resolution_reason = Some(reason);
        })
        .await
    }

    async fn fail(
        &self,
        id: &DeliveryId,
        at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<(), DomainError> {
        let reason = reason.map(|r| r.to_string());
        self.update(id, move |order| {
            order.status = DeliveryStatus::Failed;
            order.resolved_at = Some(at);
            order.resolution_reason = reason;
        })
        .await
    }

    async fn cancel(&self, id: &DeliveryId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.update(id, |order| {
            order.status = DeliveryStatus::Cancelled;
            order.resolved_at = Some(at);
        })
        .await
    }
}
