//! In-memory adapter for PaymentRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::{
    AgentId, DeliveryId, NewPayment, PaymentConfirmation, PaymentId, PaymentStatus, UserId,
};
use crate::domain::ports::PaymentRepository;
use crate::error::DomainError;

/// In-memory implementation of PaymentRepository
#[derive(Default)]
pub struct MemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, PaymentConfirmation>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, payment: PaymentConfirmation) -> PaymentConfirmation {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment.clone());
        payment
    }
}

fn build(new_payment: &NewPayment, status: PaymentStatus) -> PaymentConfirmation {
    PaymentConfirmation {
        id: PaymentId::new(),
        order_id: new_payment.order_id,
        da_id: new_payment.da_id,
        amount_kobo: new_payment.amount_kobo,
        channel: new_payment.channel,
        reference: new_payment.reference.clone(),
        status,
        initiated_at: Utc::now(),
        confirmed_at: None,
        confirmed_by: None,
    }
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn create(&self, new_payment: &NewPayment) -> Result<PaymentConfirmation, DomainError> {
        Ok(self.insert(build(new_payment, PaymentStatus::Pending)).await)
    }

    async fn create_confirmed(
        &self,
        new_payment: &NewPayment,
        at: DateTime<Utc>,
    ) -> Result<PaymentConfirmation, DomainError> {
        let mut payment = build(new_payment, PaymentStatus::Confirmed);
        payment.confirmed_at = Some(at);
        Ok(self.insert(payment).await)
    }

    async fn find_by_id(
        &self,
        id: &PaymentId,
    ) -> Result<Option<PaymentConfirmation>, DomainError> {
        let payments = self.payments.read().await;
        Ok(payments.get(id).cloned())
    }

    async fn list(
        &self,
        status: Option<PaymentStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<PaymentConfirmation>, DomainError> {
        let payments = self.payments.read().await;
        let mut all: Vec<_> = payments
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .filter(|p| da_id.map_or(true, |da| &p.da_id == da))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at));
        Ok(all)
    }

    async fn list_by_order(
        &self,
        order_id: &DeliveryId,
    ) -> Result<Vec<PaymentConfirmation>, DomainError> {
        let payments = self.payments.read().await;
        let mut all: Vec<_> = payments
            .values()
            .filter(|p| &p.order_id == order_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at));
        Ok(all)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<PaymentConfirmation>, DomainError> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|p| p.reference.as_deref() == Some(reference))
            .cloned()
            .collect())
    }

    async fn confirm(
        &self,
        id: &PaymentId,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("payment {}", id)))?;
        payment.status = PaymentStatus::Confirmed;
        payment.confirmed_at = Some(at);
        payment.confirmed_by = Some(*by);
        Ok(())
    }

    async fn mark_flagged(&self, id: &PaymentId) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("payment {}", id)))?;
        payment.status = PaymentStatus::Flagged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_payment(reference: Option<&str>) -> NewPayment {
        NewPayment {
            order_id: DeliveryId::new(),
            da_id: AgentId::new(),
            amount_kobo: 540_000,
            channel: crate::domain::entities::PaymentChannel::MoniepointTransfer,
            reference: reference.map(|r| r.to_string()),
        }
    }

    #[tokio::test]
    async fn find_by_reference_matches_exactly() {
        let repo = MemoryPaymentRepository::new();
        repo.create(&make_payment(Some("MP-AAAAAAAAAA")))
            .await
            .unwrap();
        repo.create(&make_payment(Some("MP-BBBBBBBBBB")))
            .await
            .unwrap();
        repo.create(&make_payment(None)).await.unwrap();

        let hits = repo.find_by_reference("MP-AAAAAAAAAA").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(repo.find_by_reference("MP-CCCCCCCCCC").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_confirmed_is_settled_from_the_start() {
        let repo = MemoryPaymentRepository::new();
        let payment = repo
            .create_confirmed(&make_payment(None), Utc::now())
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Confirmed);
        assert!(payment.confirmed_at.is_some());
    }
}
