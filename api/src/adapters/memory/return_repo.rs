//! In-memory adapter for ReturnRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::{
    AgentId, NewStockReturn, ReturnId, ReturnStatus, StockReturn, UserId,
};
use crate::domain::ports::ReturnRepository;
use crate::error::DomainError;

/// In-memory implementation of ReturnRepository
#[derive(Default)]
pub struct MemoryReturnRepository {
    returns: RwLock<HashMap<ReturnId, StockReturn>>,
}

impl MemoryReturnRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReturnRepository for MemoryReturnRepository {
    async fn create(&self, new_return: &NewStockReturn) -> Result<StockReturn, DomainError> {
        let stock_return = StockReturn {
            id: ReturnId::new(),
            da_id: new_return.da_id,
            sku: new_return.sku.clone(),
            claimed_qty: new_return.claimed_qty,
            reason: new_return.reason,
            status: ReturnStatus::PendingInspection,
            received_qty: None,
            note: new_return.note.clone(),
            submitted_at: Utc::now(),
            inspected_at: None,
            inspected_by: None,
        };

        let mut returns = self.returns.write().await;
        returns.insert(stock_return.id, stock_return.clone());
        Ok(stock_return)
    }

    async fn find_by_id(&self, id: &ReturnId) -> Result<Option<StockReturn>, DomainError> {
        let returns = self.returns.read().await;
        Ok(returns.get(id).cloned())
    }

    async fn list(
        &self,
        status: Option<ReturnStatus>,
        da_id: Option<&AgentId>,
    ) -> Result<Vec<StockReturn>, DomainError> {
        let returns = self.returns.read().await;
        let mut all: Vec<_> = returns
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .filter(|r| da_id.map_or(true, |da| &r.da_id == da))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(all)
    }

    async fn inspect(
        &self,
        id: &ReturnId,
        status: ReturnStatus,
        received_qty: i64,
        by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut returns = self.returns.write().await;
        let stock_return = returns
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("stock return {}", id)))?;
        stock_return.status = status;
        stock_return.received_qty = Some(received_qty);
        stock_return.inspected_by = Some(*by);
        stock_return.inspected_at = Some(at);
        Ok(())
    }
}
