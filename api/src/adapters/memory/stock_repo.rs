//! In-memory adapter for StockRepository
//!
//! Warehouse quantities and consignment holdings share one lock so a
//! transfer never shows a half-applied state to a concurrent reader.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entities::{
    AgentId, ConsignmentHolding, NewProductStock, ProductStock, Sku,
};
use crate::domain::ports::StockRepository;
use crate::error::DomainError;

#[derive(Default)]
struct StockState {
    products: HashMap<Sku, ProductStock>,
    holdings: HashMap<(AgentId, Sku), i64>,
}

/// In-memory implementation of StockRepository
#[derive(Default)]
pub struct MemoryStockRepository {
    state: RwLock<StockState>,
}

impl MemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for MemoryStockRepository {
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<ProductStock>, DomainError> {
        let state = self.state.read().await;
        Ok(state.products.get(sku).cloned())
    }

    async fn list_products(&self) -> Result<Vec<ProductStock>, DomainError> {
        let state = self.state.read().await;
        let mut all: Vec<_> = state.products.values().cloned().collect();
        all.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(all)
    }

    async fn create_product(&self, stock: &NewProductStock) -> Result<ProductStock, DomainError> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&stock.sku) {
            return Err(DomainError::AlreadyExists(format!("product {}", stock.sku)));
        }
        let product = ProductStock {
            sku: stock.sku.clone(),
            name: stock.name.clone(),
            category: stock.category.clone(),
            unit_price_kobo: stock.unit_price_kobo,
            warehouse_qty: stock.warehouse_qty,
            reorder_level: stock.reorder_level,
            created_at: Utc::now(),
        };
        state.products.insert(product.sku.clone(), product.clone());
        Ok(product)
    }

    async fn holding_qty(&self, da_id: &AgentId, sku: &Sku) -> Result<i64, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .holdings
            .get(&(*da_id, sku.clone()))
            .copied()
            .unwrap_or(0))
    }

    async fn holdings_by_da(
        &self,
        da_id: &AgentId,
    ) -> Result<Vec<ConsignmentHolding>, DomainError> {
        let state = self.state.read().await;
        let mut holdings: Vec<_> = state
            .holdings
            .iter()
            .filter(|((holder, _), qty)| holder == da_id && **qty > 0)
            .map(|((da_id, sku), qty)| ConsignmentHolding {
                da_id: *da_id,
                sku: sku.clone(),
                qty: *qty,
            })
            .collect();
        holdings.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(holdings)
    }

    async fn holdings_by_sku(&self, sku: &Sku) -> Result<Vec<ConsignmentHolding>, DomainError> {
        let state = self.state.read().await;
        let mut holdings: Vec<_> = state
            .holdings
            .iter()
            .filter(|((_, held), qty)| held == sku && **qty > 0)
            .map(|((da_id, sku), qty)| ConsignmentHolding {
                da_id: *da_id,
                sku: sku.clone(),
                qty: *qty,
            })
            .collect();
        holdings.sort_by_key(|h| h.da_id.0);
        Ok(holdings)
    }

    async fn transfer_to_da(
        &self,
        da_id: &AgentId,
        sku: &Sku,
        qty: i64,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(sku)
            .ok_or_else(|| DomainError::NotFound(format!("product {}", sku)))?;
        if product.warehouse_qty < qty {
            return Err(DomainError::Conflict(format!(
                "insufficient warehouse stock for {}: have {}, need {}",
                sku, product.warehouse_qty, qty
            )));
        }
        product.warehouse_qty -= qty;
        *state.holdings.entry((*da_id, sku.clone())).or_insert(0) += qty;
        Ok(())
    }

    async fn restock_warehouse(&self, sku: &Sku, qty: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(sku)
            .ok_or_else(|| DomainError::NotFound(format!("product {}", sku)))?;
        product.warehouse_qty += qty;
        Ok(())
    }

    async fn adjust_holding(
        &self,
        da_id: &AgentId,
        sku: &Sku,
        delta: i64,
    ) -> Result<i64, DomainError> {
        let mut state = self.state.write().await;
        let key = (*da_id, sku.clone());
        let current = state.holdings.get(&key).copied().unwrap_or(0);
        let next = (current + delta).max(0);
        if next == 0 {
            state.holdings.remove(&key);
        } else {
            state.holdings.insert(key, next);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(sku: &str, qty: i64) -> NewProductStock {
        NewProductStock {
            sku: Sku::from(sku),
            name: format!("Product {}", sku),
            category: "Beverages".to_string(),
            unit_price_kobo: 100_000,
            warehouse_qty: qty,
            reorder_level: 20,
        }
    }

    #[tokio::test]
    async fn transfer_moves_stock_between_warehouse_and_da() {
        let repo = MemoryStockRepository::new();
        let da = AgentId::new();
        let sku = Sku::from("SKU-BEV-001");
        repo.create_product(&make_product("SKU-BEV-001", 100))
            .await
            .unwrap();

        repo.transfer_to_da(&da, &sku, 30).await.unwrap();
        assert_eq!(repo.holding_qty(&da, &sku).await.unwrap(), 30);
        assert_eq!(
            repo.find_by_sku(&sku).await.unwrap().unwrap().warehouse_qty,
            70
        );

        repo.adjust_holding(&da, &sku, -10).await.unwrap();
        repo.restock_warehouse(&sku, 10).await.unwrap();
        assert_eq!(repo.holding_qty(&da, &sku).await.unwrap(), 20);
        assert_eq!(
            repo.find_by_sku(&sku).await.unwrap().unwrap().warehouse_qty,
            80
        );
    }

    #[tokio::test]
    async fn transfer_rejects_insufficient_warehouse_stock() {
        let repo = MemoryStockRepository::new();
        let da = AgentId::new();
        let sku = Sku::from("SKU-BEV-001");
        repo.create_product(&make_product("SKU-BEV-001", 5))
            .await
            .unwrap();

        let err = repo.transfer_to_da(&da, &sku, 10).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        // Nothing moved
        assert_eq!(repo.holding_qty(&da, &sku).await.unwrap(), 0);
        assert_eq!(
            repo.find_by_sku(&sku).await.unwrap().unwrap().warehouse_qty,
            5
        );
    }

    #[tokio::test]
    async fn restock_rejects_unknown_sku() {
        let repo = MemoryStockRepository::new();
        let err = repo
            .restock_warehouse(&Sku::from("SKU-NOPE-001"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn adjust_holding_saturates_at_zero() {
        let repo = MemoryStockRepository::new();
        let da = AgentId::new();
        let sku = Sku::from("SKU-BEV-001");
        repo.create_product(&make_product("SKU-BEV-001", 100))
            .await
            .unwrap();
        repo.transfer_to_da(&da, &sku, 5).await.unwrap();

        assert_eq!(repo.adjust_holding(&da, &sku, -3).await.unwrap(), 2);
        assert_eq!(repo.adjust_holding(&da, &sku, -10).await.unwrap(), 0);
        assert_eq!(repo.holding_qty(&da, &sku).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_sku_rejected() {
        let repo = MemoryStockRepository::new();
        repo.create_product(&make_product("SKU-BEV-001", 10))
            .await
            .unwrap();
        let err = repo
            .create_product(&make_product("SKU-BEV-001", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn zero_holdings_hidden_from_listings() {
        let repo = MemoryStockRepository::new();
        let da = AgentId::new();
        let sku = Sku::from("SKU-BEV-001");
        repo.create_product(&make_product("SKU-BEV-001", 100))
            .await
            .unwrap();
        repo.transfer_to_da(&da, &sku, 4).await.unwrap();
        repo.adjust_holding(&da, &sku, -4).await.unwrap();

        assert!(repo.holdings_by_da(&da).await.unwrap().is_empty());
        assert!(repo.holdings_by_sku(&sku).await.unwrap().is_empty());
    }
}
