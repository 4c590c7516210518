//! Inventory service
//!
//! Warehouse stock listings, consignment assignment to DAs, and the
//! returns-from-DA inspection flow.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::domain::entities::{
    AgentId, FlagSubject, FraudReason, FraudSeverity, NewFraudFlag, NewProductStock,
    NewStockReturn, ProductStock, ReturnId, ReturnReason, ReturnStatus, Sku, StockHealth,
    StockReturn, User,
};
use crate::domain::ports::{AgentRepository, FraudFlagRepository, ReturnRepository, StockRepository};
use crate::error::{AppError, DomainError};

/// One product as the warehouse sees it
#[derive(Debug, Clone, Serialize)]
pub struct WarehouseStockRow {
    pub sku: Sku,
    pub name: String,
    pub category: String,
    pub unit_price_kobo: i64,
    pub warehouse_qty: i64,
    pub reorder_level: i64,
    pub health: StockHealth,
    pub restock_suggestion: i64,
}

impl From<ProductStock> for WarehouseStockRow {
    fn from(product: ProductStock) -> Self {
        let health = product.health();
        let restock_suggestion = product.restock_suggestion();
        Self {
            sku: product.sku,
            name: product.name,
            category: product.category,
            unit_price_kobo: product.unit_price_kobo,
            warehouse_qty: product.warehouse_qty,
            reorder_level: product.reorder_level,
            health,
            restock_suggestion,
        }
    }
}

/// One SKU a DA carries, priced at the current unit price
#[derive(Debug, Clone, Serialize)]
pub struct DaHoldingRow {
    pub sku: Sku,
    pub name: String,
    pub qty: i64,
    pub unit_price_kobo: i64,
    pub value_kobo: i64,
}

/// The stock listing, shaped by who is asking
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StockListing {
    /// Staff view: the warehouse with health and restock suggestions
    Warehouse(Vec<WarehouseStockRow>),
    /// DA view: their own consignment, priced
    Consignment(Vec<DaHoldingRow>),
}

/// Per-DA slice of one SKU's consignment
#[derive(Debug, Clone, Serialize)]
pub struct HoldingBreakdownRow {
    pub da_id: AgentId,
    pub da_name: String,
    pub qty: i64,
}

/// One product with its consignment breakdown
#[derive(Debug, Clone, Serialize)]
pub struct StockDetail {
    #[serde(flatten)]
    pub product: WarehouseStockRow,
    /// Units currently out with DAs
    pub consigned_qty: i64,
    pub holdings: Vec<HoldingBreakdownRow>,
}

/// Service for warehouse stock and returns
pub struct InventoryService<SR, AR, RR, FR>
where
    SR: StockRepository,
    AR: AgentRepository,
    RR: ReturnRepository,
    FR: FraudFlagRepository,
{
    stocks: Arc<SR>,
    agents: Arc<AR>,
    returns: Arc<RR>,
    flags: Arc<FR>,
}

impl<SR, AR, RR, FR> InventoryService<SR, AR, RR, FR>
where
    SR: StockRepository,
    AR: AgentRepository,
    RR: ReturnRepository,
    FR: FraudFlagRepository,
{
    pub fn new(stocks: Arc<SR>, agents: Arc<AR>, returns: Arc<RR>, flags: Arc<FR>) -> Self {
        Self {
            stocks,
            agents,
            returns,
            flags,
        }
    }

    /// Register a product in the warehouse catalogue
    pub async fn create_product(&self, new: NewProductStock) -> Result<ProductStock, AppError> {
        if new.sku.0.is_empty() {
            return Err(AppError::BadRequest("SKU must not be empty".to_string()));
        }
        if new.name.is_empty() || new.name.len() > 100 {
            return Err(AppError::BadRequest(
                "Product name must be between 1 and 100 characters".to_string(),
            ));
        }
        if new.unit_price_kobo <= 0 {
            return Err(AppError::BadRequest(
                "Unit price must be positive".to_string(),
            ));
        }
        if new.warehouse_qty < 0 || new.reorder_level < 0 {
            return Err(AppError::BadRequest(
                "Quantities must not be negative".to_string(),
            ));
        }
        Ok(self.stocks.create_product(&new).await?)
    }

    /// The stock screen: warehouse rows for staff, own holdings for a DA
    pub async fn list_stock(&self, actor: &User) -> Result<StockListing, AppError> {
        match actor.da_scope() {
            Some(da_id) => Ok(StockListing::Consignment(self.da_holdings(&da_id).await?)),
            None => {
                let rows = self
                    .stocks
                    .list_products()
                    .await?
                    .into_iter()
                    .map(WarehouseStockRow::from)
                    .collect();
                Ok(StockListing::Warehouse(rows))
            }
        }
    }

    /// A DA's priced consignment
    pub async fn da_holdings(&self, da_id: &AgentId) -> Result<Vec<DaHoldingRow>, AppError> {
        let mut rows = Vec::new();
        for holding in self.stocks.holdings_by_da(da_id).await? {
            let product = self
                .stocks
                .find_by_sku(&holding.sku)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("product {}", holding.sku)))?;
            rows.push(DaHoldingRow {
                sku: holding.sku,
                name: product.name,
                qty: holding.qty,
                unit_price_kobo: product.unit_price_kobo,
                value_kobo: holding.qty * product.unit_price_kobo,
            });
        }
        Ok(rows)
    }

    /// One product with its consignment breakdown. DAs only see their own
    /// slice of the breakdown.
    pub async fn stock_detail(&self, actor: &User, sku: &Sku) -> Result<StockDetail, AppError> {
        let product = self
            .stocks
            .find_by_sku(sku)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", sku)))?;

        let mut holdings = Vec::new();
        for holding in self.stocks.holdings_by_sku(sku).await? {
            if let Some(own) = actor.da_scope() {
                if holding.da_id != own {
                    continue;
                }
            }
            let da_name = self
                .agents
                .find_by_id(&holding.da_id)
                .await?
                .map(|da| da.name)
                .unwrap_or_else(|| "unknown".to_string());
            holdings.push(HoldingBreakdownRow {
                da_id: holding.da_id,
                da_name,
                qty: holding.qty,
            });
        }
        let consigned_qty = holdings.iter().map(|h| h.qty).sum();

        Ok(StockDetail {
            product: WarehouseStockRow::from(product),
            consigned_qty,
            holdings,
        })
    }

    /// Products that need a restock, worst health first
    pub async fn restock_suggestions(&self) -> Result<Vec<WarehouseStockRow>, AppError> {
        let mut rows: Vec<_> = self
            .stocks
            .list_products()
            .await?
            .into_iter()
            .map(WarehouseStockRow::from)
            .filter(|row| row.health != StockHealth::Healthy)
            .collect();
        rows.sort_by(|a, b| b.health.severity().cmp(&a.health.severity()));
        Ok(rows)
    }

    /// Move warehouse stock onto a DA's consignment
    pub async fn assign_stock(
        &self,
        da_id: &AgentId,
        sku: &Sku,
        qty: i64,
    ) -> Result<i64, AppError> {
        if qty <= 0 {
            return Err(AppError::BadRequest("Quantity must be positive".to_string()));
        }
        let da = self
            .agents
            .find_by_id(da_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("DA {}", da_id)))?;
        if !da.is_operational() {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "DA {} is suspended and cannot receive stock",
                da.name
            ))));
        }

        self.stocks.transfer_to_da(da_id, sku, qty).await?;
        Ok(self.stocks.holding_qty(da_id, sku).await?)
    }

    /// A DA claims they are bringing stock back
    pub async fn submit_return(
        &self,
        actor: &User,
        sku: &Sku,
        claimed_qty: i64,
        reason: ReturnReason,
        note: Option<String>,
    ) -> Result<StockReturn, AppError> {
        let da_id = actor.da_scope().ok_or(AppError::Forbidden)?;

        if claimed_qty <= 0 {
            return Err(AppError::BadRequest("Quantity must be positive".to_string()));
        }
        if self.stocks.find_by_sku(sku).await?.is_none() {
            return Err(AppError::NotFound(format!("product {}", sku)));
        }
        let held = self.stocks.holding_qty(&da_id, sku).await?;
        if held < claimed_qty {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "holding {} of {}, cannot return {}",
                held, sku, claimed_qty
            ))));
        }

        let new_return = NewStockReturn {
            da_id,
            sku: sku.clone(),
            claimed_qty,
            reason,
            note,
        };
        Ok(self.returns.create(&new_return).await?)
    }

    /// List return claims. DAs only see their own.
    pub async fn list_returns(
        &self,
        actor: &User,
        status: Option<ReturnStatus>,
    ) -> Result<Vec<StockReturn>, AppError> {
        let scope = actor.da_scope();
        Ok(self.returns.list(status, scope.as_ref()).await?)
    }

    /// Find a return claim. DAs only see their own.
    pub async fn get_return(&self, actor: &User, id: &ReturnId) -> Result<StockReturn, AppError> {
        let stock_return = self
            .returns
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("return {}", id)))?;
        if let Some(own) = actor.da_scope() {
            if stock_return.da_id != own {
                return Err(AppError::Forbidden);
            }
        }
        Ok(stock_return)
    }

    /// Count the physical goods and settle a return claim
    ///
    /// Accepting moves `received_qty` off the DA's consignment. Unsold stock
    /// goes back into the warehouse; damaged and expired stock is written
    /// off. A shortfall against the claim raises a stock discrepancy flag.
    /// Rejecting records the count and leaves the consignment untouched.
    pub async fn inspect_return(
        &self,
        inspector: &User,
        id: &ReturnId,
        received_qty: i64,
        accept: bool,
    ) -> Result<StockReturn, AppError> {
        if received_qty < 0 {
            return Err(AppError::BadRequest(
                "Received quantity must not be negative".to_string(),
            ));
        }

        let stock_return = self
            .returns
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("return {}", id)))?;
        if stock_return.status != ReturnStatus::PendingInspection {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "return {} is already {}",
                stock_return.id, stock_return.status
            ))));
        }

        let status = if accept {
            ReturnStatus::Accepted
        } else {
            ReturnStatus::Rejected
        };
        let now = Utc::now();
        self.returns
            .inspect(id, status, received_qty, &inspector.id, now)
            .await?;

        if accept {
            // Only what was actually counted moves
            self.stocks
                .adjust_holding(&stock_return.da_id, &stock_return.sku, -received_qty)
                .await?;
            if stock_return.reason.restockable() {
                self.stocks
                    .restock_warehouse(&stock_return.sku, received_qty)
                    .await?;
            }

            let shortfall = (stock_return.claimed_qty - received_qty).max(0);
            if shortfall > 0 {
                let flag = NewFraudFlag {
                    subject: FlagSubject::Agent(stock_return.da_id),
                    da_id: stock_return.da_id,
                    reason: FraudReason::StockDiscrepancy,
                    severity: FraudSeverity::default_for(FraudReason::StockDiscrepancy),
                    detail: format!(
                        "return {}: claimed {} of {}, received {}",
                        stock_return.id, stock_return.claimed_qty, stock_return.sku, received_qty
                    ),
                    raised_by: None,
                };
                self.flags.create(&flag).await?;
                tracing::warn!(
                    return_id = %stock_return.id,
                    da_id = %stock_return.da_id,
                    shortfall,
                    "Return came up short, discrepancy flag raised"
                );
            }
        }

        self.get_return(inspector, id).await
    }
}
