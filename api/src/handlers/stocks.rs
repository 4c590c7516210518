//! Product stock handlers
//!
//! The stock screen and consignment assignment. DAs see their own priced
//! holdings; staff see warehouse levels with health and restock hints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{StockDetail, StockListing, WarehouseStockRow};
use crate::domain::entities::{AgentId, Sku, User};
use crate::error::AppError;
use crate::AppState;

/// Request body for assigning consignment stock to a DA
#[derive(Debug, Deserialize)]
pub struct AssignStockRequest {
    pub da_id: Uuid,
    pub sku: String,
    pub qty: i64,
}

/// Response body for a stock assignment
#[derive(Debug, Serialize)]
pub struct AssignStockResponse {
    pub da_id: String,
    pub sku: String,
    /// The DA's holding of this SKU after the transfer
    pub holding_qty: i64,
}

/// GET /api/product-stocks
///
/// The stock table for the caller's role.
pub async fn list_stock(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<StockListing>, AppError> {
    Ok(Json(state.inventory_service.list_stock(&user).await?))
}

/// GET /api/product-stocks/restock-suggestions
///
/// SKUs needing a restock, worst health first. Staff only.
pub async fn restock_suggestions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<WarehouseStockRow>>, AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.inventory_service.restock_suggestions().await?))
}

/// GET /api/product-stocks/:sku
///
/// One SKU with its consignment breakdown.
pub async fn get_stock(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(sku): Path<String>,
) -> Result<Json<StockDetail>, AppError> {
    let detail = state
        .inventory_service
        .stock_detail(&user, &Sku::from(sku.as_str()))
        .await?;
    Ok(Json(detail))
}

/// POST /api/inventory/assignments
///
/// Move stock from the warehouse onto a DA's consignment. Officer/admin.
pub async fn assign_stock(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<AssignStockRequest>,
) -> Result<Json<AssignStockResponse>, AppError> {
    if !user.role.can_manage_inventory() {
        return Err(AppError::Forbidden);
    }

    let da_id = AgentId::from(request.da_id);
    let sku = Sku::from(request.sku.as_str());
    let holding_qty = state
        .inventory_service
        .assign_stock(&da_id, &sku, request.qty)
        .await?;

    Ok(Json(AssignStockResponse {
        da_id: da_id.to_string(),
        sku: request.sku,
        holding_qty,
    }))
}
