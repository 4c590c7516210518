//! Stock return handlers
//!
//! DAs hand unsold or damaged consignment back; the inspection bay counts
//! what actually arrived before the warehouse is credited.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{ReturnId, ReturnReason, ReturnStatus, Sku, StockReturn, User};
use crate::error::AppError;
use crate::AppState;

/// Request body for submitting a return claim
#[derive(Debug, Deserialize)]
pub struct SubmitReturnRequest {
    pub sku: String,
    pub claimed_qty: i64,
    pub reason: ReturnReason,
    pub note: Option<String>,
}

/// Request body for inspecting a return
#[derive(Debug, Deserialize)]
pub struct InspectReturnRequest {
    /// Units actually counted at the warehouse
    pub received_qty: i64,
    pub accept: bool,
}

/// Query parameters for listing returns
#[derive(Debug, Deserialize)]
pub struct ListReturnsQuery {
    pub status: Option<ReturnStatus>,
}

/// POST /api/inventory/returns-from-da
///
/// A DA submits a return claim for part of their consignment.
pub async fn submit_return(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitReturnRequest>,
) -> Result<Json<StockReturn>, AppError> {
    let stock_return = state
        .inventory_service
        .submit_return(
            &user,
            &Sku::from(request.sku.as_str()),
            request.claimed_qty,
            request.reason,
            request.note,
        )
        .await?;
    Ok(Json(stock_return))
}

/// GET /api/inventory/returns
///
/// List return claims. DAs only see their own.
pub async fn list_returns(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListReturnsQuery>,
) -> Result<Json<Vec<StockReturn>>, AppError> {
    Ok(Json(
        state
            .inventory_service
            .list_returns(&user, query.status)
            .await?,
    ))
}

/// GET /api/inventory/returns/:id
///
/// One return claim. DAs only see their own.
pub async fn get_return(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<StockReturn>, AppError> {
    Ok(Json(
        state
            .inventory_service
            .get_return(&user, &ReturnId(id))
            .await?,
    ))
}

/// POST /api/inventory/returns/:id/inspect
///
/// Count the returned goods and close the claim. Officer/admin. A
/// shortfall against the claim raises a stock discrepancy flag.
pub async fn inspect_return(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<InspectReturnRequest>,
) -> Result<Json<StockReturn>, AppError> {
    if !user.role.can_manage_inventory() {
        return Err(AppError::Forbidden);
    }
    let stock_return = state
        .inventory_service
        .inspect_return(&user, &ReturnId(id), request.received_qty, request.accept)
        .await?;
    Ok(Json(stock_return))
}
