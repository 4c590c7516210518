//! Payment handlers
//!
//! Collections at the door: a DA initiates cash or Moniepoint transfer,
//! a supervisor confirms what actually arrived.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{
    DeliveryId, PaymentChannel, PaymentConfirmation, PaymentId, PaymentStatus, User,
};
use crate::error::AppError;
use crate::AppState;

/// Request body for initiating a collection
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    pub channel: PaymentChannel,
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub status: Option<PaymentStatus>,
}

/// POST /api/payments/moniepoint/initiate
///
/// The order's DA starts a collection. Transfer channels get a gateway
/// reference; cash records without one.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    let payment = state
        .payment_service
        .initiate(&user, &DeliveryId(request.order_id), request.channel)
        .await?;
    Ok(Json(payment))
}

/// POST /api/payments/:id/confirm
///
/// Confirm a pending payment. Supervisor/admin. Transfer references are
/// verified against the gateway; duplicates are flagged instead.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state.payment_service.confirm(&user, &PaymentId(id)).await?,
    ))
}

/// GET /api/payments
///
/// List payments. DAs only see their own.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<PaymentConfirmation>>, AppError> {
    Ok(Json(
        state.payment_service.list_payments(&user, query.status).await?,
    ))
}

/// GET /api/payments/:id
///
/// One payment. DAs only see their own.
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    Ok(Json(
        state.payment_service.get_payment(&user, &PaymentId(id)).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_initiate_payment_request() {
        let json = r#"{"order_id": "123e4567-e89b-12d3-a456-426614174000", "channel": "moniepoint_transfer"}"#;
        let request: InitiatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.channel, PaymentChannel::MoniepointTransfer);
    }

    #[test]
    fn parse_initiate_payment_request_cash() {
        let json = r#"{"order_id": "123e4567-e89b-12d3-a456-426614174000", "channel": "cash"}"#;
        let request: InitiatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.channel, PaymentChannel::Cash);
    }

    #[test]
    fn parse_initiate_payment_request_rejects_unknown_channel() {
        let json = r#"{"order_id": "123e4567-e89b-12d3-a456-426614174000", "channel": "barter"}"#;
        let result: Result<InitiatePaymentRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
