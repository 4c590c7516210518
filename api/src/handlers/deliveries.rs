//! Delivery order handlers
//!
//! The delivery lifecycle: create, dispatch with OTP, confirm at the
//! door, attach proof, then supervisor approval or rejection.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{CreateOrder, OrderBadges, SlaBoardRow};
use crate::domain::entities::{AgentId, DeliveryId, DeliveryOrder, DeliveryStatus, Role, User};
use crate::error::AppError;
use crate::AppState;

/// Query parameters for listing deliveries
#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    pub status: Option<DeliveryStatus>,
    /// Staff may narrow to one DA; ignored for DA callers
    pub da_id: Option<Uuid>,
}

/// Request body for submitting the customer's OTP
#[derive(Debug, Deserialize)]
pub struct SubmitOtpRequest {
    pub code: String,
}

/// Request body for attaching the proof-of-delivery photo
#[derive(Debug, Deserialize)]
pub struct AttachPhotoRequest {
    pub photo_ref: String,
}

/// Request body for rejecting a delivery
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Request body for marking a failed attempt
#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub reason: Option<String>,
}

/// An order with its dashboard badges and approval checklist
#[derive(Debug, Serialize)]
pub struct DeliveryDetail {
    #[serde(flatten)]
    pub order: DeliveryOrder,
    pub badges: OrderBadges,
}

/// GET /api/deliveries
///
/// List orders. DAs only see their own; staff may filter by DA.
pub async fn list_deliveries(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<Json<Vec<DeliveryOrder>>, AppError> {
    let orders = state
        .delivery_service
        .list_orders(&user, query.status, query.da_id.map(AgentId::from))
        .await?;
    Ok(Json(orders))
}

/// GET /api/deliveries/sla-board
///
/// Everything on the SLA clock, most urgent first. Supervisor/admin.
pub async fn sla_board(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<SlaBoardRow>>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.approval_service.sla_board().await?))
}

/// GET /api/deliveries/:id
///
/// Order detail with SLA timer, bonus badge, and approval blockers.
pub async fn get_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryDetail>, AppError> {
    let order = state.delivery_service.get_order(&user, &DeliveryId(id)).await?;
    let badges = state.approval_service.badges_for(&order).await?;
    Ok(Json(DeliveryDetail { order, badges }))
}

/// POST /api/deliveries
///
/// Create an order against a DA's consignment. Supervisor/admin.
pub async fn create_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateOrder>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.delivery_service.create_order(request).await?))
}

/// POST /api/deliveries/:id/dispatch
///
/// The order's DA heads out; the customer receives the OTP.
pub async fn dispatch_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if user.role != Role::DeliveryAgent {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state.delivery_service.dispatch(&user, &DeliveryId(id)).await?,
    ))
}

/// POST /api/deliveries/:id/otp
///
/// The order's DA submits the code the customer read out.
pub async fn submit_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitOtpRequest>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if user.role != Role::DeliveryAgent {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state
            .delivery_service
            .submit_otp(&user, &DeliveryId(id), &request.code)
            .await?,
    ))
}

/// POST /api/deliveries/:id/otp/reissue
///
/// Unlock the OTP and send the customer a fresh code. Supervisor/admin.
pub async fn reissue_otp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state.delivery_service.reissue_otp(&DeliveryId(id)).await?,
    ))
}

/// POST /api/deliveries/:id/photo
///
/// The order's DA attaches the proof-of-delivery photo.
pub async fn attach_photo(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachPhotoRequest>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if user.role != Role::DeliveryAgent {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state
            .delivery_service
            .attach_photo(&user, &DeliveryId(id), &request.photo_ref)
            .await?,
    ))
}

/// POST /api/deliveries/:id/approve
///
/// Approve a delivered order. Supervisor/admin. Refused with the blocker
/// list while the checklist is open.
pub async fn approve_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state.approval_service.approve(&user, &DeliveryId(id)).await?,
    ))
}

/// POST /api/deliveries/:id/reject
///
/// Reject a delivered order with a reason. Supervisor/admin.
pub async fn reject_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state
            .approval_service
            .reject(&user, &DeliveryId(id), &request.reason)
            .await?,
    ))
}

/// POST /api/deliveries/:id/fail
///
/// The order's DA records a failed attempt; stock stays on consignment.
pub async fn fail_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<FailRequest>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if user.role != Role::DeliveryAgent {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state
            .delivery_service
            .mark_failed(&user, &DeliveryId(id), request.reason.as_deref())
            .await?,
    ))
}

/// POST /api/deliveries/:id/cancel
///
/// Cancel before dispatch. Supervisor/admin.
pub async fn cancel_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.delivery_service.cancel(&DeliveryId(id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PaymentMethod;

    #[test]
    fn parse_create_order_request() {
        let json = r#"{
            "da_id": "123e4567-e89b-12d3-a456-426614174000",
            "customer_name": "Ngozi Eze",
            "customer_phone": "08098765432",
            "customer_address": "14 Bode Thomas, Surulere",
            "items": [{"sku": "SKU-BEV-001", "qty": 2}],
            "payment_method": "pay_on_delivery"
        }"#;
        let request: CreateOrder = serde_json::from_str(json).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].qty, 2);
        assert_eq!(request.payment_method, PaymentMethod::PayOnDelivery);
    }

    #[test]
    fn parse_submit_otp_request() {
        let json = r#"{"code": "123456"}"#;
        let request: SubmitOtpRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.code, "123456");
    }

    #[test]
    fn parse_fail_request_without_reason() {
        let json = r#"{}"#;
        let request: FailRequest = serde_json::from_str(json).unwrap();
        assert!(request.reason.is_none());
    }

    #[test]
    fn delivery_status_query_values_are_snake_case() {
        let status: DeliveryStatus = serde_json::from_str(r#""awaiting_approval""#).unwrap();
        assert_eq!(status, DeliveryStatus::AwaitingApproval);
    }
}
