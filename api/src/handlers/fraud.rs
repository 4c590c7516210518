//! Fraud flag handlers
//!
//! Manual reports, the review queue, and the suspension lever.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{
    AgentId, DeliveryId, FlagId, FlagStatus, FraudFlag, FraudSeverity, User,
};
use crate::error::AppError;
use crate::AppState;

/// Request body for a manual fraud report. Exactly one of `order_id` and
/// `da_id` names the subject.
#[derive(Debug, Deserialize)]
pub struct RaiseFlagRequest {
    pub order_id: Option<Uuid>,
    pub da_id: Option<Uuid>,
    pub severity: Option<FraudSeverity>,
    pub detail: String,
}

/// Request body for reviewing a flag
#[derive(Debug, Deserialize)]
pub struct ReviewFlagRequest {
    /// `cleared` or `confirmed`
    pub verdict: FlagStatus,
}

/// Query parameters for listing flags
#[derive(Debug, Deserialize)]
pub struct ListFlagsQuery {
    pub status: Option<FlagStatus>,
}

/// GET /api/fraud-flags
///
/// List flags. DAs only see flags against themselves.
pub async fn list_flags(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListFlagsQuery>,
) -> Result<Json<Vec<FraudFlag>>, AppError> {
    Ok(Json(
        state.fraud_service.list_flags(&user, query.status).await?,
    ))
}

/// GET /api/fraud-flags/:id
///
/// One flag. DAs only see their own.
pub async fn get_flag(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<FraudFlag>, AppError> {
    Ok(Json(state.fraud_service.get_flag(&user, &FlagId(id)).await?))
}

/// POST /api/fraud-flags
///
/// Raise a manual report. Supervisor/admin.
pub async fn raise_flag(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<RaiseFlagRequest>,
) -> Result<Json<FraudFlag>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    let flag = state
        .fraud_service
        .raise_manual(
            &user,
            request.order_id.map(DeliveryId),
            request.da_id.map(AgentId::from),
            request.severity,
            &request.detail,
        )
        .await?;
    Ok(Json(flag))
}

/// POST /api/fraud-flags/:id/review
///
/// Clear or confirm a flag. Supervisor/admin. Confirming suspends the DA.
pub async fn review_flag(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewFlagRequest>,
) -> Result<Json<FraudFlag>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(
        state
            .fraud_service
            .review(&user, &FlagId(id), request.verdict)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raise_flag_request_for_da() {
        let json = r#"{"da_id": "123e4567-e89b-12d3-a456-426614174000", "detail": "two customers reported short delivery"}"#;
        let request: RaiseFlagRequest = serde_json::from_str(json).unwrap();
        assert!(request.order_id.is_none());
        assert!(request.da_id.is_some());
        assert!(request.severity.is_none());
    }

    #[test]
    fn parse_review_flag_request() {
        let json = r#"{"verdict": "confirmed"}"#;
        let request: ReviewFlagRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.verdict, FlagStatus::Confirmed);
    }

    #[test]
    fn parse_review_flag_request_rejects_unknown_verdict() {
        let json = r#"{"verdict": "maybe"}"#;
        let result: Result<ReviewFlagRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
