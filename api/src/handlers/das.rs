//! DA roster handlers
//!
//! The directory of delivery agents: field names, territories, and
//! suspension status.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{AgentId, DeliveryAgent, User};
use crate::error::AppError;
use crate::AppState;

/// Request body for registering a DA
#[derive(Debug, Deserialize)]
pub struct RegisterDaRequest {
    pub name: String,
    pub phone: String,
    pub territory: String,
}

/// GET /api/das
///
/// The DA directory. Staff only.
pub async fn list_das(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<DeliveryAgent>>, AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.user_service.list_das().await?))
}

/// GET /api/das/:id
///
/// One roster entry. Staff only.
pub async fn get_da(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryAgent>, AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    let da = state
        .user_service
        .get_da(&AgentId::from(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("DA {} not found", id)))?;
    Ok(Json(da))
}

/// POST /api/das
///
/// Register a DA on the roster. Supervisor/admin.
pub async fn register_da(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDaRequest>,
) -> Result<Json<DeliveryAgent>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    let da = state
        .user_service
        .register_da(&request.name, &request.phone, &request.territory)
        .await?;
    Ok(Json(da))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_register_da_request() {
        let json = r#"{"name": "Emeka Obi", "phone": "08031234567", "territory": "Surulere"}"#;
        let request: RegisterDaRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.territory, "Surulere");
    }

    #[test]
    fn parse_register_da_request_missing_phone() {
        let json = r#"{"name": "Emeka Obi", "territory": "Surulere"}"#;
        let result: Result<RegisterDaRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
