//! User handlers
//!
//! Endpoints for account provisioning and identity.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{AgentId, Role, User};
use crate::error::AppError;
use crate::AppState;

/// Request body for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// DA roster entry this account acts for (required for `delivery_agent`)
    pub da_id: Option<Uuid>,
}

/// Response body for creating a user
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub da_id: Option<String>,
    /// Bearer token for API calls (only shown once)
    pub token: String,
    pub message: String,
}

/// POST /api/users
///
/// Create a user account. Admin only. The token is only shown once.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, AppError> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    let (created, token) = state
        .user_service
        .register_user(
            &request.name,
            request.phone.as_deref(),
            request.role,
            request.da_id.map(AgentId::from),
        )
        .await?;

    Ok(Json(CreateUserResponse {
        id: created.id.to_string(),
        name: created.name,
        role: created.role,
        da_id: created.da_id.map(|id| id.to_string()),
        token,
        message: "Save this token - it won't be shown again.".to_string(),
    }))
}

/// GET /api/users/me
///
/// The authenticated user's own account.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
