//! Overview handler
//!
//! One request returns the caller's whole home screen.

use axum::{extract::State, Extension, Json};

use crate::app::Overview;
use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// GET /api/overview
///
/// The role-tailored dashboard.
pub async fn get_overview(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Overview>, AppError> {
    Ok(Json(state.overview_service.overview(&user).await?))
}
