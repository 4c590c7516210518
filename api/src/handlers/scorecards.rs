//! Scorecard handlers
//!
//! Quarterly KPI reviews: per-DA cards, the leaderboard, and the
//! company-wide QBR summary.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{AgentId, CompanyScorecard, Quarter, Scorecard, User};
use crate::error::AppError;
use crate::AppState;

/// Query parameters selecting the review period
#[derive(Debug, Deserialize)]
pub struct QuarterQuery {
    /// `YYYY-Qn`; defaults to the current quarter
    pub quarter: Option<Quarter>,
}

/// GET /api/scorecards/das
///
/// The quarter's leaderboard, best first. Supervisor/admin.
pub async fn leaderboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<QuarterQuery>,
) -> Result<Json<Vec<Scorecard>>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.scorecard_service.leaderboard(query.quarter).await?))
}

/// GET /api/scorecards/das/:id
///
/// One DA's scorecard. Staff see any; a DA only their own.
pub async fn da_scorecard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(query): Query<QuarterQuery>,
) -> Result<Json<Scorecard>, AppError> {
    let da_id = AgentId::from(id);
    if let Some(own) = user.da_scope() {
        if own != da_id {
            return Err(AppError::Forbidden);
        }
    }
    Ok(Json(
        state
            .scorecard_service
            .da_scorecard(&da_id, query.quarter)
            .await?,
    ))
}

/// GET /api/scorecards/company
///
/// The company QBR summary with weekly trend. Supervisor/admin.
pub async fn company_scorecard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<QuarterQuery>,
) -> Result<Json<CompanyScorecard>, AppError> {
    if !user.role.can_review_operations() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(state.scorecard_service.company(query.quarter).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quarter_query_value() {
        let quarter: Quarter = serde_json::from_str(r#""2026-Q2""#).unwrap();
        assert_eq!(quarter, Quarter { year: 2026, quarter: 2 });
    }

    #[test]
    fn parse_quarter_query_rejects_garbage() {
        let result: Result<Quarter, _> = serde_json::from_str(r#""last-quarter""#);
        assert!(result.is_err());
    }
}
