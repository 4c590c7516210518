//! Bearer token authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::app::hash_token;
use crate::error::AppError;
use crate::AppState;

/// Extract the bearer token from the Authorization header
fn extract_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware
///
/// Validates the bearer token and injects the User into request extensions.
/// Routes that require authentication should use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Extract and hash the presented token
    let token = extract_token(&request).ok_or(AppError::Unauthorized)?;
    let token_hash = hash_token(token);

    // Look up the user
    let user = state
        .user_service
        .find_by_token(&token_hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Deactivated accounts keep their token but lose access
    if !user.active {
        return Err(AppError::Unauthorized);
    }

    // Update last seen (fire and forget, log errors)
    let user_id = user.id;
    let user_service = state.user_service.clone();
    tokio::spawn(async move {
        if let Err(e) = user_service.touch(&user_id).await {
            tracing::warn!(error = %e, user_id = %user_id.0, "Failed to update last_seen");
        }
    });

    // Inject the user into request extensions
    request.extensions_mut().insert(user);

    // Continue to the handler
    Ok(next.run(request).await)
}
