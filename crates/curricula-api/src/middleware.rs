//! Authentication and role-gating middleware.
//!
//! Routers are grouped by requirement and each group carries its own
//! chain: `authenticate` resolves the bearer token to a live user and
//! stashes it in request extensions; `require_*` checks the resolved
//! role by exact match. Admin does not satisfy a staff gate.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use curricula_core::{Role, User, UserRepository};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve `Authorization: Bearer <token>` to a [`CurrentUser`].
///
/// Fails with 401 when the header is missing or malformed, the token
/// does not verify, or the user behind the token no longer exists.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let claims = state.tokens.verify(token)?;

    let user = state
        .db
        .users
        .get(claims.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))?;

    debug!(
        subsystem = "api",
        component = "auth",
        user_id = user.user_id,
        role = user.role.as_str(),
        "Request authenticated"
    );

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn role_gate(request: &Request, required: Role) -> Result<(), ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    if user.0.role == required {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "{} role required",
            required.as_str()
        )))
    }
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    role_gate(&request, Role::Admin)?;
    Ok(next.run(request).await)
}

pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    role_gate(&request, Role::Staff)?;
    Ok(next.run(request).await)
}
