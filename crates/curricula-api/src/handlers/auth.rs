//! Registration, login, logout, and password change.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::info;

use curricula_core::{
    hash_password, verify_password, ChangePasswordRequest, LoginRequest, RegisterRequest,
    UserRepository,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".into()));
    }
    if state.db.users.find_by_username(&req.username).await?.is_some() {
        return Err(ApiError::BadRequest(format!(
            "username {} is taken",
            req.username
        )));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users
        .create(&req.username, &password_hash, req.role)
        .await?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "register",
        user_id = user.user_id,
        role = user.role.as_str(),
        "User registered"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let token = state.tokens.issue(user.user_id, user.role)?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "login",
        user_id = user.user_id,
        "User logged in"
    );
    Ok(Json(serde_json::json!({ "token": token, "user": user })))
}

/// Tokens are stateless and cannot be revoked; logout exists for client
/// symmetry only.
pub async fn logout() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "logged out" }))
}

/// Change the authenticated user's own password. The request names the
/// account; naming anyone else is forbidden even for admins.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username != current.0.username {
        return Err(ApiError::Forbidden(
            "can only change your own password".to_string(),
        ));
    }
    if !verify_password(&req.password, &current.0.password_hash) {
        return Err(ApiError::BadRequest("wrong password".to_string()));
    }
    if req.new_password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".into()));
    }

    let password_hash = hash_password(&req.new_password)?;
    state
        .db
        .users
        .set_password_hash(current.0.user_id, &password_hash)
        .await?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "change_password",
        user_id = current.0.user_id,
        "Password changed"
    );
    Ok(Json(serde_json::json!({ "message": "password changed" })))
}

#[cfg(test)]
mod tests {
    use curricula_core::{Role, User};

    #[test]
    fn test_login_body_carries_token_and_user() {
        let user = User {
            user_id: 9,
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Staff,
        };

        let body = serde_json::json!({ "token": "abc.def.ghi", "user": user });
        assert_eq!(body["token"], "abc.def.ghi");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["role"], "staff");
        // The hash never serializes.
        assert!(body["user"].get("password_hash").is_none());
    }
}
