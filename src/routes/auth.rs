use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{LoginRequest, LoginResponse, UserResponse};
use crate::models::user::{Identity, PublicUser, Role};
use crate::services::auth::verify_password;

/// Any authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let identity = state.tokens.verify(token)?;
        Ok(AuthUser(identity))
    }
}

/// An authenticated administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(identity))
    }
}

fn admin_profile(email: &str) -> PublicUser {
    PublicUser {
        email: email.to_string(),
        name: "Admin".to_string(),
        role: Role::Admin,
        is_active: true,
        created_at: None,
    }
}

/// POST /api/auth/login: exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|_| ApiError::Validation("Email and password are required".to_string()))?;

    if state.admin.matches(&req.email, &req.password) {
        let identity = Identity::Admin { email: req.email.clone() };
        let token = state
            .tokens
            .issue(&identity)
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        metrics::counter!("logins_total", "role" => "admin").increment(1);
        tracing::info!(email = %req.email, "Admin login");

        return Ok(Json(LoginResponse {
            success: true,
            message: "Admin login successful".to_string(),
            token,
            user: admin_profile(&req.email),
        }));
    }

    let invalid = || ApiError::Auth("Invalid email or password".to_string());

    let user = state.users.get(&req.email).await?.ok_or_else(invalid)?;

    if !user.is_active {
        return Err(ApiError::Auth("Account is deactivated".to_string()));
    }

    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::warn!(email = %user.email, "Rejected login");
        return Err(invalid());
    }

    let identity = Identity::from_parts(user.email.clone(), user.role);
    let token = state
        .tokens
        .issue(&identity)
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    metrics::counter!("logins_total", "role" => user.role.to_string()).increment(1);
    tracing::info!(email = %user.email, role = %user.role, "Login");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: PublicUser::from(&user),
    }))
}

/// GET /api/auth/me: profile of the token holder.
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = match &identity {
        Identity::Admin { email } if state.admin.email == *email => admin_profile(email),
        _ => {
            let record = state
                .users
                .get(identity.email())
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
            PublicUser::from(&record)
        }
    };

    Ok(Json(UserResponse {
        success: true,
        message: "OK".to_string(),
        user,
    }))
}
