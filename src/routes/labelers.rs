use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{CreateLabelerRequest, LabelersResponse, UserResponse};
use crate::models::user::{PublicUser, Role, UserRecord};
use crate::routes::auth::AdminUser;
use crate::services::auth::hash_password;

/// POST /api/audio/create-labeler: add a labeler account.
pub async fn create_labeler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateLabelerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let email = req.email.trim().to_string();
    if email == state.admin.email || state.users.get(&email).await?.is_some() {
        return Err(ApiError::Duplicate("User already exists with this email".to_string()));
    }

    let password_hash = hash_password(req.password, state.policy.bcrypt_cost).await?;
    let user = UserRecord::new_labeler(req.name.trim().to_string(), email, password_hash);

    // The lookup above is advisory; the conditional insert decides.
    if !state.users.insert_new(&user).await? {
        return Err(ApiError::Duplicate("User already exists with this email".to_string()));
    }

    tracing::info!(email = %user.email, created_by = %admin.email(), "Created labeler");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: "Labeler created successfully".to_string(),
            user: PublicUser::from(&user),
        }),
    ))
}

/// GET /api/audio/labelers: all labeler accounts, without credentials.
pub async fn list_labelers(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<LabelersResponse>> {
    let labelers = state
        .users
        .list_by_role(Role::Labeler)
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();

    Ok(Json(LabelersResponse {
        success: true,
        labelers,
    }))
}
