use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    dto::account_dto::{
        AccountResponse, LoginPayload, LoginResponse, RegisterPayload, UpdateProfilePayload,
    },
    error::Result,
    middleware::auth::Claims,
    utils::token::issue_access_token,
    AppState,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.password != payload.password_confirm {
        return Err(crate::error::Error::BadRequest(
            "Passwords do not match".to_string(),
        ));
    }
    let account = state.account_service.register(payload).await?;

    if let Err(e) = state.notification_service.notify_welcome(&account).await {
        tracing::error!(account_id = %account.id, error = ?e, "Failed to enqueue welcome email");
    }

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let account = state
        .account_service
        .authenticate(&payload.username, &payload.password)
        .await?;
    let access = issue_access_token(&account)?;

    Ok(Json(LoginResponse {
        user: AccountResponse::from(account),
        access,
    }))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let account = state.account_service.get_by_id(claims.account_id()?).await?;
    Ok(Json(AccountResponse::from(account)))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let account = state
        .account_service
        .update_profile(claims.account_id()?, payload)
        .await?;
    Ok(Json(AccountResponse::from(account)))
}
