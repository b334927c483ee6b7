use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    error::Result,
    models::{category::Category, skill::Skill},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/skills/",
    responses(
        (status = 200, description = "All skills", body = Vec<Skill>)
    )
)]
#[axum::debug_handler]
pub async fn list_skills(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let skills = state.catalog_service.list_skills().await?;
    Ok(Json(skills))
}

#[utoipa::path(
    get,
    path = "/api/categories/",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = state.catalog_service.list_categories().await?;
    Ok(Json(categories))
}
