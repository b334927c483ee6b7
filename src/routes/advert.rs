use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::advert_dto::{
        salary_bounds_valid, AdvertDetailResponse, AdvertListQuery, AdvertListResponse,
        AdvertResponse, CreateAdvertPayload, UpdateAdvertPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::account::AccountRole,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/adverts/",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("job_type" = Option<String>, Query, description = "Filter by job type"),
        ("experience_level" = Option<String>, Query, description = "Filter by experience level"),
        ("is_remote" = Option<bool>, Query, description = "Filter by remote flag"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag"),
        ("skills" = Option<String>, Query, description = "Comma-separated skill ids"),
        ("categories" = Option<String>, Query, description = "Comma-separated category ids"),
        ("min_salary" = Option<String>, Query, description = "Minimum salary floor"),
        ("max_salary" = Option<String>, Query, description = "Maximum salary ceiling"),
        ("deadline" = Option<String>, Query, description = "Only adverts whose deadline has not passed"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("ordering" = Option<String>, Query, description = "Sort key, prefix with - for descending")
    ),
    responses(
        (status = 200, description = "List of job adverts", body = AdvertListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_adverts(
    State(state): State<AppState>,
    Query(query): Query<AdvertListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.advert_service.list(query).await?;
    Ok(Json(AdvertListResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
    }))
}

#[utoipa::path(
    get,
    path = "/api/adverts/{id}/",
    params(
        ("id" = Uuid, Path, description = "Job advert ID")
    ),
    responses(
        (status = 200, description = "Job advert found", body = AdvertDetailResponse),
        (status = 404, description = "Job advert not found")
    )
)]
#[axum::debug_handler]
pub async fn get_advert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.advert_service.get_active_counting_view(id).await?;
    Ok(Json(AdvertDetailResponse {
        advert: detail.advert.into(),
        employer: detail.employer.into(),
        skills: detail.skills,
        categories: detail.categories,
    }))
}

#[utoipa::path(
    post,
    path = "/api/adverts/create/",
    request_body = CreateAdvertPayload,
    responses(
        (status = 201, description = "Job advert created", body = AdvertResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller is not an employer")
    )
)]
#[axum::debug_handler]
pub async fn create_advert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAdvertPayload>,
) -> Result<impl IntoResponse> {
    if claims.role != AccountRole::Employer {
        return Err(Error::Forbidden(
            "Only employers can post job adverts".to_string(),
        ));
    }
    payload.validate()?;
    if !salary_bounds_valid(payload.salary_min, payload.salary_max) {
        return Err(Error::BadRequest(
            "salary_min must not exceed salary_max".to_string(),
        ));
    }
    let advert = state
        .advert_service
        .create(claims.account_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(AdvertResponse::from(advert))))
}

#[utoipa::path(
    patch,
    path = "/api/adverts/{id}/update/",
    params(
        ("id" = Uuid, Path, description = "Job advert ID")
    ),
    request_body = UpdateAdvertPayload,
    responses(
        (status = 200, description = "Job advert updated", body = AdvertResponse),
        (status = 403, description = "Caller does not own this advert"),
        (status = 404, description = "Job advert not found")
    )
)]
#[axum::debug_handler]
pub async fn update_advert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdvertPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if !salary_bounds_valid(payload.salary_min, payload.salary_max) {
        return Err(Error::BadRequest(
            "salary_min must not exceed salary_max".to_string(),
        ));
    }
    let advert = state
        .advert_service
        .update(id, claims.account_id()?, payload)
        .await?;
    Ok(Json(AdvertResponse::from(advert)))
}

#[utoipa::path(
    delete,
    path = "/api/adverts/{id}/delete/",
    params(
        ("id" = Uuid, Path, description = "Job advert ID")
    ),
    responses(
        (status = 204, description = "Job advert deleted"),
        (status = 403, description = "Caller does not own this advert"),
        (status = 404, description = "Job advert not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_advert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .advert_service
        .delete(id, claims.account_id()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
