use axum::{response::IntoResponse, Json};
use serde_json::json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::advert::list_adverts,
        crate::routes::advert::get_advert,
        crate::routes::advert::create_advert,
        crate::routes::advert::update_advert,
        crate::routes::advert::delete_advert,
        crate::routes::catalog::list_skills,
        crate::routes::catalog::list_categories,
    ),
    components(schemas(
        crate::dto::advert_dto::CreateAdvertPayload,
        crate::dto::advert_dto::UpdateAdvertPayload,
        crate::dto::advert_dto::AdvertResponse,
        crate::dto::advert_dto::AdvertDetailResponse,
        crate::dto::advert_dto::AdvertListResponse,
        crate::dto::advert_dto::SkillWithImportance,
        crate::dto::account_dto::AccountResponse,
        crate::models::account::AccountRole,
        crate::models::advert::JobType,
        crate::models::advert::ExperienceLevel,
        crate::models::application::ApplicationStatus,
        crate::models::skill::Skill,
        crate::models::category::Category,
    ))
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_schema() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[axum::debug_handler]
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "message": "Job Board API",
        "endpoints": {
            "auth": {
                "register": "/auth/register/",
                "login": "/auth/login/",
                "profile": "/auth/profile/",
            },
            "job_adverts": {
                "list": "/api/adverts/",
                "detail": "/api/adverts/{id}/",
                "create": "/api/adverts/create/",
                "update": "/api/adverts/{id}/update/",
                "delete": "/api/adverts/{id}/delete/",
            },
            "applications": {
                "list": "/api/applications/",
                "detail": "/api/applications/{id}/",
                "create": "/api/adverts/{id}/apply/",
                "update": "/api/applications/{id}/update/",
            },
            "skills": "/api/skills/",
            "categories": "/api/categories/",
            "schema": "/api/schema/",
        }
    }))
}
