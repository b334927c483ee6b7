use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::path::Path as StdPath;
use tokio::fs;
use uuid::Uuid;

use crate::{
    dto::application_dto::{
        ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
        UpdateApplicationStatusPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

async fn save_resume_file(filename: &str, data: &bytes::Bytes) -> Result<String> {
    let config = crate::config::get_config();

    let ext = StdPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    if !config
        .allowed_resume_extensions
        .iter()
        .any(|allowed| allowed == &ext)
    {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            ext
        )));
    }

    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }

    let upload_dir = format!("{}/resumes", config.uploads_dir);
    fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    let file_id = Uuid::new_v4();
    let safe_filename = format!("{}.{}", file_id, ext);
    let file_path = format!("{}/{}", upload_dir, safe_filename);

    fs::write(&file_path, data).await.map_err(|e| {
        tracing::error!("Failed to write resume file: {}", e);
        Error::Internal(format!("Failed to save file: {}", e))
    })?;

    Ok(file_path)
}

#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(advert_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut cover_letter = String::new();
    let mut resume_path = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "cover_letter" => cover_letter = field.text().await.unwrap_or_default(),
            "resume" => {
                let filename = field.file_name().unwrap_or("resume.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read resume bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;

                if !data.is_empty() {
                    resume_path = Some(save_resume_file(&filename, &data).await?);
                }
            }
            _ => {}
        }
    }

    if cover_letter.is_empty() {
        return Err(Error::BadRequest("Cover letter is required".into()));
    }
    let resume_path =
        resume_path.ok_or_else(|| Error::BadRequest("Resume file is required".into()))?;

    let application = state
        .application_service
        .submit(
            claims.account_id()?,
            claims.role,
            advert_id,
            cover_letter,
            resume_path,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::from(application)),
    ))
}

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .application_service
        .list_for_actor(claims.account_id()?, claims.role, query)
        .await?;
    Ok(Json(ApplicationListResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        total_pages: page.total_pages,
    }))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .get_for_actor(claims.account_id()?, id)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .update_status(claims.account_id()?, id, payload.status)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}
