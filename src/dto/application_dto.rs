use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::application::{ApplicationStatus, JobApplication};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateApplicationStatusPayload {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: uuid::Uuid,
    pub seeker_id: uuid::Uuid,
    pub job_advert_id: uuid::Uuid,
    pub cover_letter: String,
    pub resume_path: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<ApplicationStatus>,
    pub ordering: Option<String>,
}

impl From<JobApplication> for ApplicationResponse {
    fn from(value: JobApplication) -> Self {
        Self {
            id: value.id,
            seeker_id: value.seeker_id,
            job_advert_id: value.job_advert_id,
            cover_letter: value.cover_letter,
            resume_path: value.resume_path,
            status: value.status,
            applied_at: value.applied_at,
            updated_at: value.updated_at,
        }
    }
}
