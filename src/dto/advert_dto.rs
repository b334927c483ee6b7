use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::account_dto::AccountResponse;
use crate::models::advert::{ExperienceLevel, JobAdvert, JobType};
use crate::models::category::Category;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdvertPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub requirements: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub skill_ids: Vec<i64>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAdvertPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub requirements: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub salary_currency: Option<String>,
    pub is_remote: Option<bool>,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub skill_ids: Option<Vec<i64>>,
    pub category_ids: Option<Vec<i64>>,
}

/// Cross-field check the derive cannot express: when both salary bounds are
/// supplied together, the floor must not exceed the ceiling.
pub fn salary_bounds_valid(salary_min: Option<Decimal>, salary_max: Option<Decimal>) -> bool {
    match (salary_min, salary_max) {
        (Some(min), Some(max)) => min <= max,
        _ => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvertResponse {
    pub id: uuid::Uuid,
    pub employer_id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub salary_currency: String,
    pub is_remote: bool,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub views_count: i64,
    pub applications_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct SkillWithImportance {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub importance_level: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdvertDetailResponse {
    #[serde(flatten)]
    pub advert: AdvertResponse,
    pub employer: AccountResponse,
    pub skills: Vec<SkillWithImportance>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdvertListResponse {
    pub items: Vec<AdvertResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdvertListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_remote: Option<bool>,
    pub is_active: Option<bool>,
    pub skills: Option<String>,
    pub categories: Option<String>,
    pub min_salary: Option<Decimal>,
    pub max_salary: Option<Decimal>,
    pub deadline: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl From<JobAdvert> for AdvertResponse {
    fn from(value: JobAdvert) -> Self {
        Self {
            id: value.id,
            employer_id: value.employer_id,
            title: value.title,
            description: value.description,
            requirements: value.requirements,
            location: value.location,
            job_type: value.job_type,
            experience_level: value.experience_level,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            salary_currency: value.salary_currency,
            is_remote: value.is_remote,
            application_deadline: value.application_deadline,
            is_active: value.is_active,
            views_count: value.views_count,
            applications_count: value.applications_count,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn salary_bounds_rejected_when_inverted() {
        assert!(!salary_bounds_valid(
            Some(Decimal::from(90_000)),
            Some(Decimal::from(60_000))
        ));
    }

    #[test]
    fn salary_bounds_accept_equal_and_open_ranges() {
        assert!(salary_bounds_valid(
            Some(Decimal::from(60_000)),
            Some(Decimal::from(60_000))
        ));
        assert!(salary_bounds_valid(Some(Decimal::from(60_000)), None));
        assert!(salary_bounds_valid(None, None));
    }
}
