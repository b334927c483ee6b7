use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::advert_dto::{
    AdvertListQuery, CreateAdvertPayload, SkillWithImportance, UpdateAdvertPayload,
};
use crate::error::{Error, Result};
use crate::models::account::Account;
use crate::models::advert::JobAdvert;
use crate::models::category::Category;

const ADVERT_COLUMNS: &str = "id, employer_id, title, description, requirements, location, \
     job_type, experience_level, salary_min, salary_max, salary_currency, is_remote, \
     application_deadline, is_active, views_count, applications_count, created_at, updated_at";

#[derive(Clone)]
pub struct AdvertService {
    pool: PgPool,
}

pub struct AdvertList {
    pub items: Vec<JobAdvert>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

pub struct AdvertDetail {
    pub advert: JobAdvert,
    pub employer: Account,
    pub skills: Vec<SkillWithImportance>,
    pub categories: Vec<Category>,
}

/// Adverts created without an explicit deadline get a 30 day window from the
/// day of creation. Assigned once, at creation only.
pub fn default_application_deadline(today: NaiveDate) -> NaiveDate {
    today + Duration::days(30)
}

impl AdvertService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, employer_id: Uuid, payload: CreateAdvertPayload) -> Result<JobAdvert> {
        let deadline = payload
            .application_deadline
            .unwrap_or_else(|| default_application_deadline(Utc::now().date_naive()));

        let advert = sqlx::query_as::<_, JobAdvert>(&format!(
            "INSERT INTO job_adverts (employer_id, title, description, requirements, location, \
             job_type, experience_level, salary_min, salary_max, salary_currency, is_remote, \
             application_deadline, is_active) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'full_time'), COALESCE($7, 'mid'), \
             $8, $9, COALESCE($10, 'USD'), $11, $12, COALESCE($13, TRUE)) \
             RETURNING {ADVERT_COLUMNS}"
        ))
        .bind(employer_id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.requirements)
        .bind(&payload.location)
        .bind(payload.job_type)
        .bind(payload.experience_level)
        .bind(payload.salary_min)
        .bind(payload.salary_max)
        .bind(&payload.salary_currency)
        .bind(payload.is_remote)
        .bind(deadline)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;

        self.attach_skills(advert.id, &payload.skill_ids).await?;
        self.attach_categories(advert.id, &payload.category_ids)
            .await?;

        Ok(advert)
    }

    pub async fn update(
        &self,
        id: Uuid,
        employer_id: Uuid,
        payload: UpdateAdvertPayload,
    ) -> Result<JobAdvert> {
        self.get_owned(id, employer_id).await?;

        let advert = sqlx::query_as::<_, JobAdvert>(&format!(
            "UPDATE job_adverts SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                requirements = COALESCE($4, requirements), \
                location = COALESCE($5, location), \
                job_type = COALESCE($6, job_type), \
                experience_level = COALESCE($7, experience_level), \
                salary_min = COALESCE($8, salary_min), \
                salary_max = COALESCE($9, salary_max), \
                salary_currency = COALESCE($10, salary_currency), \
                is_remote = COALESCE($11, is_remote), \
                application_deadline = COALESCE($12, application_deadline), \
                is_active = COALESCE($13, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ADVERT_COLUMNS}"
        ))
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.requirements)
        .bind(&payload.location)
        .bind(payload.job_type)
        .bind(payload.experience_level)
        .bind(payload.salary_min)
        .bind(payload.salary_max)
        .bind(&payload.salary_currency)
        .bind(payload.is_remote)
        .bind(payload.application_deadline)
        .bind(payload.is_active)
        .fetch_one(&self.pool)
        .await?;

        if let Some(ref skill_ids) = payload.skill_ids {
            sqlx::query("DELETE FROM job_advert_skills WHERE job_advert_id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            self.attach_skills(id, skill_ids).await?;
        }
        if let Some(ref category_ids) = payload.category_ids {
            sqlx::query("DELETE FROM job_advert_categories WHERE job_advert_id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            self.attach_categories(id, category_ids).await?;
        }

        Ok(advert)
    }

    pub async fn delete(&self, id: Uuid, employer_id: Uuid) -> Result<()> {
        self.get_owned(id, employer_id).await?;
        sqlx::query("DELETE FROM job_adverts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<JobAdvert> {
        let advert = sqlx::query_as::<_, JobAdvert>(&format!(
            "SELECT {ADVERT_COLUMNS} FROM job_adverts WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(advert)
    }

    /// Public retrieval bumps the view counter as a side effect; the increment
    /// happens in the same statement so concurrent reads never lose an update.
    pub async fn get_active_counting_view(&self, id: Uuid) -> Result<AdvertDetail> {
        let advert = sqlx::query_as::<_, JobAdvert>(&format!(
            "UPDATE job_adverts SET views_count = views_count + 1 \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {ADVERT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Job advert not found".to_string()))?;

        self.load_detail(advert).await
    }

    async fn load_detail(&self, advert: JobAdvert) -> Result<AdvertDetail> {
        let employer = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, password_hash, role, company_name, phone_number, \
             bio, website, location, is_active, created_at, updated_at \
             FROM accounts WHERE id = $1",
        )
        .bind(advert.employer_id)
        .fetch_one(&self.pool)
        .await?;

        let skills = sqlx::query_as::<_, SkillWithImportance>(
            "SELECT s.id, s.name, s.description, jas.importance_level \
             FROM job_advert_skills jas \
             JOIN skills s ON s.id = jas.skill_id \
             WHERE jas.job_advert_id = $1 \
             ORDER BY jas.importance_level DESC, s.name ASC",
        )
        .bind(advert.id)
        .fetch_all(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, Category>(
            "SELECT c.id, c.name, c.description, c.parent_id \
             FROM job_advert_categories jac \
             JOIN categories c ON c.id = jac.category_id \
             WHERE jac.job_advert_id = $1 \
             ORDER BY c.name ASC",
        )
        .bind(advert.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AdvertDetail {
            advert,
            employer,
            skills,
            categories,
        })
    }

    pub async fn list(&self, query: AdvertListQuery) -> Result<AdvertList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let skill_ids = parse_id_list(query.skills.as_deref())?;
        let category_ids = parse_id_list(query.categories.as_deref())?;

        let order_sql = match query.ordering.as_deref() {
            None | Some("-created_at") => "created_at DESC",
            Some("created_at") => "created_at ASC",
            Some("salary_min") => "salary_min ASC NULLS LAST",
            Some("-salary_min") => "salary_min DESC NULLS LAST",
            Some("salary_max") => "salary_max ASC NULLS LAST",
            Some("-salary_max") => "salary_max DESC NULLS LAST",
            Some("views_count") => "views_count ASC",
            Some("-views_count") => "views_count DESC",
            Some(other) => {
                return Err(Error::BadRequest(format!("Unsupported ordering: {}", other)))
            }
        };

        let mut items_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ADVERT_COLUMNS} FROM job_adverts"));
        Self::push_filters(&mut items_qb, &query, &skill_ids, &category_ids);
        items_qb.push(format!(" ORDER BY {} LIMIT ", order_sql));
        items_qb.push_bind(per_page);
        items_qb.push(" OFFSET ");
        items_qb.push_bind(offset);
        let items = items_qb
            .build_query_as::<JobAdvert>()
            .fetch_all(&self.pool)
            .await?;

        let mut total_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM job_adverts");
        Self::push_filters(&mut total_qb, &query, &skill_ids, &category_ids);
        let total = total_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(AdvertList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    fn push_filters(
        qb: &mut QueryBuilder<Postgres>,
        query: &AdvertListQuery,
        skill_ids: &[i64],
        category_ids: &[i64],
    ) {
        qb.push(" WHERE is_active = ");
        qb.push_bind(query.is_active.unwrap_or(true));
        if let Some(job_type) = query.job_type {
            qb.push(" AND job_type = ");
            qb.push_bind(job_type);
        }
        if let Some(experience_level) = query.experience_level {
            qb.push(" AND experience_level = ");
            qb.push_bind(experience_level);
        }
        if let Some(is_remote) = query.is_remote {
            qb.push(" AND is_remote = ");
            qb.push_bind(is_remote);
        }
        if !skill_ids.is_empty() {
            qb.push(
                " AND id IN (SELECT job_advert_id FROM job_advert_skills WHERE skill_id = ANY(",
            );
            qb.push_bind(skill_ids.to_vec());
            qb.push("))");
        }
        if !category_ids.is_empty() {
            qb.push(
                " AND id IN (SELECT job_advert_id FROM job_advert_categories WHERE category_id = ANY(",
            );
            qb.push_bind(category_ids.to_vec());
            qb.push("))");
        }
        if let Some(min_salary) = query.min_salary {
            qb.push(" AND salary_min >= ");
            qb.push_bind(min_salary);
        }
        if let Some(max_salary) = query.max_salary {
            qb.push(" AND salary_max <= ");
            qb.push_bind(max_salary);
        }
        if query.deadline.is_some() {
            qb.push(" AND application_deadline >= CURRENT_DATE");
        }
        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR requirements ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR location ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }

    /// Deactivates every active advert whose deadline has passed. Idempotent;
    /// returns the number of adverts flipped this run.
    pub async fn expire_adverts(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE job_adverts SET is_active = FALSE, updated_at = NOW() \
             WHERE is_active = TRUE AND application_deadline < $1",
        )
        .bind(now.date_naive())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn get_owned(&self, id: Uuid, employer_id: Uuid) -> Result<JobAdvert> {
        let advert = self.get_by_id(id).await?;
        if advert.employer_id != employer_id {
            return Err(Error::Forbidden(
                "You do not own this job advert".to_string(),
            ));
        }
        Ok(advert)
    }

    async fn attach_skills(&self, advert_id: Uuid, skill_ids: &[i64]) -> Result<()> {
        if skill_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO job_advert_skills (job_advert_id, skill_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT (job_advert_id, skill_id) DO NOTHING",
        )
        .bind(advert_id)
        .bind(skill_ids)
        .execute(&self.pool)
        .await
        .map_err(fk_to_bad_request)?;
        Ok(())
    }

    async fn attach_categories(&self, advert_id: Uuid, category_ids: &[i64]) -> Result<()> {
        if category_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO job_advert_categories (job_advert_id, category_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT (job_advert_id, category_id) DO NOTHING",
        )
        .bind(advert_id)
        .bind(category_ids)
        .execute(&self.pool)
        .await
        .map_err(fk_to_bad_request)?;
        Ok(())
    }
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| Error::BadRequest(format!("Invalid id in filter list: {}", part)))
        })
        .collect()
}

fn fk_to_bad_request(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            Error::BadRequest("Unknown skill or category id".to_string())
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn default_deadline_is_thirty_days_out() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            default_application_deadline(today),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
        );
    }

    #[test]
    fn id_list_filter_parsing() {
        assert_eq!(parse_id_list(None).unwrap(), Vec::<i64>::new());
        assert_eq!(parse_id_list(Some("1, 2,3")).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list(Some("")).unwrap(), Vec::<i64>::new());
        assert!(parse_id_list(Some("1,x")).is_err());
    }
}
