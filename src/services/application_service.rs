use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::application_dto::ApplicationListQuery;
use crate::error::{Error, Result};
use crate::models::account::AccountRole;
use crate::models::application::{ApplicationStatus, JobApplication};
use crate::services::notification_service::NotificationService;

const APPLICATION_COLUMNS: &str =
    "id, seeker_id, job_advert_id, cover_letter, resume_path, status, applied_at, updated_at";

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    notifications: NotificationService,
}

pub struct ApplicationPage {
    pub items: Vec<JobApplication>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Decides whether `actor` may move `current` to `new_status`. The advert's
/// employer may set any status; the owning seeker may only withdraw, and only
/// while the application is still in a non-terminal state.
pub fn status_change_allowed(
    actor_id: Uuid,
    current: &JobApplication,
    advert_employer_id: Uuid,
    new_status: ApplicationStatus,
) -> std::result::Result<(), &'static str> {
    if actor_id == advert_employer_id {
        return Ok(());
    }
    if actor_id == current.seeker_id {
        if new_status != ApplicationStatus::Withdrawn {
            return Err("Applicants may only withdraw their application");
        }
        if current.status.is_terminal() {
            return Err("Application is already settled and cannot be withdrawn");
        }
        return Ok(());
    }
    Err("You are not a party to this application")
}

impl ApplicationService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// Submits a new application. The row is committed first; the counter
    /// recompute and the employer notification run after and never roll the
    /// submission back.
    pub async fn submit(
        &self,
        seeker_id: Uuid,
        seeker_role: AccountRole,
        job_advert_id: Uuid,
        cover_letter: String,
        resume_path: String,
    ) -> Result<JobApplication> {
        if seeker_role != AccountRole::JobSeeker {
            return Err(Error::Forbidden(
                "Only job seekers can apply for jobs".to_string(),
            ));
        }

        let advert_exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM job_adverts WHERE id = $1 AND is_active = TRUE",
        )
        .bind(job_advert_id)
        .fetch_optional(&self.pool)
        .await?;
        if advert_exists.is_none() {
            return Err(Error::NotFound(
                "Job advert not found or no longer active".to_string(),
            ));
        }

        // Friendly pre-check; the unique constraint below is the authoritative guard.
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM job_applications WHERE seeker_id = $1 AND job_advert_id = $2",
        )
        .bind(seeker_id)
        .bind(job_advert_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(Error::Duplicate(
                "You have already applied for this job".to_string(),
            ));
        }

        let inserted = sqlx::query_as::<_, JobApplication>(&format!(
            "INSERT INTO job_applications (seeker_id, job_advert_id, cover_letter, resume_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(seeker_id)
        .bind(job_advert_id)
        .bind(&cover_letter)
        .bind(&resume_path)
        .fetch_one(&self.pool)
        .await;

        let application = match inserted {
            Ok(application) => application,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(Error::Duplicate(
                    "You have already applied for this job".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        self.recompute_applications_count(job_advert_id).await?;

        if let Err(e) = self
            .notifications
            .notify_new_application(application.id)
            .await
        {
            tracing::error!(application_id = %application.id, error = ?e,
                "Failed to enqueue new-application notification");
        }

        Ok(application)
    }

    /// Applies a status transition on behalf of `actor`. A transition to the
    /// current status is a permitted no-op that still recomputes the counter
    /// but sends no notification.
    pub async fn update_status(
        &self,
        actor_id: Uuid,
        application_id: Uuid,
        new_status: ApplicationStatus,
    ) -> Result<JobApplication> {
        let current = sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = $1"
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        let advert_employer_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT employer_id FROM job_adverts WHERE id = $1",
        )
        .bind(current.job_advert_id)
        .fetch_one(&self.pool)
        .await?;

        status_change_allowed(actor_id, &current, advert_employer_id, new_status)
            .map_err(|reason| Error::Forbidden(reason.to_string()))?;

        let old_status = current.status;
        let updated = sqlx::query_as::<_, JobApplication>(&format!(
            "UPDATE job_applications SET status = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(application_id)
        .bind(new_status)
        .fetch_one(&self.pool)
        .await?;

        self.recompute_applications_count(updated.job_advert_id)
            .await?;

        if old_status != new_status {
            if let Err(e) = self
                .notifications
                .notify_status_change(updated.id, old_status, new_status)
                .await
            {
                tracing::error!(application_id = %updated.id, error = ?e,
                    "Failed to enqueue status-change notification");
            }
        }

        Ok(updated)
    }

    /// Rewrites the advert's cached counter from the ledger. A full recount of
    /// the live-status rows rather than an increment, so a missed or repeated
    /// trigger can never make the cache drift.
    pub async fn recompute_applications_count(&self, job_advert_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE job_adverts SET applications_count = ( \
                 SELECT COUNT(*) FROM job_applications \
                 WHERE job_advert_id = $1 \
                   AND status IN ('pending', 'reviewed', 'interview', 'accepted') \
             ) \
             WHERE id = $1",
        )
        .bind(job_advert_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_actor(
        &self,
        actor_id: Uuid,
        actor_role: AccountRole,
        query: ApplicationListQuery,
    ) -> Result<ApplicationPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let order_sql = match query.ordering.as_deref() {
            None | Some("-applied_at") => "applied_at DESC",
            Some("applied_at") => "applied_at ASC",
            Some("updated_at") => "updated_at ASC",
            Some("-updated_at") => "updated_at DESC",
            Some(other) => {
                return Err(Error::BadRequest(format!("Unsupported ordering: {}", other)))
            }
        };

        let mut items_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {APPLICATION_COLUMNS} FROM job_applications"));
        Self::push_visibility(&mut items_qb, actor_id, actor_role, query.status);
        items_qb.push(format!(" ORDER BY {} LIMIT ", order_sql));
        items_qb.push_bind(per_page);
        items_qb.push(" OFFSET ");
        items_qb.push_bind(offset);
        let items = items_qb
            .build_query_as::<JobApplication>()
            .fetch_all(&self.pool)
            .await?;

        let mut total_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM job_applications");
        Self::push_visibility(&mut total_qb, actor_id, actor_role, query.status);
        let total = total_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(ApplicationPage {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    fn push_visibility(
        qb: &mut QueryBuilder<Postgres>,
        actor_id: Uuid,
        actor_role: AccountRole,
        status: Option<ApplicationStatus>,
    ) {
        match actor_role {
            AccountRole::Employer => {
                qb.push(
                    " WHERE job_advert_id IN (SELECT id FROM job_adverts WHERE employer_id = ",
                );
                qb.push_bind(actor_id);
                qb.push(")");
            }
            _ => {
                qb.push(" WHERE seeker_id = ");
                qb.push_bind(actor_id);
            }
        }
        if let Some(status) = status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
    }

    /// Fetches one application if the actor is a party to it; anything else is
    /// reported as not found rather than leaking its existence.
    pub async fn get_for_actor(
        &self,
        actor_id: Uuid,
        application_id: Uuid,
    ) -> Result<JobApplication> {
        let application = sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = $1"
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        if application.seeker_id == actor_id {
            return Ok(application);
        }
        let advert_employer_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT employer_id FROM job_adverts WHERE id = $1",
        )
        .bind(application.job_advert_id)
        .fetch_one(&self.pool)
        .await?;
        if advert_employer_id == actor_id {
            return Ok(application);
        }
        Err(Error::NotFound("Application not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn application(seeker_id: Uuid, status: ApplicationStatus) -> JobApplication {
        JobApplication {
            id: Uuid::new_v4(),
            seeker_id,
            job_advert_id: Uuid::new_v4(),
            cover_letter: "I would like to apply".to_string(),
            resume_path: "./uploads/resumes/test.pdf".to_string(),
            status,
            applied_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn employer_may_set_any_status() {
        let employer = Uuid::new_v4();
        let app = application(Uuid::new_v4(), ApplicationStatus::Pending);
        for status in [
            ApplicationStatus::Reviewed,
            ApplicationStatus::Interview,
            ApplicationStatus::Rejected,
            ApplicationStatus::Accepted,
            ApplicationStatus::Withdrawn,
        ] {
            assert!(status_change_allowed(employer, &app, employer, status).is_ok());
        }
    }

    #[test]
    fn seeker_may_only_withdraw() {
        let seeker = Uuid::new_v4();
        let app = application(seeker, ApplicationStatus::Pending);
        let employer = Uuid::new_v4();
        assert!(status_change_allowed(seeker, &app, employer, ApplicationStatus::Withdrawn).is_ok());
        assert!(
            status_change_allowed(seeker, &app, employer, ApplicationStatus::Accepted).is_err()
        );
        assert!(
            status_change_allowed(seeker, &app, employer, ApplicationStatus::Reviewed).is_err()
        );
    }

    #[test]
    fn seeker_cannot_withdraw_settled_application() {
        let seeker = Uuid::new_v4();
        let employer = Uuid::new_v4();
        for status in [
            ApplicationStatus::Rejected,
            ApplicationStatus::Accepted,
            ApplicationStatus::Withdrawn,
        ] {
            let app = application(seeker, status);
            assert!(
                status_change_allowed(seeker, &app, employer, ApplicationStatus::Withdrawn)
                    .is_err()
            );
        }
    }

    #[test]
    fn strangers_are_rejected() {
        let app = application(Uuid::new_v4(), ApplicationStatus::Pending);
        let stranger = Uuid::new_v4();
        assert!(status_change_allowed(
            stranger,
            &app,
            Uuid::new_v4(),
            ApplicationStatus::Withdrawn
        )
        .is_err());
    }
}
