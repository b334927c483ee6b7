use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::account::Account;
use crate::models::application::ApplicationStatus;
use crate::models::email_outbox::EmailOutbox;

type HmacSha256 = Hmac<Sha256>;

const OUTBOX_COLUMNS: &str =
    "id, event_type, recipient, subject, body, status, attempts, created_at, updated_at";

/// Fire-and-forget email dispatch. Messages are composed at the ledger's
/// mutation points and parked in an outbox table; a background worker hands
/// them to the mail gateway one at a time. A failed hand-off is recorded on
/// the row and logged, never surfaced to the request that produced it.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    gateway_url: String,
}

#[derive(sqlx::FromRow)]
struct ApplicationContext {
    advert_title: String,
    employer_username: String,
    employer_email: String,
    seeker_username: String,
    seeker_email: String,
    cover_letter: String,
}

impl NotificationService {
    pub fn new(pool: PgPool, gateway_url: String) -> Self {
        Self {
            pool,
            client: Client::new(),
            gateway_url,
        }
    }

    pub async fn enqueue_email(
        &self,
        event_type: &str,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<EmailOutbox> {
        let row = sqlx::query_as::<_, EmailOutbox>(&format!(
            "INSERT INTO email_outbox (event_type, recipient, subject, body) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {OUTBOX_COLUMNS}"
        ))
        .bind(event_type)
        .bind(recipient)
        .bind(subject)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn load_application_context(
        &self,
        application_id: Uuid,
    ) -> Result<Option<ApplicationContext>> {
        let ctx = sqlx::query_as::<_, ApplicationContext>(
            "SELECT j.title AS advert_title, \
                    e.username AS employer_username, e.email AS employer_email, \
                    s.username AS seeker_username, s.email AS seeker_email, \
                    a.cover_letter \
             FROM job_applications a \
             JOIN job_adverts j ON j.id = a.job_advert_id \
             JOIN accounts e ON e.id = j.employer_id \
             JOIN accounts s ON s.id = a.seeker_id \
             WHERE a.id = $1",
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ctx)
    }

    pub async fn notify_new_application(&self, application_id: Uuid) -> Result<()> {
        let Some(ctx) = self.load_application_context(application_id).await? else {
            tracing::warn!(%application_id, "Application vanished before notification");
            return Ok(());
        };

        let subject = format!("New Application for {}", ctx.advert_title);
        let body = format!(
            "Hello {},\n\n\
             {} ({}) has applied for your job advert \"{}\".\n\n\
             Cover letter:\n{}\n\n\
             Log in to review the application.",
            ctx.employer_username,
            ctx.seeker_username,
            ctx.seeker_email,
            ctx.advert_title,
            ctx.cover_letter,
        );
        self.enqueue_email("new_application", &ctx.employer_email, &subject, &body)
            .await?;
        Ok(())
    }

    pub async fn notify_status_change(
        &self,
        application_id: Uuid,
        old_status: ApplicationStatus,
        new_status: ApplicationStatus,
    ) -> Result<()> {
        let Some(ctx) = self.load_application_context(application_id).await? else {
            tracing::warn!(%application_id, "Application vanished before notification");
            return Ok(());
        };

        let subject = format!("Application Status Update: {}", ctx.advert_title);
        let body = format!(
            "Hello {},\n\n\
             The status of your application for \"{}\" has changed from {} to {}.\n\n\
             Log in to see the details.",
            ctx.seeker_username, ctx.advert_title, old_status, new_status,
        );
        self.enqueue_email("status_change", &ctx.seeker_email, &subject, &body)
            .await?;
        Ok(())
    }

    pub async fn notify_welcome(&self, account: &Account) -> Result<()> {
        let subject = "Welcome to the Job Board".to_string();
        let body = format!(
            "Hello {},\n\n\
             Your {} account has been created. Welcome aboard!",
            account.username, account.role,
        );
        self.enqueue_email("welcome", &account.email, &subject, &body)
            .await?;
        Ok(())
    }

    async fn deliver_once(&self, outbox_id: Uuid) -> Result<()> {
        let row = sqlx::query_as::<_, EmailOutbox>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM email_outbox WHERE id = $1"
        ))
        .bind(outbox_id)
        .fetch_one(&self.pool)
        .await?;

        let config = crate::config::get_config();
        let payload = json!({
            "from": config.mail_from,
            "to": row.recipient,
            "subject": row.subject,
            "body": row.body,
            "event_type": row.event_type,
        });
        let body_bytes = serde_json::to_vec(&payload)?;

        let mut mac = HmacSha256::new_from_slice(config.mail_gateway_secret.as_bytes())
            .map_err(|e| Error::Internal(format!("Invalid mail gateway secret: {}", e)))?;
        mac.update(&body_bytes);
        let signature = hex::encode(mac.finalize().into_bytes());

        let res = self
            .client
            .post(&self.gateway_url)
            .header("content-type", "application/json")
            .header("X-Mail-Signature", signature)
            .body(body_bytes)
            .send()
            .await;

        match res {
            Ok(resp) if resp.status().is_success() => {
                sqlx::query(
                    "UPDATE email_outbox SET status = 'sent', attempts = attempts + 1, \
                     updated_at = NOW() WHERE id = $1",
                )
                .bind(outbox_id)
                .execute(&self.pool)
                .await?;
            }
            Ok(resp) => {
                tracing::error!(%outbox_id, status = %resp.status(), "Mail gateway rejected message");
                sqlx::query(
                    "UPDATE email_outbox SET status = 'failed', attempts = attempts + 1, \
                     updated_at = NOW() WHERE id = $1",
                )
                .bind(outbox_id)
                .execute(&self.pool)
                .await?;
            }
            Err(err) => {
                tracing::error!(%outbox_id, error = ?err, "Mail gateway unreachable");
                sqlx::query(
                    "UPDATE email_outbox SET status = 'failed', attempts = attempts + 1, \
                     updated_at = NOW() WHERE id = $1",
                )
                .bind(outbox_id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Drains one pending message. Returns whether a message was picked up so
    /// the worker loop can idle when the outbox is empty. Redelivery of failed
    /// messages is the transport's concern, not ours.
    pub async fn run_once(&self) -> Result<bool> {
        let row_opt = sqlx::query(
            "SELECT id FROM email_outbox \
             WHERE status = 'pending' \
             ORDER BY created_at ASC \
             FOR UPDATE SKIP LOCKED \
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row_opt else { return Ok(false) };
        let id: Uuid = row.try_get("id")?;

        let _ = self.deliver_once(id).await;

        Ok(true)
    }
}
