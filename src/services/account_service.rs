use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::account_dto::{RegisterPayload, UpdateProfilePayload};
use crate::error::{Error, Result};
use crate::models::account::Account;
use crate::utils::crypto;

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, company_name, \
     phone_number, bio, website, location, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<Account> {
        let exists_username =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE username = $1")
                .bind(&payload.username)
                .fetch_optional(&self.pool)
                .await?;
        if exists_username.is_some() {
            return Err(Error::BadRequest(
                "An account with this username already exists".to_string(),
            ));
        }

        let exists_email =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE email = $1")
                .bind(&payload.email)
                .fetch_optional(&self.pool)
                .await?;
        if exists_email.is_some() {
            return Err(Error::BadRequest(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = crypto::hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (username, email, password_hash, role, company_name, \
             phone_number, bio, website, location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&payload.username)
        .bind(&payload.email)
        .bind(&password_hash)
        .bind(payload.role)
        .bind(&payload.company_name)
        .bind(&payload.phone_number)
        .bind(&payload.bio)
        .bind(&payload.website)
        .bind(&payload.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))?;

        let verified = crypto::verify_password(password, &account.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !verified {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }
        if !account.is_active {
            return Err(Error::Unauthorized("Account is disabled".to_string()));
        }

        Ok(account)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Account> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    pub async fn update_profile(&self, id: Uuid, payload: UpdateProfilePayload) -> Result<Account> {
        if let Some(ref email) = payload.email {
            let taken = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM accounts WHERE email = $1 AND id <> $2",
            )
            .bind(email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            if taken.is_some() {
                return Err(Error::BadRequest(
                    "An account with this email already exists".to_string(),
                ));
            }
        }

        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET \
                email = COALESCE($2, email), \
                company_name = COALESCE($3, company_name), \
                phone_number = COALESCE($4, phone_number), \
                bio = COALESCE($5, bio), \
                website = COALESCE($6, website), \
                location = COALESCE($7, location), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(&payload.email)
        .bind(&payload.company_name)
        .bind(&payload.phone_number)
        .bind(&payload.bio)
        .bind(&payload.website)
        .bind(&payload.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }
}
