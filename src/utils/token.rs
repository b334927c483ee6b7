use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::config::get_config;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::account::Account;

pub fn issue_access_token(account: &Account) -> Result<String> {
    let config = get_config();
    let exp = Utc::now() + chrono::Duration::hours(config.jwt_ttl_hours);
    let claims = Claims {
        sub: account.id.to_string(),
        exp: exp.timestamp() as usize,
        role: account.role,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}
