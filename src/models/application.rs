use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Rejected,
    Accepted,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Statuses counted toward an advert's `applications_count`.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending
                | ApplicationStatus::Reviewed
                | ApplicationStatus::Interview
                | ApplicationStatus::Accepted
        )
    }

    /// Once an application is rejected, accepted or withdrawn the seeker can no
    /// longer withdraw it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected
                | ApplicationStatus::Accepted
                | ApplicationStatus::Withdrawn
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One seeker's submission against one advert. At most one row exists per
/// (seeker, advert) pair; withdrawal is a status value, not a deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub seeker_id: Uuid,
    pub job_advert_id: Uuid,
    pub cover_letter: String,
    pub resume_path: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_set_excludes_rejected_and_withdrawn() {
        assert!(ApplicationStatus::Pending.is_live());
        assert!(ApplicationStatus::Reviewed.is_live());
        assert!(ApplicationStatus::Interview.is_live());
        assert!(ApplicationStatus::Accepted.is_live());
        assert!(!ApplicationStatus::Rejected.is_live());
        assert!(!ApplicationStatus::Withdrawn.is_live());
    }

    #[test]
    fn terminal_states_block_withdrawal() {
        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(!ApplicationStatus::Reviewed.is_terminal());
        assert!(!ApplicationStatus::Interview.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Accepted.is_terminal());
        assert!(ApplicationStatus::Withdrawn.is_terminal());
    }
}
