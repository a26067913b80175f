//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: String,
    pub normalized_email: String,
    pub email_confirmed: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Rotated whenever credentials change; tokens carrying an old stamp are stale
    #[serde(skip_serializing)]
    pub security_stamp: String,
    #[serde(skip_serializing)]
    pub email_confirmation_token: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search criteria for users; text filters match case-insensitive substrings
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

