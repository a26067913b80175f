//! Request payloads

use serde::Deserialize;
use uuid::Uuid;

/// Default and maximum page sizes for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for user listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearchRequest {
    /// Substring of the user name
    pub user_name: Option<String>,
    /// Substring of the email address
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

impl UserSearchRequest {
    /// Page number, at least 1
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) as i64 * self.limit() as i64
    }
}

/// Request for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserInsertRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Names of existing roles to grant
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Request for updating a user; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    /// Roles to add; existing roles are kept
    pub roles: Option<Vec<String>>,
}

/// Request for self-service registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request for creating a role
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// Request for confirming an account's email address
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEmailRequest {
    pub user_id: Uuid,
    pub token: String,
}

/// Request for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub user_name_or_email: String,
    pub password: String,
}

/// Request for token refresh
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
