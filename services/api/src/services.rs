//! Application services resolved per request scope

use thiserror::Error;
use tracing::error;

use crate::identity::IdentityError;

pub mod auth;
pub mod crud;
pub mod user;

pub use auth::{AuthService, IdentityAuthService};
pub use crud::{CrudService, UserCrudService};
pub use user::UserService;

/// Error raised by application services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Valid credentials, but the account may not sign in yet
    #[error("{0}")]
    NotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<IdentityError> for ServiceError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::DuplicateUserName(_)
            | IdentityError::DuplicateEmail(_)
            | IdentityError::DuplicateRoleName(_) => ServiceError::Conflict(e.to_string()),
            IdentityError::InvalidUserName(_)
            | IdentityError::InvalidEmail(_)
            | IdentityError::InvalidRoleName(_)
            | IdentityError::InvalidProfile(_)
            | IdentityError::PasswordPolicy(_)
            | IdentityError::PasswordMismatch
            | IdentityError::InvalidToken
            | IdentityError::RoleNotFound(_) => ServiceError::Validation(e.to_string()),
            IdentityError::UserNotFound => ServiceError::NotFound(e.to_string()),
            IdentityError::Hashing(_) | IdentityError::Store(_) => {
                error!("Identity operation failed: {}", e);
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

/// Reject a password whose confirmation differs
pub(crate) fn confirm_password(password: &str, confirmation: &str) -> ServiceResult<()> {
    if password != confirmation {
        return Err(IdentityError::PasswordMismatch.into());
    }
    Ok(())
}
