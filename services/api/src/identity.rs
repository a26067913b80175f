//! Identity subsystem: user and role management backed by the database context
//!
//! The layering is stores (persistence seams), managers (policy: validation,
//! normalization, hashing, uniqueness), and the sign-in manager (credential
//! checks plus the confirmed-account requirement).

use rand::{Rng, distributions::Alphanumeric};
use thiserror::Error;

use common::error::DatabaseError;

pub mod builder;
pub mod manager;
pub mod options;
pub mod password;
pub mod sign_in;
pub mod store;
pub mod validation;

pub use builder::{IdentityBuilder, add_identity};
pub use manager::{NewUser, RoleManager, UserManager};
pub use options::IdentityOptions;
pub use password::PasswordHasher;
pub use sign_in::{SignInManager, SignInResult};
pub use store::{RoleStore, UserStore};

/// Length of generated security stamps and confirmation tokens
const TOKEN_LENGTH: usize = 32;

/// Error raised by identity operations
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User name '{0}' is already taken")]
    DuplicateUserName(String),

    #[error("Email '{0}' is already taken")]
    DuplicateEmail(String),

    #[error("Role name '{0}' is already taken")]
    DuplicateRoleName(String),

    #[error("{0}")]
    InvalidUserName(String),

    #[error("{0}")]
    InvalidEmail(String),

    #[error("{0}")]
    InvalidRoleName(String),

    #[error("{0}")]
    InvalidProfile(String),

    #[error("{0}")]
    PasswordPolicy(String),

    #[error("Password and confirmation do not match")]
    PasswordMismatch,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Role '{0}' not found")]
    RoleNotFound(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Type alias for identity results
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Canonical form used for case-insensitive lookups of names and emails
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Random alphanumeric token for security stamps and confirmation links
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
