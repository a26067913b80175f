//! Persistent entities of the identity schema

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::Role;
pub use user::{User, UserFilter};
