//! PostgreSQL implementations of the identity stores

pub mod role;
pub mod user;

pub use role::PgRoleStore;
pub use user::PgUserStore;
