//! Persistence seams for users and roles

use async_trait::async_trait;
use uuid::Uuid;

use common::error::DatabaseResult;

use crate::models::{Role, User, UserFilter};

/// Persistence of user accounts and their role memberships
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> DatabaseResult<()>;

    async fn update(&self, user: &User) -> DatabaseResult<()>;

    /// Returns false when no user had `id`
    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_by_normalized_user_name(&self, normalized: &str)
    -> DatabaseResult<Option<User>>;

    async fn find_by_normalized_email(&self, normalized: &str) -> DatabaseResult<Option<User>>;

    /// One page of matching users plus the total number of matches
    async fn search(&self, filter: &UserFilter) -> DatabaseResult<(Vec<User>, i64)>;

    /// Role names held by the user, ordered by name
    async fn get_roles(&self, user_id: Uuid) -> DatabaseResult<Vec<String>>;

    /// Grant a role; granting a held role is a no-op
    async fn add_to_role(&self, user_id: Uuid, role_id: Uuid) -> DatabaseResult<()>;
}

/// Persistence of roles
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create(&self, role: &Role) -> DatabaseResult<()>;

    async fn find_by_normalized_name(&self, normalized: &str) -> DatabaseResult<Option<Role>>;

    async fn list(&self) -> DatabaseResult<Vec<Role>>;
}
