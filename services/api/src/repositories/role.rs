//! Role repository for database operations

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use common::{
    database::TemplateContext,
    error::{DatabaseError, DatabaseResult},
};

use crate::identity::RoleStore;
use crate::models::Role;

/// Role store bound to the database context
#[derive(Clone)]
pub struct PgRoleStore {
    context: Arc<TemplateContext>,
}

impl PgRoleStore {
    /// Create a new role repository
    pub fn new(context: Arc<TemplateContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn create(&self, role: &Role) -> DatabaseResult<()> {
        info!("Creating role: {}", role.name);
        let pool = self.context.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, normalized_name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.normalized_name)
        .bind(role.created_at)
        .execute(pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    async fn find_by_normalized_name(&self, normalized: &str) -> DatabaseResult<Option<Role>> {
        let pool = self.context.pool().await?;

        sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, normalized_name, created_at
            FROM roles
            WHERE normalized_name = $1
            "#,
        )
        .bind(normalized)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self) -> DatabaseResult<Vec<Role>> {
        let pool = self.context.pool().await?;

        sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, normalized_name, created_at
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}
