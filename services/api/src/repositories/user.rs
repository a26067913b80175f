//! User repository for database operations

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use common::{
    database::TemplateContext,
    error::{DatabaseError, DatabaseResult},
};

use crate::identity::UserStore;
use crate::models::{User, UserFilter};

const USER_COLUMNS: &str = "id, user_name, normalized_user_name, email, normalized_email, \
     email_confirmed, password_hash, security_stamp, email_confirmation_token, \
     first_name, last_name, created_at, updated_at";

/// User store bound to the database context
#[derive(Clone)]
pub struct PgUserStore {
    context: Arc<TemplateContext>,
}

impl PgUserStore {
    /// Create a new user repository
    pub fn new(context: Arc<TemplateContext>) -> Self {
        Self { context }
    }

    async fn find_one(&self, column: &str, value: &str) -> DatabaseResult<Option<User>> {
        let pool = self.context.pool().await?;

        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}

/// Escape LIKE wildcards so search terms match literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    let columns = [
        ("user_name", &filter.user_name),
        ("email", &filter.email),
        ("first_name", &filter.first_name),
        ("last_name", &filter.last_name),
    ];

    for (column, term) in columns {
        if let Some(term) = term {
            builder
                .push(format!(" AND {column} ILIKE "))
                .push_bind(like_pattern(term));
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> DatabaseResult<()> {
        info!("Creating new user: {}", user.user_name);
        let pool = self.context.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, user_name, normalized_user_name, email, normalized_email,
                               email_confirmed, password_hash, security_stamp,
                               email_confirmation_token, first_name, last_name,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.user_name)
        .bind(&user.normalized_user_name)
        .bind(&user.email)
        .bind(&user.normalized_email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(&user.security_stamp)
        .bind(&user.email_confirmation_token)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    async fn update(&self, user: &User) -> DatabaseResult<()> {
        let pool = self.context.pool().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, normalized_email = $3, email_confirmed = $4,
                password_hash = $5, security_stamp = $6, email_confirmation_token = $7,
                first_name = $8, last_name = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.normalized_email)
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .bind(&user.security_stamp)
        .bind(&user.email_confirmation_token)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.updated_at)
        .execute(pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user by ID: {}", id);
        let pool = self.context.pool().await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let pool = self.context.pool().await?;

        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_by_normalized_user_name(
        &self,
        normalized: &str,
    ) -> DatabaseResult<Option<User>> {
        self.find_one("normalized_user_name", normalized).await
    }

    async fn find_by_normalized_email(&self, normalized: &str) -> DatabaseResult<Option<User>> {
        self.find_one("normalized_email", normalized).await
    }

    async fn search(&self, filter: &UserFilter) -> DatabaseResult<(Vec<User>, i64)> {
        let pool = self.context.pool().await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .map_err(DatabaseError::from_query)?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY user_name LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let users = select
            .build_query_as::<User>()
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok((users, total))
    }

    async fn get_roles(&self, user_id: Uuid) -> DatabaseResult<Vec<String>> {
        let pool = self.context.pool().await?;

        sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn add_to_role(&self, user_id: Uuid, role_id: Uuid) -> DatabaseResult<()> {
        let pool = self.context.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(())
    }
}
