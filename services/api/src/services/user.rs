//! User CRUD service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::{
    contracts::{
        PagedResponse, UserInsertRequest, UserResponse, UserSearchRequest, UserUpdateRequest,
    },
    identity::{IdentityError, NewUser, RoleManager, UserManager},
    models::{User, UserFilter},
};

use super::{CrudService, ServiceError, ServiceResult, confirm_password};

/// CRUD over user accounts through the identity managers
pub struct UserService {
    users: Arc<UserManager>,
    roles: Arc<RoleManager>,
}

impl UserService {
    pub fn new(users: Arc<UserManager>, roles: Arc<RoleManager>) -> Self {
        Self { users, roles }
    }

    async fn find(&self, id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    async fn to_response(&self, user: User) -> ServiceResult<UserResponse> {
        let roles = self.users.get_roles(&user).await?;
        Ok(UserResponse::from_user(user, roles))
    }

    /// Fail before any write if a requested role does not exist
    async fn ensure_roles_exist(&self, role_names: &[String]) -> ServiceResult<()> {
        for name in role_names {
            if self.roles.find_by_name(name).await?.is_none() {
                return Err(IdentityError::RoleNotFound(name.clone()).into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService<UserResponse, UserSearchRequest, UserInsertRequest, UserUpdateRequest>
    for UserService
{
    async fn get(&self, search: UserSearchRequest) -> ServiceResult<PagedResponse<UserResponse>> {
        let filter = UserFilter {
            user_name: search.user_name.clone(),
            email: search.email.clone(),
            first_name: search.first_name.clone(),
            last_name: search.last_name.clone(),
            offset: search.offset(),
            limit: search.limit() as i64,
        };

        let (users, total) = self.users.search(&filter).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.to_response(user).await?);
        }

        Ok(PagedResponse {
            items,
            page: search.page(),
            limit: search.limit(),
            total,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> ServiceResult<UserResponse> {
        let user = self.find(id).await?;
        self.to_response(user).await
    }

    async fn insert(&self, request: UserInsertRequest) -> ServiceResult<UserResponse> {
        confirm_password(&request.password, &request.password_confirmation)?;
        self.ensure_roles_exist(&request.roles).await?;

        let user = self
            .users
            .create(
                NewUser {
                    user_name: request.user_name,
                    email: request.email,
                    first_name: request.first_name,
                    last_name: request.last_name,
                },
                &request.password,
            )
            .await?;

        self.users.add_to_roles(&user, &request.roles).await?;

        self.to_response(user).await
    }

    async fn update(&self, id: Uuid, request: UserUpdateRequest) -> ServiceResult<UserResponse> {
        let mut user = self.find(id).await?;

        if let Some(password) = &request.password {
            confirm_password(
                password,
                request.password_confirmation.as_deref().unwrap_or_default(),
            )?;
        }

        let roles = request.roles.unwrap_or_default();
        self.ensure_roles_exist(&roles).await?;

        if let Some(email) = request.email {
            user.email = email;
        }
        if let Some(first_name) = request.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = request.last_name {
            user.last_name = Some(last_name);
        }

        if let Some(password) = &request.password {
            self.users.apply_password(&mut user, password)?;
        }

        let user = self.users.update(user).await?;

        self.users.add_to_roles(&user, &roles).await?;
        info!("Updated user {}", user.id);

        self.to_response(user).await
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.users.delete(id).await?;
        Ok(())
    }
}
