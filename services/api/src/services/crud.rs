//! Generic create/read/update/delete capability

use async_trait::async_trait;
use uuid::Uuid;

use crate::contracts::{
    PagedResponse, UserInsertRequest, UserResponse, UserSearchRequest, UserUpdateRequest,
};

use super::ServiceResult;

/// CRUD operations over one resource, described by its contract types
#[async_trait]
pub trait CrudService<TResponse, TSearch, TInsert, TUpdate>: Send + Sync {
    /// One page of resources matching `search`
    async fn get(&self, search: TSearch) -> ServiceResult<PagedResponse<TResponse>>;

    async fn get_by_id(&self, id: Uuid) -> ServiceResult<TResponse>;

    async fn insert(&self, request: TInsert) -> ServiceResult<TResponse>;

    async fn update(&self, id: Uuid, request: TUpdate) -> ServiceResult<TResponse>;

    async fn delete(&self, id: Uuid) -> ServiceResult<()>;
}

/// The CRUD capability for users, as registered in the container
pub type UserCrudService =
    dyn CrudService<UserResponse, UserSearchRequest, UserInsertRequest, UserUpdateRequest>;
