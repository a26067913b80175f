//! HTTP routes for the template API

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use common::database::TemplateContext;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    contracts::{
        ConfirmEmailRequest, CreateRoleRequest, LoginRequest, RefreshTokenRequest,
        RegisterRequest, RoleResponse, UserInsertRequest, UserSearchRequest, UserUpdateRequest,
    },
    error::{ApiError, ApiResult},
    identity::RoleManager,
    middleware::{AuthUser, RequestScope, auth_middleware, scope_middleware},
    services::{AuthService, ServiceError, UserCrudService},
    state::AppState,
};

/// Role required to manage users and roles
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

impl AuthUser {
    fn require_role(&self, role: &str) -> ApiResult<()> {
        if self.roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Requires the {} role", role)))
        }
    }
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/identity/me", get(me))
        .route("/api/v1/users", get(get_users).post(create_user))
        .route(
            "/api/v1/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/v1/roles", get(get_roles).post(create_role))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/api/v1/identity/register", post(register))
        .route("/api/v1/identity/confirm-email", post(confirm_email))
        .route("/api/v1/identity/login", post(login))
        .route("/api/v1/identity/refresh", post(refresh_token))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), scope_middleware))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "template-api"
    }))
}

/// Readiness endpoint; reports whether the database answers
pub async fn readiness_check(scope: RequestScope) -> ApiResult<impl IntoResponse> {
    let context = scope.resolve::<TemplateContext>()?;

    let database_up = match context.health_check().await {
        Ok(up) => up,
        Err(e) => {
            error!("Database health check failed: {}", e);
            false
        }
    };

    let (status, body) = if database_up {
        (StatusCode::OK, json!({ "status": "ok", "database": "up" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "status": "degraded", "database": "down" }),
        )
    };

    Ok((status, Json(body)))
}

pub async fn register(
    scope: RequestScope,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = scope.resolve::<dyn AuthService>()?;
    let response = auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn confirm_email(
    scope: RequestScope,
    Json(payload): Json<ConfirmEmailRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = scope.resolve::<dyn AuthService>()?;
    Ok(Json(auth.confirm_email(payload).await?))
}

pub async fn login(
    scope: RequestScope,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = scope.resolve::<dyn AuthService>()?;
    Ok(Json(auth.login(payload).await?))
}

pub async fn refresh_token(
    scope: RequestScope,
    Json(payload): Json<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = scope.resolve::<dyn AuthService>()?;
    Ok(Json(auth.refresh(payload).await?))
}

/// Claims of the authenticated caller
pub async fn me(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(user)
}

pub async fn get_users(
    scope: RequestScope,
    Query(search): Query<UserSearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let users = scope.resolve::<UserCrudService>()?;
    Ok(Json(users.get(search).await?))
}

pub async fn get_user(scope: RequestScope, Path(id): Path<Uuid>) -> ApiResult<impl IntoResponse> {
    let users = scope.resolve::<UserCrudService>()?;
    Ok(Json(users.get_by_id(id).await?))
}

pub async fn create_user(
    scope: RequestScope,
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<UserInsertRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(ADMINISTRATOR_ROLE)?;

    let users = scope.resolve::<UserCrudService>()?;
    let user = users.insert(payload).await?;
    info!("User {} created user {}", caller.id, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    scope: RequestScope,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    if caller.id != id {
        caller.require_role(ADMINISTRATOR_ROLE)?;
    }
    if payload.roles.as_ref().is_some_and(|roles| !roles.is_empty()) {
        caller.require_role(ADMINISTRATOR_ROLE)?;
    }

    let users = scope.resolve::<UserCrudService>()?;
    Ok(Json(users.update(id, payload).await?))
}

pub async fn delete_user(
    scope: RequestScope,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(ADMINISTRATOR_ROLE)?;

    let users = scope.resolve::<UserCrudService>()?;
    users.delete(id).await?;
    info!("User {} deleted user {}", caller.id, id);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_roles(scope: RequestScope) -> ApiResult<impl IntoResponse> {
    let roles = scope.resolve::<RoleManager>()?;
    let roles = roles.list().await.map_err(ServiceError::from)?;

    Ok(Json(
        roles
            .into_iter()
            .map(RoleResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_role(
    scope: RequestScope,
    Extension(caller): Extension<AuthUser>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.require_role(ADMINISTRATOR_ROLE)?;

    let roles = scope.resolve::<RoleManager>()?;
    let role = roles.create(&payload.name).await.map_err(ServiceError::from)?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}
