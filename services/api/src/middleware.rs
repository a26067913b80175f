//! Request scoping and JWT authentication middleware

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use common::container::ServiceScope;

use crate::{
    error::{ApiError, ApiResult},
    jwt::{JwtService, TokenType},
    state::AppState,
};

/// Service scope owned by the current request
#[derive(Clone, Debug)]
pub struct RequestScope(pub ServiceScope);

impl RequestScope {
    /// Resolve a service from the request's scope
    pub fn resolve<T>(&self) -> ApiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Ok(self.0.resolve::<T>()?)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestScope>().cloned().ok_or_else(|| {
            error!("Request reached a handler without a service scope");
            ApiError::InternalServerError
        })
    }
}

/// Authenticated caller, taken from a validated access token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub user_name: String,
    pub roles: Vec<String>,
}

/// Open a service scope for the lifetime of the request
pub async fn scope_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let scope = state.services.create_scope();
    debug!("Opened scope {} for {} {}", scope.id(), req.method(), req.uri());

    req.extensions_mut().insert(RequestScope(scope));
    next.run(req).await
}

/// Extract and validate the bearer access token
pub async fn auth_middleware(
    scope: RequestScope,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let jwt_service = scope.resolve::<JwtService>()?;
    let claims = jwt_service.validate_token(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        user_name: claims.name,
        roles: claims.roles,
    });

    Ok(next.run(req).await)
}
