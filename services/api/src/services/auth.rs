//! Authentication service: registration, confirmation, and token issuance

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
    contracts::{
        AuthResponse, ConfirmEmailRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
        RegisterResponse, UserResponse,
    },
    identity::{NewUser, SignInManager, SignInResult, UserManager},
    jwt::{JwtService, TokenType},
    models::User,
};

use super::{ServiceError, ServiceResult, confirm_password};

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account; it may need confirming before sign-in
    async fn register(&self, request: RegisterRequest) -> ServiceResult<RegisterResponse>;

    async fn confirm_email(&self, request: ConfirmEmailRequest) -> ServiceResult<UserResponse>;

    /// Exchange credentials for an access/refresh token pair
    async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse>;

    /// Exchange a refresh token for a new token pair
    async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse>;
}

/// `AuthService` backed by the identity subsystem
pub struct IdentityAuthService {
    users: Arc<UserManager>,
    sign_in: Arc<SignInManager>,
    jwt_service: Arc<JwtService>,
}

impl IdentityAuthService {
    pub fn new(
        users: Arc<UserManager>,
        sign_in: Arc<SignInManager>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            sign_in,
            jwt_service,
        }
    }

    async fn issue_tokens(&self, user: &User) -> ServiceResult<AuthResponse> {
        let roles = self.users.get_roles(user).await?;

        let access_token = self
            .jwt_service
            .generate_access_token(user, &roles)
            .map_err(|e| {
                error!("Failed to generate access token: {}", e);
                ServiceError::Internal("Failed to generate access token".to_string())
            })?;

        let refresh_token = self.jwt_service.generate_refresh_token(user).map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ServiceError::Internal("Failed to generate refresh token".to_string())
        })?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expiry(),
            refresh_expires_in: self.jwt_service.refresh_token_expiry(),
        })
    }
}

#[async_trait]
impl AuthService for IdentityAuthService {
    async fn register(&self, request: RegisterRequest) -> ServiceResult<RegisterResponse> {
        info!("Registration request for user: {}", request.user_name);
        confirm_password(&request.password, &request.password_confirmation)?;

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

        let confirmation_required = !self.sign_in.can_sign_in(&user);
        let confirmation_token = user.email_confirmation_token.clone();

        Ok(RegisterResponse {
            user: UserResponse::from_user(user, vec![]),
            confirmation_required,
            confirmation_token,
        })
    }

    async fn confirm_email(&self, request: ConfirmEmailRequest) -> ServiceResult<UserResponse> {
        let user = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let user = self.users.confirm_email(user, &request.token).await?;
        let roles = self.users.get_roles(&user).await?;

        Ok(UserResponse::from_user(user, roles))
    }

    async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        info!("Login attempt for user: {}", request.user_name_or_email);

        match self
            .sign_in
            .password_sign_in(&request.user_name_or_email, &request.password)
            .await?
        {
            SignInResult::Succeeded(user) => self.issue_tokens(&user).await,
            SignInResult::NotAllowed => Err(ServiceError::NotAllowed(
                "Email address has not been confirmed".to_string(),
            )),
            SignInResult::Failed => Err(ServiceError::Unauthorized),
        }
    }

    async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse> {
        info!("Token refresh request");

        let claims = self
            .jwt_service
            .validate_token(&request.refresh_token)
            .map_err(|_| ServiceError::Unauthorized)?;

        if claims.token_type != TokenType::Refresh {
            return Err(ServiceError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        if claims.stamp.as_deref() != Some(user.security_stamp.as_str()) {
            warn!("Rejected stale refresh token for user {}", user.id);
            return Err(ServiceError::Unauthorized);
        }

        if !self.sign_in.can_sign_in(&user) {
            return Err(ServiceError::NotAllowed(
                "Email address has not been confirmed".to_string(),
            ));
        }

        self.issue_tokens(&user).await
    }
}
