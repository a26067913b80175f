//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 using the configured secret. Access tokens
//! carry the user's name and roles; refresh tokens carry the security stamp
//! so that a credential change invalidates outstanding refresh tokens.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use common::config::JwtSettings;

use crate::models::User;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User name
    pub name: String,
    /// User roles
    pub roles: Vec<String>,
    /// Security stamp at issue time (refresh tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
    /// Issuer
    pub iss: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    settings: JwtSettings,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(settings: &JwtSettings) -> Result<Self> {
        let secret = settings
            .secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow::anyhow!("jwt.secret is not configured"))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[settings.issuer.as_str()]);

        Ok(JwtService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            settings: settings.clone(),
        })
    }

    fn now() -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs())
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User, roles: &[String]) -> Result<String> {
        let now = Self::now()?;

        self.sign(&Claims {
            sub: user.id,
            name: user.user_name.clone(),
            roles: roles.to_vec(),
            stamp: None,
            iss: self.settings.issuer.clone(),
            iat: now,
            exp: now + self.settings.access_token_expiry,
            token_type: TokenType::Access,
        })
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        let now = Self::now()?;

        self.sign(&Claims {
            sub: user.id,
            name: user.user_name.clone(),
            roles: vec![],
            stamp: Some(user.security_stamp.clone()),
            iss: self.settings.issuer.clone(),
            iat: now,
            exp: now + self.settings.refresh_token_expiry,
            token_type: TokenType::Refresh,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.settings.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.settings.refresh_token_expiry
    }
}
