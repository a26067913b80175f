//! Password sign-in

use std::sync::Arc;

use tracing::{info, warn};

use crate::models::User;

use super::{IdentityResult, UserManager};

/// Outcome of a sign-in attempt
#[derive(Debug, Clone)]
pub enum SignInResult {
    Succeeded(User),
    /// Credentials were valid but the account may not sign in yet
    NotAllowed,
    Failed,
}

/// Checks credentials and sign-in requirements
#[derive(Clone)]
pub struct SignInManager {
    users: Arc<UserManager>,
}

impl SignInManager {
    pub fn new(users: Arc<UserManager>) -> Self {
        Self { users }
    }

    /// Sign in with a user name or email and a password.
    ///
    /// The password is checked before the confirmation requirement, so an
    /// unconfirmed account is only reported as such to its owner.
    pub async fn password_sign_in(
        &self,
        user_name_or_email: &str,
        password: &str,
    ) -> IdentityResult<SignInResult> {
        let Some(user) = self.users.find_by_name_or_email(user_name_or_email).await? else {
            warn!("Sign-in failed: unknown user {}", user_name_or_email);
            return Ok(SignInResult::Failed);
        };

        if !self.users.check_password(&user, password).await? {
            warn!("Sign-in failed: bad password for user {}", user.id);
            return Ok(SignInResult::Failed);
        }

        if !self.can_sign_in(&user) {
            warn!("Sign-in refused: user {} has not confirmed their email", user.id);
            return Ok(SignInResult::NotAllowed);
        }

        info!("User {} signed in", user.id);
        Ok(SignInResult::Succeeded(user))
    }

    /// Whether the account satisfies the sign-in requirements
    pub fn can_sign_in(&self, user: &User) -> bool {
        !self.users.options().sign_in.require_confirmed_account || user.email_confirmed
    }
}
