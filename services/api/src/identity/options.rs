//! Identity options

/// Options for the identity subsystem
#[derive(Debug, Clone, Default)]
pub struct IdentityOptions {
    pub sign_in: SignInOptions,
    pub password: PasswordOptions,
    pub user: UserOptions,
}

/// Sign-in requirements
#[derive(Debug, Clone, Default)]
pub struct SignInOptions {
    /// Refuse sign-in until the account's email address is confirmed
    pub require_confirmed_account: bool,
}

/// Password policy
#[derive(Debug, Clone)]
pub struct PasswordOptions {
    pub required_length: usize,
    pub max_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            required_length: 8,
            max_length: 128,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

/// User account constraints
#[derive(Debug, Clone)]
pub struct UserOptions {
    pub require_unique_email: bool,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            require_unique_email: true,
        }
    }
}
