//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use super::options::PasswordOptions;

/// Validate user name
pub fn validate_user_name(user_name: &str) -> Result<(), String> {
    if user_name.is_empty() {
        return Err("User name is required".to_string());
    }

    if user_name.len() < 3 {
        return Err("User name must be at least 3 characters long".to_string());
    }

    if user_name.len() > 32 {
        return Err("User name must be at most 32 characters long".to_string());
    }

    static USER_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USER_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.\-]+$").expect("Failed to compile user name regex")
    });

    if !regex.is_match(user_name) {
        return Err(
            "User name can only contain letters, numbers, dots, dashes, and underscores"
                .to_string(),
        );
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate role name
pub fn validate_role_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Role name is required".to_string());
    }

    if name.len() > 64 {
        return Err("Role name must be at most 64 characters long".to_string());
    }

    Ok(())
}

/// Validate an optional personal name such as a first or last name
pub fn validate_person_name(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(value) if value.chars().count() > 100 => {
            Err(format!("{} must be at most 100 characters long", field))
        }
        _ => Ok(()),
    }
}

/// Validate password against the configured policy
pub fn validate_password(password: &str, options: &PasswordOptions) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < options.required_length {
        return Err(format!(
            "Password must be at least {} characters long",
            options.required_length
        ));
    }

    if password.chars().count() > options.max_length {
        return Err(format!(
            "Password must be at most {} characters long",
            options.max_length
        ));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if options.require_uppercase && !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if options.require_lowercase && !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if options.require_digit && !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if options.require_non_alphanumeric && !has_special {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
