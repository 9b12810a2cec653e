use regex::Regex;
use std::sync::OnceLock;

use super::error::ServiceError;

pub const NAME_MAX_LEN: usize = 50;
pub const CONTENT_MAX_LEN: usize = 140;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Conservative email shape: local part of word chars / `+` / `-` / `.`,
/// dot-separated domain labels, alphabetic TLD. Double dots in the domain
/// do not match.
fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[\w+\-.]+@[a-z\d\-]+(\.[a-z\d\-]+)*\.[a-z]+$")
            .expect("email regex is valid")
    })
}

pub fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation("Name can't be blank".to_string()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(ServiceError::Validation(format!(
            "Name is too long (maximum is {NAME_MAX_LEN} characters)"
        )));
    }
    Ok(())
}

/// Canonical storage form: trimmed and lower-cased. Uniqueness checks and
/// lookups go through this, which is what makes email case-insensitive.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), ServiceError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ServiceError::Validation("Email can't be blank".to_string()));
    }
    if !email_regex().is_match(email) {
        return Err(ServiceError::Validation("Email is invalid".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Password can't be blank".to_string(),
        ));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ServiceError::Validation(format!(
            "Password is too short (minimum is {PASSWORD_MIN_LEN} characters)"
        )));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), ServiceError> {
    if content.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Content can't be blank".to_string(),
        ));
    }
    if content.chars().count() > CONTENT_MAX_LEN {
        return Err(ServiceError::Validation(format!(
            "Content is too long (maximum is {CONTENT_MAX_LEN} characters)"
        )));
    }
    Ok(())
}
