//! Input validation rules for registration, login and password changes.
//!
//! The functions returning [`ValidationError`] plug into `validator`'s
//! `custom(function = ...)` attribute on request DTOs. [`check_password_strength`]
//! is the plain variant they wrap.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum display name length in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Character classes a password must each match at least once.
static PASSWORD_CLASSES: LazyLock<[(Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (class(r"[A-Z]"), "an uppercase letter"),
        (class(r"[a-z]"), "a lowercase letter"),
        (class(r"[0-9]"), "a digit"),
        (class(r"[!@#$%^&*]"), "one of !@#$%^&*"),
    ]
});

fn class(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid password class {pattern}: {e}"))
}

/// Check password strength, returning a human-readable reason on failure.
pub fn check_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    for (re, label) in PASSWORD_CLASSES.iter() {
        if !re.is_match(password) {
            return Err(format!("Password must contain {label}"));
        }
    }
    Ok(())
}

/// `validator` adapter for [`check_password_strength`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_password_strength(password)
        .map_err(|msg| ValidationError::new("password_strength").with_message(Cow::Owned(msg)))
}

/// `validator` adapter rejecting blank display names.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("name_blank").with_message("Name is required".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new("name_length").with_message(Cow::Owned(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(check_password_strength("Str0ng!Pass").is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        let msg = check_password_strength("S0!a").unwrap_err();
        assert!(msg.contains("at least 8 characters"));
    }

    #[test]
    fn each_character_class_is_required() {
        assert!(check_password_strength("str0ng!pass")
            .unwrap_err()
            .contains("uppercase"));
        assert!(check_password_strength("STR0NG!PASS")
            .unwrap_err()
            .contains("lowercase"));
        assert!(check_password_strength("Strong!Pass")
            .unwrap_err()
            .contains("digit"));
        assert!(check_password_strength("Str0ngPass")
            .unwrap_err()
            .contains("!@#$%^&*"));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(validate_name("Alice").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn password_adapter_carries_message() {
        let err = validate_password("weak").unwrap_err();
        assert_eq!(err.code, "password_strength");
        assert!(err.message.is_some());
    }
}
