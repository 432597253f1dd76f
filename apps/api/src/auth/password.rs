//! Password hashing and rule validation. Hashes are bcrypt and are never
//! serialized back out of the model layer.

use bcrypt::DEFAULT_COST;

use crate::errors::AppError;

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plain, DEFAULT_COST)?)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(plain, hashed)?)
}

/// Checks a candidate password against the account rules and returns one
/// message per failed rule, empty when the password is acceptable.
///
/// Rules: 8-50 characters, at least one uppercase letter, one lowercase
/// letter, one digit, and no spaces.
pub fn failed_password_rules(password: &str) -> Vec<&'static str> {
    let mut failed = Vec::new();

    if password.chars().count() < 8 {
        failed.push("Password must be at least 8 characters long");
    }
    if password.chars().count() > 50 {
        failed.push("Password must be no more than 50 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failed.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failed.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failed.push("Password must contain at least one digit");
    }
    if password.contains(' ') {
        failed.push("Password must not contain spaces");
    }

    failed
}

/// Convenience wrapper turning failed rules into a validation error whose
/// message is prefixed `Invalid password:`.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let failed = failed_password_rules(password);
    if failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid password: {}",
            failed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptable_password_passes() {
        assert!(failed_password_rules("Str0ngPass").is_empty());
        assert!(validate_password("Str0ngPass").is_ok());
    }

    #[test]
    fn short_password_fails_with_message() {
        let failed = failed_password_rules("Ab1");
        assert!(failed.contains(&"Password must be at least 8 characters long"));
    }

    #[test]
    fn missing_character_classes_each_report() {
        let failed = failed_password_rules("alllowercase1");
        assert_eq!(
            failed,
            vec!["Password must contain at least one uppercase letter"]
        );

        let failed = failed_password_rules("ALLUPPERCASE1");
        assert_eq!(
            failed,
            vec!["Password must contain at least one lowercase letter"]
        );
    }

    #[test]
    fn validation_error_carries_invalid_password_prefix() {
        let err = validate_password("Short1").unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(
                msg,
                "Invalid password: Password must be at least 8 characters long"
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn spaces_are_rejected() {
        let failed = failed_password_rules("Has Spaces1");
        assert!(failed.contains(&"Password must not contain spaces"));
    }

    #[test]
    fn overlong_password_fails() {
        let long = format!("Aa1{}", "x".repeat(60));
        let failed = failed_password_rules(&long);
        assert!(failed.contains(&"Password must be no more than 50 characters long"));
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hashed = hash_password("Str0ngPass").unwrap();
        assert!(verify_password("Str0ngPass", &hashed).unwrap());
        assert!(!verify_password("WrongPass1", &hashed).unwrap());
    }
}
