//! Field rules shared by registration, profile updates and password reset.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::resource::{ValidationErrorKind, ValidationFieldError};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("Expect a valid email regex");
    static ref PHONE: Regex = Regex::new(r"^\+?[\d\s-]{10,15}$").expect("Expect a valid phone regex");
    static ref LETTER: Regex = Regex::new(r"[A-Za-z]").expect("Expect a valid letter regex");
    static ref DIGIT: Regex = Regex::new(r"\d").expect("Expect a valid digit regex");
}

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 100;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;

type FieldResult = Result<(), ValidationFieldError>;

pub fn name(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err(ValidationFieldError::required("name", "Name is required"));
    }
    if value.trim().chars().count() < NAME_MIN_LENGTH {
        return Err(ValidationFieldError::new(
            "name",
            value,
            vec![ValidationErrorKind::MinLength(NAME_MIN_LENGTH as u64)],
            "Name must be at least 2 characters",
        ));
    }
    if value.chars().count() > NAME_MAX_LENGTH {
        return Err(ValidationFieldError::new(
            "name",
            value,
            vec![ValidationErrorKind::MaxLength(NAME_MAX_LENGTH as u64)],
            "Name is too long",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err(ValidationFieldError::required("email", "Email is required"));
    }
    if !EMAIL.is_match(value) {
        return Err(ValidationFieldError::new(
            "email",
            value,
            vec![ValidationErrorKind::Pattern("email".into())],
            "Invalid email address",
        ));
    }
    Ok(())
}

/// Password strength. The value is never echoed back in the error.
pub fn password(path: &str, value: &str) -> FieldResult {
    let length = value.chars().count();
    let (kind, message) = if length < PASSWORD_MIN_LENGTH {
        (
            ValidationErrorKind::MinLength(PASSWORD_MIN_LENGTH as u64),
            "Password must be at least 8 characters long",
        )
    } else if length > PASSWORD_MAX_LENGTH {
        (
            ValidationErrorKind::MaxLength(PASSWORD_MAX_LENGTH as u64),
            "Password is too long",
        )
    } else if !LETTER.is_match(value) {
        (
            ValidationErrorKind::Pattern("letter".into()),
            "Password must contain at least one letter",
        )
    } else if !DIGIT.is_match(value) {
        (
            ValidationErrorKind::Pattern("digit".into()),
            "Password must contain at least one number",
        )
    } else {
        return Ok(());
    };

    Err(ValidationFieldError::new(path, "", vec![kind], message))
}

/// Phone numbers are matched once spaces and dashes are removed.
pub fn phone(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err(ValidationFieldError::required("phone", "Phone number is required"));
    }
    let compact: String = value.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if !PHONE.is_match(&compact) {
        return Err(ValidationFieldError::new(
            "phone",
            value,
            vec![ValidationErrorKind::Pattern("phone".into())],
            "Invalid phone number format",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn message(result: FieldResult) -> String {
        result.unwrap_err().message
    }

    #[test]
    fn name_rules() {
        assert!(name("Asha").is_ok());
        assert_eq!(message(name("")), "Name is required");
        assert_eq!(message(name("  a  ")), "Name must be at least 2 characters");
        assert_eq!(message(name(&"a".repeat(101))), "Name is too long");
    }

    #[test]
    fn email_rules() {
        assert!(email("chef@test.com").is_ok());
        assert!(email("first.last+tag@kitchen.co.uk").is_ok());
        assert_eq!(message(email("")), "Email is required");
        assert_eq!(message(email("chef@")), "Invalid email address");
        assert_eq!(message(email("chef.test.com")), "Invalid email address");
        assert_eq!(message(email("chef@localhost")), "Invalid email address");
    }

    #[test]
    fn password_rules() {
        assert!(password("password", "secret123").is_ok());
        assert_eq!(
            message(password("password", "abc12")),
            "Password must be at least 8 characters long"
        );
        assert_eq!(
            message(password("password", &format!("a1{}", "x".repeat(127)))),
            "Password is too long"
        );
        assert_eq!(
            message(password("password", "12345678")),
            "Password must contain at least one letter"
        );
        assert_eq!(
            message(password("password", "abcdefgh")),
            "Password must contain at least one number"
        );
    }

    #[test]
    fn password_error_hides_value() {
        let err = password("new_password", "short1").unwrap_err();
        assert_eq!(err.path, "/new_password");
        assert_eq!(err.value, "");
    }

    #[test]
    fn phone_rules() {
        assert!(phone("+44 7700 900123").is_ok());
        assert!(phone("07700-900-123").is_ok());
        assert_eq!(message(phone("")), "Phone number is required");
        assert_eq!(message(phone("12345")), "Invalid phone number format");
        assert_eq!(message(phone("call me maybe")), "Invalid phone number format");
    }
}
