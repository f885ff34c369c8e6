//! Input validation predicates.
//!
//! These run on the client before a request is sent and again on the server
//! before anything is written. Lengths are counted in characters, not bytes,
//! after trimming surrounding whitespace.

use thiserror::Error;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length (Argon2 input stays bounded).
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Lowest star rating a review may carry.
pub const MIN_RATING: i16 = 1;
/// Highest star rating a review may carry.
pub const MAX_RATING: i16 = 5;
/// Shortest accepted review comment.
pub const MIN_COMMENT_LENGTH: usize = 10;
/// Longest accepted review comment.
pub const MAX_COMMENT_LENGTH: usize = 500;
/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;
/// Longest accepted chat message.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// A rejected input value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text length outside the accepted range.
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    /// Number outside the accepted range.
    #[error("{field} must be between {min} and {max}")]
    Range {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value present but unacceptable for another reason.
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Password rules that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must be at most 128 characters")]
    TooLong,
    #[error("password must contain at least one letter")]
    MissingLetter,
    #[error("password must contain at least one digit")]
    MissingDigit,
}

/// Check a password against the strength rules.
///
/// Rules are checked in order and the first failure is returned.
///
/// # Errors
///
/// Returns the first [`PasswordError`] the password violates.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(PasswordError::MissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    Ok(())
}

/// Check a review rating is within 1..=5.
///
/// # Errors
///
/// Returns [`ValidationError::Range`] for anything outside the bounds.
pub fn validate_rating(rating: i16) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::Range {
            field: "rating",
            min: MIN_RATING.into(),
            max: MAX_RATING.into(),
        })
    }
}

/// Check a review comment is 10..=500 characters once trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::Length`] when the comment is too short or long.
pub fn validate_review_comment(comment: &str) -> Result<(), ValidationError> {
    require_length("comment", comment, MIN_COMMENT_LENGTH, MAX_COMMENT_LENGTH)
}

/// Check a display name is 2..=50 characters once trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::Length`] when the name is out of bounds.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    require_length("display_name", name, 2, 50)
}

/// Check a cart line quantity is 1..=99.
///
/// # Errors
///
/// Returns [`ValidationError::Range`] when the quantity is out of bounds.
pub fn validate_quantity(quantity: u32) -> Result<(), ValidationError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(ValidationError::Range {
            field: "quantity",
            min: 1,
            max: MAX_LINE_QUANTITY.into(),
        })
    }
}

/// Check a chat message is non-blank and at most 2000 characters.
///
/// # Errors
///
/// Returns [`ValidationError::Length`] when the text is blank or too long.
pub fn validate_message_text(text: &str) -> Result<(), ValidationError> {
    require_length("text", text, 1, MAX_MESSAGE_LENGTH)
}

/// Require the trimmed character count of `value` to be within `min..=max`.
///
/// # Errors
///
/// Returns [`ValidationError::Length`] naming `field` otherwise.
pub fn require_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Length { field, min, max })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(validate_password("abc1"), Err(PasswordError::TooShort));
        assert_eq!(validate_password("12345678"), Err(PasswordError::MissingLetter));
        assert_eq!(validate_password("abcdefgh"), Err(PasswordError::MissingDigit));
        assert_eq!(
            validate_password(&"a1".repeat(65)),
            Err(PasswordError::TooLong)
        );
        assert_eq!(validate_password("woodgrain9"), Ok(()));
    }

    #[test]
    fn test_password_length_boundary() {
        assert_eq!(validate_password("abcdef1"), Err(PasswordError::TooShort));
        assert_eq!(validate_password("abcdefg1"), Ok(()));
        assert_eq!(validate_password(&format!("{}1", "a".repeat(127))), Ok(()));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }

    #[test]
    fn test_comment_length_boundaries() {
        assert!(validate_review_comment(&"x".repeat(9)).is_err());
        assert!(validate_review_comment(&"x".repeat(10)).is_ok());
        assert!(validate_review_comment(&"x".repeat(500)).is_ok());
        assert!(validate_review_comment(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_comment_length_ignores_surrounding_whitespace() {
        let padded = format!("   {}   ", "x".repeat(9));
        assert!(validate_review_comment(&padded).is_err());
    }

    #[test]
    fn test_comment_length_counts_characters() {
        // 10 characters, 20 bytes
        assert!(validate_review_comment(&"ü".repeat(10)).is_ok());
        assert!(validate_review_comment(&"ü".repeat(501)).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(99).is_ok());
        assert!(validate_quantity(100).is_err());
    }

    #[test]
    fn test_message_text() {
        assert!(validate_message_text("  ").is_err());
        assert!(validate_message_text("hi").is_ok());
        assert!(validate_message_text(&"m".repeat(2001)).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = validate_rating(9).unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5");

        let err = validate_display_name("a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "display_name must be between 2 and 50 characters"
        );
    }
}
