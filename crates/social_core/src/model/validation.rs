//! Write-model validation errors and shared field rules.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.]{3,30}$").expect("valid username regex"));

/// Maximum accepted length for post captions, comments and messages.
pub const MAX_TEXT_CHARS: usize = 2_000;

/// Validation failures raised before any persistence call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Username does not match `^[a-z0-9_.]{3,30}$`.
    InvalidUsername(String),
    /// A required text field is blank after trimming.
    BlankText(&'static str),
    /// A text field exceeds [`MAX_TEXT_CHARS`].
    TextTooLong { field: &'static str, max_chars: usize },
    /// Comment/like must reference exactly one of post or story.
    AmbiguousTarget,
    /// Post has neither content nor media.
    EmptyPost,
    /// Tip amount must be strictly positive.
    NonPositiveAmount(i64),
    /// Counter or balance field is negative.
    NegativeCounter(&'static str),
    /// Story expiry must be after its creation time.
    InvalidExpiry { created_at: i64, expires_at: i64 },
    /// Sender and receiver are the same profile.
    SelfTarget(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`; expected 3-30 chars of a-z, 0-9, `_` or `.`"
            ),
            Self::BlankText(field) => write!(f, "{field} must not be blank"),
            Self::TextTooLong { field, max_chars } => {
                write!(f, "{field} exceeds {max_chars} characters")
            }
            Self::AmbiguousTarget => {
                write!(f, "target must reference exactly one of post or story")
            }
            Self::EmptyPost => write!(f, "post needs content or media"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "amount must be positive, got {amount}")
            }
            Self::NegativeCounter(field) => write!(f, "{field} must not be negative"),
            Self::InvalidExpiry {
                created_at,
                expires_at,
            } => write!(
                f,
                "expires_at {expires_at} must be after created_at {created_at}"
            ),
            Self::SelfTarget(action) => write!(f, "cannot {action} yourself"),
        }
    }
}

impl Error for ModelValidationError {}

/// Normalizes and validates a username.
///
/// Usernames are trimmed and lowercased before matching.
pub fn normalize_username(value: &str) -> Result<String, ModelValidationError> {
    let normalized = value.trim().to_lowercase();
    if USERNAME_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ModelValidationError::InvalidUsername(value.trim().to_string()))
    }
}

/// Requires non-blank text of bounded length.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankText(field));
    }
    check_text_len(field, value)
}

/// Bounds optional text length.
pub fn check_text_len(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(ModelValidationError::TextTooLong {
            field,
            max_chars: MAX_TEXT_CHARS,
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: i64,
) -> Result<(), ModelValidationError> {
    if value < 0 {
        Err(ModelValidationError::NegativeCounter(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_username, require_text, ModelValidationError, MAX_TEXT_CHARS};

    #[test]
    fn username_is_trimmed_and_lowercased() {
        assert_eq!(normalize_username("  Night.Owl_7 ").unwrap(), "night.owl_7");
    }

    #[test]
    fn username_rejects_short_and_symbolic_values() {
        assert!(matches!(
            normalize_username("ab"),
            Err(ModelValidationError::InvalidUsername(_))
        ));
        assert!(normalize_username("hello world").is_err());
        assert!(normalize_username("emoji🙂").is_err());
    }

    #[test]
    fn require_text_rejects_blank_and_oversized() {
        assert_eq!(
            require_text("content", "   "),
            Err(ModelValidationError::BlankText("content"))
        );
        let long = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(
            require_text("content", &long),
            Err(ModelValidationError::TextTooLong { .. })
        ));
    }
}
