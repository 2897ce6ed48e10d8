//! Request-body validation shared by the handler tiers. Every check runs before
//! any service call, so a rejected request never mutates the store.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::error::ApiError;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Collects per-field problems, reported together as one validation error
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| problem.into());
    }

    /// Non-blank and at most `max` characters.
    pub fn required(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(field, "must not be empty");
        } else if value.chars().count() > max {
            self.add(field, format!("must be at most {} characters", max));
        }
    }

    /// Like [`FieldErrors::required`] but only when the field was sent.
    pub fn required_if_present(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.required(field, value, max);
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(field, format!("must be at most {} characters", max));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid request body", Some(self.errors)))
        }
    }
}

/// 3-32 characters of ASCII letters, digits and underscores.
pub fn is_valid_username(username: &str) -> bool {
    (3..=32).contains(&username.len()) && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Minimal shape check: one `@` with text on both sides and a dot in the domain.
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Trimmed, `None` when blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        summary: Option<Option<String>>,
    }

    #[test]
    fn double_option_separates_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.summary, None);

        let null: Patch = serde_json::from_str(r#"{"summary": null}"#).unwrap();
        assert_eq!(null.summary, Some(None));

        let set: Patch = serde_json::from_str(r#"{"summary": "x"}"#).unwrap();
        assert_eq!(set.summary, Some(Some("x".to_string())));
    }

    #[test]
    fn field_errors_keep_first_problem() {
        let mut errors = FieldErrors::new();
        errors.required("title", "   ", 10);
        errors.required("body", "ok", 10);
        errors.add("title", "second problem");
        assert!(!errors.is_empty());

        let body = errors.finish().unwrap_err().to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["title"], "must not be empty");
        assert!(body["field_errors"].get("body").is_none());
    }

    #[test]
    fn length_is_counted_in_characters() {
        let mut errors = FieldErrors::new();
        errors.required("name", "ééé", 3);
        assert!(errors.finish().is_ok());
    }

    #[test]
    fn usernames() {
        assert!(is_valid_username("jane_doe"));
        assert!(!is_valid_username("jo"));
        assert!(!is_valid_username("jane doe"));
        assert!(!is_valid_username(&"x".repeat(33)));
    }

    #[test]
    fn emails() {
        assert!(is_plausible_email("a@example.com"));
        assert!(!is_plausible_email("example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a@b@c.com"));
    }
}
