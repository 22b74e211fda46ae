//! Field-by-field input checks
//!
//! Checks accumulate into one [`AppError::InvalidFields`] so a form reports
//! every problem at once.

use crate::error::{AppError, FieldErrors};

#[derive(Debug, Default)]
pub struct FieldCheck {
    errors: FieldErrors,
}

/// True for absolute http(s) URLs.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; the first message per field wins.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn require(&mut self, field: &str, ok: bool, message: &str) {
        if !ok {
            self.fail(field, message);
        }
    }

    /// Character count within `min..=max` after trimming.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            self.fail(field, format!("Must be at least {min} characters"));
        } else if len > max {
            self.fail(field, format!("Must be at most {max} characters"));
        }
    }

    pub fn url(&mut self, field: &str, value: &str) {
        if !is_url(value) {
            self.fail(field, "Must be a valid URL");
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_field() {
        let mut check = FieldCheck::new();
        check.length("title", "a", 2, 100);
        check.url("image", "not a url");
        check.url("videoUrl", "https://cdn.example.com/v.mp4");

        match check.finish() {
            Err(AppError::InvalidFields(fields)) => {
                assert_eq!(fields.len(), 2);
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("image"));
            }
            other => panic!("expected invalid fields, got {other:?}"),
        }
    }

    #[test]
    fn url_requires_http_scheme_and_host() {
        assert!(is_url("https://cdn.example.com/a.jpg"));
        assert!(is_url("http://localhost:9000/a.jpg"));
        assert!(!is_url("ftp://cdn.example.com/a.jpg"));
        assert!(!is_url("/relative/path.jpg"));
        assert!(!is_url(""));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut check = FieldCheck::new();
        check.length("title", "éé", 2, 2);
        assert!(check.finish().is_ok());
    }
}
