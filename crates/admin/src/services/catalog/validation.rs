//! Form validation shared by every record kind.
//!
//! A [`Validator`] collects every field error of a submission before the
//! caller decides anything, so the form can highlight all invalid fields at
//! once.

use std::str::FromStr;

use serde::Serialize;

/// Maximum length of names and titles.
pub const MAX_NAME_LEN: usize = 100;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name.
    pub field: &'static str,
    /// Message shown next to the field.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Raw form input that can be echoed back into an HTML form.
pub trait FormValues: Sized {
    /// Copy with every value HTML-escaped for re-display.
    #[must_use]
    fn escaped(&self) -> Self;
}

/// Escape a value for safe inclusion in HTML text or attribute values.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Collects field errors across a whole submission.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed value of a required text field.
    ///
    /// Records `message` when the trimmed value is empty, and a length
    /// error when `max_len` is exceeded.
    pub fn required_text(
        &mut self,
        field: &'static str,
        value: &str,
        message: &str,
        max_len: Option<usize>,
    ) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, message);
        } else if let Some(max) = max_len {
            if trimmed.chars().count() > max {
                self.push(field, format!("Must be at most {max} characters"));
            }
        }
        trimmed.to_string()
    }

    /// Records `message` unless `value` is non-empty and only ASCII letters
    /// and digits.
    ///
    /// Empty values are left to [`Self::required_text`].
    pub fn alphanumeric(&mut self, field: &'static str, value: &str, message: &str) {
        if !value.is_empty() && !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.push(field, message);
        }
    }

    /// Parse a required value (integer, price, id, ...).
    ///
    /// Records `missing` when blank and `invalid` when unparseable.
    pub fn parse<T: FromStr>(
        &mut self,
        field: &'static str,
        value: &str,
        missing: &str,
        invalid: &str,
    ) -> Option<T> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, missing);
            return None;
        }
        match trimmed.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.push(field, invalid);
                None
            }
        }
    }

    /// Whether no error has been recorded so far.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// All recorded errors, in the order they were found.
    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}
