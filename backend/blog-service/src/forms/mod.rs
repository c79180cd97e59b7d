/// Form input for post and comment mutations
///
/// Forms deserialize from urlencoded bodies with every field optional, then
/// `clean()` turns them into a draft or a set of field errors. Cleaning never
/// touches storage; the caller passes in whatever choices it needs.
pub mod comment;
pub mod post;

pub use comment::CommentForm;
pub use post::{PostChoices, PostForm};

use serde::Deserialize;
use std::collections::BTreeMap;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name → messages, in field-name order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Fold `validator` output in, keeping the declared messages.
    pub fn extend_from(&mut self, errors: &validator::ValidationErrors) {
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                self.add(&field.to_string(), message);
            }
        }
    }

    pub(crate) fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Body of delete confirmations: nothing but the CSRF token.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(rename = "csrfmiddlewaretoken", default)]
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_group_by_field() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());

        errors.add("title", REQUIRED);
        errors.add("title", "too long");
        errors.add("category", INVALID_CHOICE);

        assert_eq!(errors.field("title").len(), 2);
        assert_eq!(errors.field("text"), &[] as &[String]);
        let fields: Vec<_> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["category", "title"]);
    }
}
