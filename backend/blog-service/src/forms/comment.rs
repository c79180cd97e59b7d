use serde::Deserialize;

use super::{FormErrors, REQUIRED};
use crate::models::{Comment, CommentDraft};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "csrfmiddlewaretoken", default)]
    pub csrf_token: String,
}

impl CommentForm {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            text: comment.text.clone(),
            csrf_token: String::new(),
        }
    }

    pub fn clean(&self) -> Result<CommentDraft, FormErrors> {
        let text = self.text.trim();
        let mut errors = FormErrors::new();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(|| CommentDraft {
            text: text.to_string(),
        })
    }
}
