use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::Deserialize;
use validator::Validate;

use super::{FormErrors, INVALID_CHOICE, REQUIRED};
use crate::models::{Category, Location, Post, PostDraft};

/// Format used to pre-populate `datetime-local` inputs.
pub const PUB_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Categories and locations a post may reference.
#[derive(Debug, Clone, Default)]
pub struct PostChoices {
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(max = 256, message = "Ensure this value has at most 256 characters."))]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    /// Checkbox: present means checked
    #[serde(default)]
    pub is_published: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub image: String,
    #[serde(rename = "csrfmiddlewaretoken", default)]
    pub csrf_token: String,
}

impl PostForm {
    /// Blank form for a new post; published is pre-checked.
    pub fn blank() -> Self {
        Self {
            is_published: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Form pre-populated from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date.format(PUB_DATE_INPUT_FORMAT).to_string(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published.then(|| "on".to_string()),
            image: post.image.clone().unwrap_or_default(),
            csrf_token: String::new(),
        }
    }

    pub fn published_checked(&self) -> bool {
        self.is_published.is_some()
    }

    fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            text: self.text.trim().to_string(),
            pub_date: self.pub_date.trim().to_string(),
            category: self.category.trim().to_string(),
            location: self.location.trim().to_string(),
            is_published: self.is_published.clone(),
            image: self.image.trim().to_string(),
            csrf_token: self.csrf_token.clone(),
        }
    }

    /// Validate against the available choices and produce a draft.
    pub fn clean(&self, choices: &PostChoices) -> Result<PostDraft, FormErrors> {
        let form = self.trimmed();
        let mut errors = FormErrors::new();

        if let Err(e) = form.validate() {
            errors.extend_from(&e);
        }

        if form.title.is_empty() {
            errors.add("title", REQUIRED);
        }
        if form.text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let pub_date = if form.pub_date.is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_pub_date(&form.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let category_id = if form.category.is_empty() {
            errors.add("category", REQUIRED);
            None
        } else {
            let id = parse_choice(&form.category, choices.categories.iter().map(|c| c.id));
            if id.is_none() {
                errors.add("category", INVALID_CHOICE);
            }
            id
        };

        let location_id = if form.location.is_empty() {
            None
        } else {
            let id = parse_choice(&form.location, choices.locations.iter().map(|l| l.id));
            if id.is_none() {
                errors.add("location", INVALID_CHOICE);
            }
            id
        };

        let is_published = form.published_checked();
        errors.into_result(move || PostDraft {
            title: form.title,
            text: form.text,
            pub_date: pub_date.unwrap_or_default(),
            is_published,
            image: Some(form.image).filter(|i| !i.is_empty()),
            category_id,
            location_id,
        })
    }
}

fn parse_choice(raw: &str, mut available: impl Iterator<Item = i64>) -> Option<i64> {
    let id = raw.parse::<i64>().ok()?;
    available.any(|candidate| candidate == id).then_some(id)
}

/// Accepts RFC 3339 or a naive `datetime-local` style value taken as UTC.
/// Sub-second parts are dropped to match the edit form's precision.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).trunc_subsecs(0))
}
