use serde::{Deserialize, Serialize};
use std::fmt;

pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const TAG_NAME_MAX_CHARS: usize = 20;

pub const BLANK_MESSAGE: &str = "can't be blank";
pub const TAKEN_MESSAGE: &str = "has already been taken";

/// Current time in the storage format used for every timestamp column
pub fn timestamp_now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTag {
    pub id: i64,
    pub post_id: i64,
    pub tag_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A post together with its eager-loaded tags, in association order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithTags {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
}

impl PostWithTags {
    /// Tag names joined with ", ", used to pre-fill the edit form
    pub fn tag_names_as_string(&self) -> String {
        self.tag_names().join(", ")
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }
}

/// Submitted fields for creating or updating a post.
///
/// `tag_names` distinguishes "not submitted" (`None`, associations are left
/// alone) from "submitted empty" (`Some("")`, associations are cleared).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub description: String,
    pub tag_names: Option<String>,
}

impl PostForm {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tag_names: None,
        }
    }

    pub fn with_tags(mut self, tag_names: impl Into<String>) -> Self {
        self.tag_names = Some(tag_names.into());
        self
    }

    /// Prefill a form from an existing post, tags included
    pub fn from_post(post: &PostWithTags) -> Self {
        Self {
            title: post.post.title.clone(),
            description: post.post.description.clone(),
            tag_names: Some(post.tag_names_as_string()),
        }
    }

    /// Check the scalar field constraints (tags are validated on resolution)
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_text(&mut errors, "title", Some(&self.title), TITLE_MAX_CHARS);
        check_text(&mut errors, "description", Some(&self.description), DESCRIPTION_MAX_CHARS);
        errors.into_result()
    }
}

/// Validate a tag name that has already been trimmed
pub fn validate_tag_name(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_text(&mut errors, "name", Some(name), TAG_NAME_MAX_CHARS);
    errors.into_result()
}

fn check_text(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>, max_chars: usize) {
    match value {
        Some(text) if !text.trim().is_empty() => {
            if text.chars().count() > max_chars {
                errors.add(field, too_long_message(max_chars));
            }
        }
        _ => errors.add(field, BLANK_MESSAGE),
    }
}

pub fn too_long_message(max_chars: usize) -> String {
    format!("is too long (maximum is {} characters)", max_chars)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", capitalize(&self.field), self.message)
    }
}

/// Per-field validation failures, rendered inline by the form views
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded against one field
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn valid_form_passes() {
        assert!(PostForm::new("Title", "Body").validate().is_ok());
    }

    #[rstest]
    #[case("", "title", BLANK_MESSAGE)]
    #[case("   ", "title", BLANK_MESSAGE)]
    fn blank_title_is_rejected(#[case] title: &str, #[case] field: &str, #[case] message: &str) {
        let errors = PostForm::new(title, "Body").validate().unwrap_err();
        assert_eq!(errors.on(field), vec![message]);
    }

    #[rstest]
    #[case(255, true)]
    #[case(256, false)]
    fn title_length_limit(#[case] len: usize, #[case] valid: bool) {
        let form = PostForm::new("a".repeat(len), "Body");
        assert_eq!(form.validate().is_ok(), valid);
        if !valid {
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.on("title"), vec!["is too long (maximum is 255 characters)"]);
        }
    }

    #[rstest]
    #[case(1000, true)]
    #[case(1001, false)]
    fn description_length_limit(#[case] len: usize, #[case] valid: bool) {
        let form = PostForm::new("Title", "a".repeat(len));
        assert_eq!(form.validate().is_ok(), valid);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // 255 three-byte characters still fit in a title
        let form = PostForm::new("あ".repeat(255), "本文");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn both_blank_fields_are_reported() {
        let errors = PostForm::new("", "").validate().unwrap_err();
        assert_eq!(errors.on("title"), vec![BLANK_MESSAGE]);
        assert_eq!(errors.on("description"), vec![BLANK_MESSAGE]);
        assert_eq!(errors.to_string(), "Title can't be blank, Description can't be blank");
    }

    #[rstest]
    #[case("a", true)]
    #[case("aaaaaaaaaaaaaaaaaaaa", true)]
    #[case("aaaaaaaaaaaaaaaaaaaaa", false)]
    #[case("", false)]
    fn tag_name_rules(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_tag_name(name).is_ok(), valid);
    }

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn post_with(tags: Vec<Tag>) -> PostWithTags {
        PostWithTags {
            post: Post {
                id: 1,
                title: "t".to_string(),
                description: "d".to_string(),
                created_at: String::new(),
                updated_at: String::new(),
            },
            tags,
        }
    }

    #[test]
    fn tag_names_as_string_joins_with_comma_space() {
        assert_eq!(post_with(vec![]).tag_names_as_string(), "");
        assert_eq!(post_with(vec![tag(1, "Ruby")]).tag_names_as_string(), "Ruby");
        assert_eq!(
            post_with(vec![tag(1, "Ruby"), tag(2, "Rails"), tag(3, "JavaScript")]).tag_names_as_string(),
            "Ruby, Rails, JavaScript"
        );
    }

    #[test]
    fn form_from_post_carries_tags_as_text() {
        let form = PostForm::from_post(&post_with(vec![tag(1, "Ruby"), tag(2, "Rails")]));
        assert_eq!(form.tag_names.as_deref(), Some("Ruby, Rails"));
    }
}
