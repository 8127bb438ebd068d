//! HTML form payloads and their validation.
//!
//! Every field deserializes with a default so a missing field surfaces as a
//! validation error on the re-rendered form instead of a 400. Text input is
//! trimmed before validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

pub const TITLE_MAX_CHARS: u64 = 200;

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

const REQUIRED: &str = "This field is required.";

/// Field name → error messages, in a stable order for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Messages for one field; empty when the field is valid.
    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        self.for_field(NON_FIELD_ERRORS)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", err.code));
                form_errors.add(field.to_string(), message);
            }
        }
        form_errors
    }
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(REQUIRED.into());
        return Err(err);
    }
    Ok(())
}

fn username(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    let ok = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !ok {
        let mut err = ValidationError::new("username_chars");
        err.message =
            Some("Enter a valid username: letters, digits and @/./+/-/_ only.".into());
        return Err(err);
    }
    Ok(())
}

fn validated<T: Validate>(form: T) -> Result<T, FormErrors> {
    form.validate().map_err(FormErrors::from)?;
    Ok(form)
}

/// Create/edit post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub content: String,
}

impl PostForm {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trim and validate. On failure the trimmed form is kept by the caller
    /// for re-rendering.
    pub fn clean(self) -> Result<Self, (Self, FormErrors)> {
        let form = Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        };
        validated(form.clone()).map_err(|errors| (form, errors))
    }
}

/// Comment form on the post page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(self) -> Result<Self, (Self, FormErrors)> {
        let form = Self {
            text: self.text.trim().to_string(),
        };
        validated(form.clone()).map_err(|errors| (form, errors))
    }
}

/// Login form. `next` is the page to return to after logging in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub username: String,

    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub password: String,

    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn clean(self) -> Result<Self, (Self, FormErrors)> {
        let form = Self {
            username: self.username.trim().to_string(),
            ..self
        };
        validated(form.clone()).map_err(|errors| (form.without_password(), errors))
    }

    /// Copy suitable for re-rendering: the password is never echoed back.
    pub fn without_password(self) -> Self {
        Self {
            password: String::new(),
            ..self
        }
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        custom(function = "username"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,

    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn clean(self) -> Result<Self, (Self, FormErrors)> {
        let form = Self {
            username: self.username.trim().to_string(),
            ..self
        };

        let mut errors = match form.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        if form.password != form.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        if errors.is_empty() {
            Ok(form)
        } else {
            Err((form.without_passwords(), errors))
        }
    }

    pub fn without_passwords(self) -> Self {
        Self {
            password: String::new(),
            password_confirm: String::new(),
            ..self
        }
    }
}
