//! Field constraints for user input.
//!
//! Every check appends to a [`ValidationErrors`] instead of returning early so
//! a form can report all of its problems at once.

use std::{fmt, sync::OnceLock};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub const NAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 40;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const CONTENT_MAX_CHARS: usize = 140;
pub const LOCATION_MAX_CHARS: usize = 100;

/// A single failed constraint on a named field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    /// Human readable message, e.g. `Name can't be blank`.
    pub fn full_message(&self) -> String {
        format!("{} {}", humanize(self.field), self.message)
    }
}

/// Ordered collection of field errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns `true` when at least one error is attached to `field`.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.iter().map(FieldError::full_message).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join("; "))
    }
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn validate_name(raw: &str, errors: &mut ValidationErrors) -> String {
    let name = raw.trim();
    if name.is_empty() {
        errors.add("name", "can't be blank");
    } else if name.chars().count() > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("is too long (maximum is {NAME_MAX_CHARS} characters)"),
        );
    }
    name.to_string()
}

/// Emails are compared case-insensitively, so they are stored lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn validate_email(raw: &str, errors: &mut ValidationErrors) -> String {
    let email = normalize_email(raw);
    if email.is_empty() {
        errors.add("email", "can't be blank");
    } else if !is_valid_email(&email) {
        errors.add("email", "is invalid");
    }
    email
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static GENERATED_USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("pattern {pattern} failed to compile: {error}"))
    })
}

/// `local@domain.tld` with an alphabetic top level label.
fn email_regex() -> &'static Regex {
    compiled(&EMAIL_RE, r"(?i)^[a-z0-9_+.\-]+@[a-z0-9.\-]+\.[a-z]+$")
}

/// Length is checked separately; this only constrains the characters.
fn username_regex() -> &'static Regex {
    compiled(&USERNAME_RE, "^[a-z0-9_]+$")
}

fn generated_username_regex() -> &'static Regex {
    compiled(&GENERATED_USERNAME_RE, "^user[0-9]+$")
}

fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Password rules. A blank password is only an error when `required`; on
/// profile updates it means "keep the current one".
pub(crate) fn validate_password(
    password: &str,
    confirmation: &str,
    required: bool,
    errors: &mut ValidationErrors,
) {
    if password.is_empty() {
        if required {
            errors.add("password", "can't be blank");
        } else if !confirmation.is_empty() {
            errors.add("password", "doesn't match confirmation");
        }
        return;
    }

    let length = password.chars().count();
    if length < PASSWORD_MIN_CHARS {
        errors.add(
            "password",
            format!("is too short (minimum is {PASSWORD_MIN_CHARS} characters)"),
        );
    } else if length > PASSWORD_MAX_CHARS {
        errors.add(
            "password",
            format!("is too long (maximum is {PASSWORD_MAX_CHARS} characters)"),
        );
    }
    if password != confirmation {
        errors.add("password", "doesn't match confirmation");
    }
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}

/// Usernames of the form `user<digits>` are generated for accounts that did
/// not pick one and cannot be claimed explicitly.
pub(crate) fn is_generated_username(username: &str) -> bool {
    generated_username_regex().is_match(username)
}

pub(crate) fn validate_username(raw: &str, errors: &mut ValidationErrors) -> String {
    let username = normalize_username(raw);
    let length = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) {
        errors.add(
            "username",
            format!("must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"),
        );
    } else if !username_regex().is_match(&username) {
        errors.add(
            "username",
            "may only contain letters, digits and underscores",
        );
    } else if is_generated_username(&username) {
        errors.add("username", "is reserved");
    }
    username
}

pub(crate) fn validate_content(raw: &str, errors: &mut ValidationErrors) -> String {
    let content = raw.trim();
    if content.is_empty() {
        errors.add("content", "can't be blank");
    } else if content.chars().count() > CONTENT_MAX_CHARS {
        errors.add(
            "content",
            format!("is too long (maximum is {CONTENT_MAX_CHARS} characters)"),
        );
    }
    content.to_string()
}

pub(crate) fn validate_location(
    raw: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let location = raw.map(str::trim).filter(|s| !s.is_empty())?;
    if location.chars().count() > LOCATION_MAX_CHARS {
        errors.add(
            "location",
            format!("is too long (maximum is {LOCATION_MAX_CHARS} characters)"),
        );
    }
    Some(location.to_string())
}
