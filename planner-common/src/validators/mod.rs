pub mod forms;

use serde::Serialize;
use std::collections::BTreeMap;

pub const REQUIRED_MSG: &str = "This field is required.";

/// Matches the width of `users.email`.
pub const MAX_EMAIL_LENGTH: usize = 255;

#[derive(Debug)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        match &self {
            Validity::Valid => true,
            Validity::Invalid(_) => false,
        }
    }
}

/// Per-field validation messages, keyed by the submitted field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn check(&mut self, field: &'static str, validity: Validity) {
        if let Validity::Invalid(msg) = validity {
            self.add(field, msg);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns `value` if no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

pub fn validate_email_address(email: &str) -> Validity {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Validity::Invalid(String::from("Email address is too long."));
    }

    for c in email.chars() {
        if c == ' ' || !c.is_ascii() {
            return Validity::Invalid(String::from(
                "Email address cannot contain a space or non-ASCII characters.",
            ));
        }
    }

    if email.contains("@.") {
        return Validity::Invalid(String::from(
            "Domain name in email address cannot begin with a period.",
        ));
    }

    let email = match email.split_once('@') {
        Some(s) => s,
        None => {
            return Validity::Invalid(String::from("Email address must contain an at symbol (@)."))
        }
    };

    if email.0.is_empty() || email.1.len() < 3 {
        return Validity::Invalid(String::from("Email username or domain name is too short."));
    }

    if email.1.contains('@') || !email.1.contains('.') {
        return Validity::Invalid(String::from(
            "Email address must have only one at symbol (@) and the domain must contain a period.",
        ));
    }

    if email.1.ends_with('.') {
        return Validity::Invalid(String::from("Email address cannot end with a period."));
    }

    Validity::Valid
}

pub fn validate_username(username: &str) -> Validity {
    const MAX_USERNAME_CHARS: usize = 150;

    if username.is_empty() {
        return Validity::Invalid(String::from(REQUIRED_MSG));
    }

    if username.chars().count() > MAX_USERNAME_CHARS {
        return Validity::Invalid(format!(
            "Ensure this value has at most {MAX_USERNAME_CHARS} characters."
        ));
    }

    let has_invalid_char = username
        .chars()
        .any(|c| !(c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')));

    if has_invalid_char {
        return Validity::Invalid(String::from(
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters.",
        ));
    }

    Validity::Valid
}

pub fn validate_password(password: &str) -> Validity {
    const MIN_PASSWORD_CHARS: usize = 8;
    const MAX_PASSWORD_BYTES: usize = 512;

    if password.len() > MAX_PASSWORD_BYTES {
        return Validity::Invalid(format!(
            "Password is too long. Max: {MAX_PASSWORD_BYTES} bytes"
        ));
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Validity::Invalid(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_CHARS} \
             characters."
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Validity::Invalid(String::from("This password is entirely numeric."));
    }

    Validity::Valid
}
