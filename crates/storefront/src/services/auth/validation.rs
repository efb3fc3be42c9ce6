//! Form payloads and their validation.
//!
//! Each form validates every field and reports all failures together as
//! [`FieldErrors`], keyed by the camelCase field name the client sent.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use marketstall_core::{Email, PersonName, PhoneNumber};

use crate::models::NewUser;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 32;

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failing field of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Check a new password against the complexity policy.
///
/// # Errors
///
/// Returns the message for the first rule the password breaks.
pub fn check_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters");
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err("Password must be at most 32 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Password must contain at least one special character");
    }

    Ok(())
}

fn check_new_password(
    errors: &mut FieldErrors,
    field: &'static str,
    confirm_field: &'static str,
    password: &SecretString,
    confirmation: &SecretString,
    mismatch: &'static str,
) {
    if let Err(message) = check_password(password.expose_secret()) {
        errors.push(field, message);
    }
    if password.expose_secret() != confirmation.expose_secret() {
        errors.push(confirm_field, mismatch);
    }
}

fn parse_email(errors: &mut FieldErrors, raw: &str) -> Option<Email> {
    Email::parse_normalized(raw)
        .map_err(|_| errors.push("email", "Please enter a valid email address"))
        .ok()
}

/// Signup submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
    #[serde(deserialize_with = "secret")]
    pub confirm_password: SecretString,
}

impl SignupForm {
    /// Validate every field, yielding the account fields on success.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = PersonName::parse(&self.first_name)
            .map_err(|e| errors.push("firstName", format!("First name {e}")))
            .ok();
        let last_name = PersonName::parse(&self.last_name)
            .map_err(|e| errors.push("lastName", format!("Last name {e}")))
            .ok();
        let email = parse_email(&mut errors, &self.email);
        let phone_number = PhoneNumber::parse(self.phone_number.trim())
            .map_err(|_| {
                errors.push(
                    "phoneNumber",
                    "Please enter a valid 10-digit mobile number",
                );
            })
            .ok();
        check_new_password(
            &mut errors,
            "password",
            "confirmPassword",
            &self.password,
            &self.confirm_password,
            "Passwords do not match",
        );

        match (first_name, last_name, email, phone_number) {
            (Some(first_name), Some(last_name), Some(email), Some(phone_number))
                if errors.is_empty() =>
            {
                Ok(NewUser {
                    first_name,
                    last_name,
                    email,
                    phone_number,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Login submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
}

impl LoginForm {
    /// Validate the login fields, yielding the email to look up.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = parse_email(&mut errors, &self.email);
        if self.password.expose_secret().is_empty() {
            errors.push("password", "Password is required");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

/// Change-email submission.
#[derive(Debug, Deserialize)]
pub struct ChangeEmailForm {
    pub email: String,
}

impl ChangeEmailForm {
    /// # Errors
    ///
    /// Returns the email field error if the address is malformed.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::new();
        match parse_email(&mut errors, &self.email) {
            Some(email) => Ok(email),
            None => Err(errors),
        }
    }
}

/// Change-password submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    #[serde(deserialize_with = "secret")]
    pub old_password: SecretString,
    #[serde(deserialize_with = "secret")]
    pub new_password: SecretString,
    #[serde(deserialize_with = "secret")]
    pub confirm_new_password: SecretString,
}

impl ChangePasswordForm {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.old_password.expose_secret().is_empty() {
            errors.push("oldPassword", "Old password is required");
        }
        check_new_password(
            &mut errors,
            "newPassword",
            "confirmNewPassword",
            &self.new_password,
            &self.confirm_new_password,
            "New passwords do not match.",
        );

        errors.into_result(())
    }
}
