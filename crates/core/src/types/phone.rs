//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// Not exactly ten characters.
    #[error("phone number must be exactly 10 digits")]
    WrongLength,
    /// Contains something other than ASCII digits.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// First digit outside 6-9.
    #[error("phone number must start with 6, 7, 8, or 9")]
    InvalidPrefix,
}

/// A 10-digit mobile number.
///
/// Matches `^[6-9][0-9]{9}$`: ten ASCII digits, the first of which is 6-9.
///
/// ```
/// use marketstall_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("9998887771").is_ok());
/// assert!(PhoneNumber::parse("1234567890").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of digits.
    pub const LENGTH: usize = 10;

    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is ten ASCII digits starting with 6-9.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        if s.len() != Self::LENGTH {
            return Err(PhoneNumberError::WrongLength);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }

        if !matches!(s.as_bytes().first(), Some(b'6'..=b'9')) {
            return Err(PhoneNumberError::InvalidPrefix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}
