use std::{fmt::Display, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern should be a valid regex")
});

/// A case-folded email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Surrounding whitespace is removed and the address is lowercased before
    /// it is checked.
    ///
    /// # Errors
    ///
    /// This function will return [Error::InvalidEmail] if `raw_email` is not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = Self::normalize(raw_email);

        if EMAIL_PATTERN.is_match(&email) {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail)
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The address is still trimmed and lowercased so that it can be used to
    /// look up existing users. For emails coming from a new user this function
    /// should **not** be used, instead use the checked version.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(Self::normalize(raw_email))
    }

    /// The email as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalize(raw_email: &str) -> String {
        raw_email.trim().to_lowercase()
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
