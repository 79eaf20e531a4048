//! Validated text newtypes shared by the entity models.
//!
//! Names, string keys and string values are all "required text": the input
//! is trimmed and must not be empty afterwards. Each field gets its own type so
//! validation happens once, at the boundary, and the rest of the domain can
//! rely on the invariant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation failure for a required text field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextValidationError {
    /// The value was empty once surrounding whitespace was removed.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the rejected field.
        field: &'static str,
    },
    /// The value failed a field-specific format rule.
    #[error("{field} is malformed: {reason}")]
    Malformed {
        /// Name of the rejected field.
        field: &'static str,
        /// Human readable rule that was violated.
        reason: &'static str,
    },
}

impl TextValidationError {
    /// Field that failed validation.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::Malformed { field, .. } => field,
        }
    }
}

fn required(field: &'static str, raw: &str) -> Result<String, TextValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TextValidationError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_required_text {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Field name reported in validation errors.
            pub const FIELD: &'static str = $field;

            /// Trim and validate the input.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, TextValidationError> {
                required(Self::FIELD, raw.as_ref()).map(Self)
            }

            /// Borrow the validated text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TextValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_required_text!(
    /// Display name of a user.
    DisplayName,
    "name"
);
define_required_text!(
    /// Name of a project.
    ProjectName,
    "name"
);
define_required_text!(
    /// Name of an app.
    AppName,
    "name"
);
define_required_text!(
    /// Key column value of a string item.
    StringKey,
    "key"
);
define_required_text!(
    /// Value column of a string item.
    StringValue,
    "value"
);

/// Email address identifying a user.
///
/// Only a light shape check is applied: trimmed, non-empty, exactly one `@`
/// with text on both sides. Addresses compare case-insensitively so they are
/// stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Field name reported in validation errors.
    pub const FIELD: &'static str = "email";

    /// Normalise and validate an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TextValidationError> {
        let value = required(Self::FIELD, raw.as_ref())?.to_lowercase();
        let mut parts = value.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !well_formed {
            return Err(TextValidationError::Malformed {
                field: Self::FIELD,
                reason: "expected local@domain",
            });
        }
        Ok(Self(value))
    }

    /// Borrow the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TextValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Trim optional free text, mapping blank input to `None`.
#[must_use]
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}
