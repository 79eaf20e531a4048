//! Numeric record identifiers.
//!
//! Every stored entity is keyed by a positive 64-bit integer assigned by the
//! record store. Each entity gets its own newtype so a project id can never be
//! passed where an app id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an identifier from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordIdParseError {
    /// The input was not a decimal integer.
    #[error("identifier must be a decimal integer: {0}")]
    NotANumber(String),
    /// The input parsed but was zero or negative.
    #[error("identifier must be positive: {0}")]
    NotPositive(i64),
}

macro_rules! define_record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw numeric value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = RecordIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| RecordIdParseError::NotANumber(s.to_owned()))?;
                if raw <= 0 {
                    return Err(RecordIdParseError::NotPositive(raw));
                }
                Ok(Self(raw))
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_record_id!(
    /// Identifier of a [`crate::domain::User`].
    UserId
);
define_record_id!(
    /// Identifier of a [`crate::domain::Project`].
    ProjectId
);
define_record_id!(
    /// Identifier of an [`crate::domain::App`].
    AppId
);
define_record_id!(
    /// Identifier of a [`crate::domain::StringItem`].
    StringId
);
define_record_id!(
    /// Identifier of a [`crate::domain::Version`].
    VersionId
);
