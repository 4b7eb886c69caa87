//! Input validation errors shared by repositories and services.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected caller input. Nothing is written when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    EmptyField(&'static str),
    /// Tag name is empty once normalized. Carries the raw input.
    EmptyTagName(String),
    /// An update call supplied no field at all.
    NothingToUpdate,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::EmptyTagName(raw) => {
                write!(f, "tag name `{raw}` is empty after normalization")
            }
            Self::NothingToUpdate => write!(f, "no values to update"),
        }
    }
}

impl Error for ValidationError {}

/// Fails with [`ValidationError::EmptyField`] when `value` has no visible text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
