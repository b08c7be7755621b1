//! Load errors.
//!
//! Loading fails in exactly two ways: the text is not a descriptor at all, or
//! it is one but an entry breaks a launch invariant. Either way nothing is
//! returned; a supervisor never sees a partially valid set.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The source does not parse into `{ apps: [ ... ] }` with well-typed entries.
    #[error("malformed descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    /// The source parsed, but one entry is semantically invalid.
    #[error("invalid {entry}: {reason}")]
    Validation { entry: EntryRef, reason: String },
}

impl LoadError {
    pub(crate) fn malformed(reason: impl fmt::Display) -> Self {
        Self::MalformedDescriptor {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(entry: EntryRef, reason: impl Into<String>) -> Self {
        Self::Validation {
            entry,
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDescriptor { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Position (and name, when it has one) of an entry in the `apps` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    pub index: usize,
    pub name: Option<String>,
}

impl EntryRef {
    pub fn new(index: usize, name: &str) -> Self {
        let name = if name.trim().is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        Self { index, name }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "app #{} ({})", self.index, name),
            None => write!(f, "app #{}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_message_names_the_entry() {
        let err = LoadError::invalid(EntryRef::new(1, "svc"), "duplicate name \"svc\"");
        assert_eq!(
            err.to_string(),
            "invalid app #1 (svc): duplicate name \"svc\""
        );
        assert!(err.is_validation());
    }

    #[test]
    fn blank_names_are_reported_by_index_only() {
        assert_eq!(EntryRef::new(3, "  ").to_string(), "app #3");
    }
}
