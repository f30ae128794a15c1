//! Error types for member lookup and accessor invocation

use crate::scope::BindingScope;

/// Result type for lookups and accessor calls
pub type AccessResult<T> = Result<T, AccessError>;

/// Member access error types
///
/// A member that does not exist is not an error: lookups return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// The source matched more than one member and could not pick one
    #[error("Ambiguous member: {type_name}.{name} matches more than one member")]
    AmbiguousMember {
        /// Type the lookup ran against
        type_name: String,
        /// Requested member name
        name: String,
    },

    /// A value, argument, or receiver does not match the declared type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared type name
        expected: String,
        /// Supplied type name
        got: String,
    },

    /// Wrong number of arguments passed to an invoker
    #[error("Arity mismatch calling {member}: expected {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Method name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// The accessor does not support this operation
    #[error("Operation not supported: cannot {operation} {member}")]
    NotSupported {
        /// `get`, `set` or `invoke`
        operation: &'static str,
        /// Member name
        member: String,
    },

    /// An instance member was accessed without a receiver
    #[error("Missing receiver for instance member {member}")]
    MissingReceiver {
        /// Member name
        member: String,
    },

    /// A binding scope without a static/instance or public/non-public half
    #[error("Invalid binding scope: {0:?}")]
    InvalidScope(BindingScope),

    /// The type handle was issued by a different registry
    #[error("Type {type_name} does not belong to this registry")]
    ForeignType {
        /// Name of the foreign type
        type_name: String,
    },

    /// A type with this name is already registered
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    /// Two members of one type clash
    #[error("Duplicate member: {type_name}.{name}")]
    DuplicateMember {
        /// Declaring type
        type_name: String,
        /// Clashing member name
        name: String,
    },

    /// Slot index outside the instance or static storage
    #[error("Invalid slot {index} (storage holds {len})")]
    InvalidSlot {
        /// Requested slot
        index: usize,
        /// Number of slots
        len: usize,
    },

    /// A property or method body reported a failure
    #[error("{0}")]
    Host(String),
}

impl AccessError {
    /// Build a `TypeMismatch` from anything displayable
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        AccessError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub(crate) fn not_supported(operation: &'static str, member: &str) -> Self {
        AccessError::NotSupported {
            operation,
            member: member.to_string(),
        }
    }
}

impl From<String> for AccessError {
    fn from(s: String) -> Self {
        AccessError::Host(s)
    }
}

impl From<&str> for AccessError {
    fn from(s: &str) -> Self {
        AccessError::Host(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AccessError::mismatch("int", "string");
        assert_eq!(err.to_string(), "Type mismatch: expected int, got string");

        let err = AccessError::ArityMismatch {
            member: "Add".to_string(),
            expected: 2,
            got: 1,
        };
        assert!(err.to_string().contains("expected 2"));

        let err = AccessError::not_supported("set", "Total");
        assert_eq!(err.to_string(), "Operation not supported: cannot set Total");
    }

    #[test]
    fn test_host_error_from_str() {
        let err: AccessError = "division by zero".into();
        assert_eq!(err, AccessError::Host("division by zero".to_string()));
    }
}
