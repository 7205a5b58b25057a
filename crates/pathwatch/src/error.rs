#![forbid(unsafe_code)]

//! Error types for path observation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObserveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    /// The path expression is not a plain chain of member accesses.
    #[error("invalid path expression {expression:?}: {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The path names a property that the encountered type does not have.
    #[error("type `{type_name}` has no property `{property}` (path `{path}`)")]
    PropertyNotFound {
        type_name: String,
        property: String,
        path: String,
    },

    /// An adapter cache was configured without room for a single entry.
    #[error("adapter cache capacity must be at least 1")]
    ZeroCapacity,
}

impl ObserveError {
    #[must_use]
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn property_not_found(
        type_name: impl Into<String>,
        property: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::PropertyNotFound {
            type_name: type_name.into(),
            property: property.into(),
            path: path.into(),
        }
    }

    /// Whether this error describes a path that does not fit the object graph.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::PropertyNotFound { .. })
    }
}
