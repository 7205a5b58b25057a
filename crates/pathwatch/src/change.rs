#![forbid(unsafe_code)]

//! The record delivered for each observed change.

use std::fmt;

use crate::path::{PropertyPath, navigate};
use crate::value::{ObjectRef, Value};

/// One change at the end of an observed path.
///
/// Carries the root object, the full path, and the value navigated at the
/// moment the change was delivered. [`try_get_value`](Self::try_get_value)
/// re-derives the value from the root on demand.
#[derive(Clone)]
pub struct ObservedChange {
    sender: ObjectRef,
    path: PropertyPath,
    value: Value,
}

impl ObservedChange {
    #[must_use]
    pub fn new(sender: ObjectRef, path: PropertyPath, value: Value) -> Self {
        Self {
            sender,
            path,
            value,
        }
    }

    /// The root object the path was observed on.
    #[must_use]
    pub fn sender(&self) -> &ObjectRef {
        &self.sender
    }

    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Dotted path, e.g. `"A.B.C"`.
    #[must_use]
    pub fn label(&self) -> &str {
        self.path.label()
    }

    /// Value at delivery time.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Navigate the path from the sender again. `None` if some link is
    /// currently not navigable.
    #[must_use]
    pub fn try_get_value(&self) -> Option<Value> {
        navigate(&Value::Object(self.sender.clone()), self.path.segments())
    }
}

impl fmt::Debug for ObservedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedChange")
            .field("sender", &self.sender.type_name())
            .field("path", &self.path.label())
            .field("value", &self.value)
            .finish()
    }
}
