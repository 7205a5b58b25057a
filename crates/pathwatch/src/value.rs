#![forbid(unsafe_code)]

//! Dynamic property values and the object reflection surface.
//!
//! # Design
//!
//! Object graphs are made of shared [`ObjectRef`] handles to types that
//! implement [`Reflect`]. A property holds a [`Value`]: a scalar, a string,
//! another object, or [`Value::Null`] when absent.
//!
//! Notification support is discovered through the two capability probes on
//! [`Reflect`]:
//!
//! - [`Reflect::as_observable`] for objects that raise separate "changing"
//!   and "changed" events ([`ObservableObject`]).
//! - [`Reflect::as_notify`] for objects that only raise "changed"
//!   ([`NotifyPropertyChanged`]).
//!
//! # Equality
//!
//! Scalars and strings compare structurally. Objects compare by identity:
//! two handles are equal only if they point at the same allocation.

use std::fmt;
use std::sync::Arc;

use crate::events::PropertyEvents;

/// Shared handle to a reflective object.
pub type ObjectRef = Arc<dyn Reflect>;

/// Property reflection for navigable objects.
pub trait Reflect: Send + Sync {
    /// Name of the runtime type, used in error messages.
    fn type_name(&self) -> &str;

    /// Whether the type declares a property called `name`.
    fn has_property(&self, name: &str) -> bool;

    /// Current value of `name`, or `None` if the type has no such property.
    fn property(&self, name: &str) -> Option<Value>;

    /// Native before/after notifications, if supported.
    fn as_observable(&self) -> Option<&dyn ObservableObject> {
        None
    }

    /// Single "changed" notifications, if supported.
    fn as_notify(&self) -> Option<&dyn NotifyPropertyChanged> {
        None
    }
}

/// Objects that announce a property before and after it changes.
pub trait ObservableObject {
    fn changing(&self) -> &PropertyEvents;
    fn changed(&self) -> &PropertyEvents;
}

/// Objects that only announce a property after it changed.
pub trait NotifyPropertyChanged {
    fn property_changed(&self) -> &PropertyEvents;
}

/// Identity of an object: the address of its data.
#[must_use]
pub fn object_id(object: &ObjectRef) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}

/// Whether two handles refer to the same object.
#[must_use]
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    object_id(a) == object_id(b)
}

/// A property value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Object(ObjectRef),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Runtime type name: the object's own name, or the scalar kind.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Str(_) => "Str",
            Self::Object(object) => object.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Object(object) => {
                write!(f, "Object({}@{:#x})", object.type_name(), object_id(object))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl<T: Reflect + 'static> From<Arc<T>> for Value {
    fn from(value: Arc<T>) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
