#![forbid(unsafe_code)]

//! A ready-made reflective object with a fixed set of properties.
//!
//! # Design
//!
//! [`PropertyBag`] stores its values in declaration order behind a mutex and
//! raises notifications according to its [`NotifyMode`]:
//!
//! | Mode     | "changing" | "changed" | Probe that succeeds |
//! |----------|------------|-----------|---------------------|
//! | `Native` | yes        | yes       | `as_observable`     |
//! | `Simple` | no         | yes       | `as_notify`         |
//! | `Silent` | no         | no        | none                |
//!
//! Events are always raised with the value lock released, so handlers may
//! read (or write) the bag.
//!
//! # Invariants
//!
//! 1. The property set is fixed when the bag is built.
//! 2. [`PropertyBag::set`] with a value equal to the current one is a no-op.
//! 3. "changing" is raised before the value is stored; "changed" after.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{ObserveError, Result};
use crate::events::PropertyEvents;
use crate::lock;
use crate::value::{NotifyPropertyChanged, ObservableObject, Reflect, Value};

/// Which notifications a [`PropertyBag`] raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyMode {
    /// Separate "changing" and "changed" events.
    #[default]
    Native,
    /// "Changed" events only.
    Simple,
    /// No notifications at all.
    Silent,
}

/// Reflective object with named properties.
pub struct PropertyBag {
    type_name: String,
    mode: NotifyMode,
    values: Mutex<Vec<(String, Value)>>,
    changing: PropertyEvents,
    changed: PropertyEvents,
}

impl PropertyBag {
    /// Start building a bag of the given type.
    pub fn builder(type_name: impl Into<String>) -> PropertyBagBuilder {
        PropertyBagBuilder {
            type_name: type_name.into(),
            mode: NotifyMode::default(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> NotifyMode {
        self.mode
    }

    /// Current value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        lock(&self.values)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Store `value`, raising notifications only if it differs from the
    /// current value. Returns whether anything changed.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let current = self.get(name).ok_or_else(|| self.missing(name))?;
        if current == value {
            return Ok(false);
        }
        self.store_and_raise(name, value);
        Ok(true)
    }

    /// Store `value` and raise notifications even if it is unchanged.
    pub fn set_and_raise(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if !self.has_property(name) {
            return Err(self.missing(name));
        }
        self.store_and_raise(name, value.into());
        Ok(())
    }

    /// Number of live handlers across both event streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changing.handler_count() + self.changed.handler_count()
    }

    fn store_and_raise(&self, name: &str, value: Value) {
        if self.mode == NotifyMode::Native {
            self.changing.raise(name);
        }
        if let Some(entry) = lock(&self.values).iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        }
        if self.mode != NotifyMode::Silent {
            self.changed.raise(name);
        }
    }

    fn missing(&self, name: &str) -> ObserveError {
        ObserveError::property_not_found(&self.type_name, name, name)
    }
}

impl Reflect for PropertyBag {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn has_property(&self, name: &str) -> bool {
        lock(&self.values).iter().any(|(n, _)| n == name)
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn as_observable(&self) -> Option<&dyn ObservableObject> {
        match self.mode {
            NotifyMode::Native => Some(self),
            _ => None,
        }
    }

    fn as_notify(&self) -> Option<&dyn NotifyPropertyChanged> {
        match self.mode {
            NotifyMode::Native | NotifyMode::Simple => Some(self),
            NotifyMode::Silent => None,
        }
    }
}

impl ObservableObject for PropertyBag {
    fn changing(&self) -> &PropertyEvents {
        &self.changing
    }

    fn changed(&self) -> &PropertyEvents {
        &self.changed
    }
}

impl NotifyPropertyChanged for PropertyBag {
    fn property_changed(&self) -> &PropertyEvents {
        &self.changed
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBag")
            .field("type_name", &self.type_name)
            .field("mode", &self.mode)
            .field("values", &*lock(&self.values))
            .finish()
    }
}

/// Builder for [`PropertyBag`].
#[derive(Debug)]
#[must_use]
pub struct PropertyBagBuilder {
    type_name: String,
    mode: NotifyMode,
    values: Vec<(String, Value)>,
}

impl PropertyBagBuilder {
    /// Declare a property with its initial value. Redeclaring a name
    /// overwrites the earlier initial value.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    pub fn notify(mut self, mode: NotifyMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<PropertyBag> {
        Arc::new(PropertyBag {
            type_name: self.type_name,
            mode: self.mode,
            values: Mutex::new(self.values),
            changing: PropertyEvents::new(),
            changed: PropertyEvents::new(),
        })
    }
}
