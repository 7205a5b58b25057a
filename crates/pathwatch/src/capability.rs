#![forbid(unsafe_code)]

//! Notification capability detection and adaptation.
//!
//! [`Capability::adapt`] classifies an object once:
//!
//! - objects with native "changing"/"changed" events are used as-is,
//! - objects with only a "changed" event are wrapped in a [`NotifyAdapter`]
//!   whose "changing" stream never fires,
//! - anything else has no capability and yields `None`.

use std::fmt;
use std::sync::Arc;

use crate::subscription::Subscription;
use crate::value::{ObjectRef, object_id};

/// Which notification surface an object exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Native,
    Simple,
    None,
}

/// Classify `object` without wrapping it.
#[must_use]
pub fn classify(object: &ObjectRef) -> CapabilityKind {
    if object.as_observable().is_some() {
        CapabilityKind::Native
    } else if object.as_notify().is_some() {
        CapabilityKind::Simple
    } else {
        CapabilityKind::None
    }
}

/// Synthesized before/after notifications for a "changed"-only object.
pub struct NotifyAdapter {
    target: ObjectRef,
}

impl NotifyAdapter {
    #[must_use]
    pub fn new(target: ObjectRef) -> Self {
        Self { target }
    }

    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// Before-change notifications are unavailable; the stream is empty.
    pub fn changing(
        &self,
        _property: &str,
        _handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Subscription {
        Subscription::empty()
    }

    /// Re-emit the target's "changed" events for `property`.
    pub fn changed(
        &self,
        property: &str,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Subscription {
        match self.target.as_notify() {
            Some(notify) => notify.property_changed().subscribe_property(property, handler),
            None => Subscription::empty(),
        }
    }
}

impl fmt::Debug for NotifyAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyAdapter")
            .field("target", &self.target.type_name())
            .field("id", &format_args!("{:#x}", object_id(&self.target)))
            .finish()
    }
}

/// Before/after change streams for one object.
#[derive(Clone)]
pub enum Capability {
    /// The object itself; it raises both streams.
    Native(ObjectRef),
    /// A wrapper over a "changed"-only object.
    Adapted(Arc<NotifyAdapter>),
}

impl Capability {
    /// Wrap `object` according to its [`CapabilityKind`].
    #[must_use]
    pub fn adapt(object: &ObjectRef) -> Option<Self> {
        match classify(object) {
            CapabilityKind::Native => Some(Self::Native(Arc::clone(object))),
            CapabilityKind::Simple => Some(Self::Adapted(Arc::new(NotifyAdapter::new(
                Arc::clone(object),
            )))),
            CapabilityKind::None => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::Native(_) => CapabilityKind::Native,
            Self::Adapted(_) => CapabilityKind::Simple,
        }
    }

    /// The object whose notifications this capability exposes.
    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        match self {
            Self::Native(object) => object,
            Self::Adapted(adapter) => adapter.target(),
        }
    }

    /// Subscribe to "about to change" for `property`.
    pub fn changing(
        &self,
        property: &str,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Subscription {
        match self {
            Self::Native(object) => match object.as_observable() {
                Some(observable) => observable.changing().subscribe_property(property, handler),
                None => Subscription::empty(),
            },
            Self::Adapted(adapter) => adapter.changing(property, handler),
        }
    }

    /// Subscribe to "changed" for `property`.
    pub fn changed(
        &self,
        property: &str,
        handler: impl Fn(&str) + Send + Sync + 'static,
    ) -> Subscription {
        match self {
            Self::Native(object) => match object.as_observable() {
                Some(observable) => observable.changed().subscribe_property(property, handler),
                None => Subscription::empty(),
            },
            Self::Adapted(adapter) => adapter.changed(property, handler),
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(object) => write!(f, "Native({})", object.type_name()),
            Self::Adapted(adapter) => write!(f, "Adapted({})", adapter.target().type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::{NotifyMode, PropertyBag};
    use crate::value::same_object;
    use std::sync::Mutex;

    fn bag(mode: NotifyMode) -> ObjectRef {
        PropertyBag::builder("Thing").property("X", 0).notify(mode).build()
    }

    #[test]
    fn classification() {
        assert_eq!(classify(&bag(NotifyMode::Native)), CapabilityKind::Native);
        assert_eq!(classify(&bag(NotifyMode::Simple)), CapabilityKind::Simple);
        assert_eq!(classify(&bag(NotifyMode::Silent)), CapabilityKind::None);
    }

    #[test]
    fn native_is_returned_unchanged() {
        let object = bag(NotifyMode::Native);
        let capability = Capability::adapt(&object).expect("native");
        assert_eq!(capability.kind(), CapabilityKind::Native);
        assert!(same_object(capability.target(), &object));
    }

    #[test]
    fn silent_object_has_no_capability() {
        assert!(Capability::adapt(&bag(NotifyMode::Silent)).is_none());
    }

    #[test]
    fn adapted_changed_reemits_and_changing_is_empty() {
        let concrete = PropertyBag::builder("Thing")
            .property("X", 0)
            .notify(NotifyMode::Simple)
            .build();
        let object: ObjectRef = concrete.clone();
        let capability = Capability::adapt(&object).expect("simple");
        assert_eq!(capability.kind(), CapabilityKind::Simple);

        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = Arc::clone(&log);
        let before = capability.changing("X", move |n| {
            l1.lock().expect("log").push(format!("-{n}"))
        });
        let l2 = Arc::clone(&log);
        let _after = capability.changed("X", move |n| {
            l2.lock().expect("log").push(format!("+{n}"))
        });
        assert!(before.is_disposed());

        concrete.set("X", 1).expect("declared");
        assert_eq!(*log.lock().expect("log"), vec!["+X".to_owned()]);
    }

    #[test]
    fn native_streams_filter_by_property() {
        let concrete = PropertyBag::builder("Thing")
            .property("X", 0)
            .property("Y", 0)
            .build();
        let object: ObjectRef = concrete.clone();
        let capability = Capability::adapt(&object).expect("native");

        let log = Arc::new(Mutex::new(Vec::new()));
        let l1 = Arc::clone(&log);
        let _before = capability.changing("X", move |n| {
            l1.lock().expect("log").push(format!("-{n}"))
        });
        let l2 = Arc::clone(&log);
        let _after = capability.changed("X", move |n| {
            l2.lock().expect("log").push(format!("+{n}"))
        });

        concrete.set("Y", 1).expect("declared");
        concrete.set("X", 1).expect("declared");
        assert_eq!(*log.lock().expect("log"), vec!["-X".to_owned(), "+X".to_owned()]);
    }
}
