#![forbid(unsafe_code)]

//! Change notifications for nested property paths.
//!
//! Subscribe once to a path such as `"Order.Customer.Name"` on an object
//! graph and receive one [`ObservedChange`] whenever the value at the end of
//! the path changes, whether the leaf property itself changed or an object
//! in the middle of the path was replaced.
//!
//! - [`Observer`] / [`observe`]: entry points returning a [`ChangeStream`].
//! - [`Reflect`], [`Value`], [`PropertyBag`]: the object model.
//! - [`Capability`], [`AdapterCache`]: notification capability detection and
//!   the bounded cache of adapters.
//! - [`Subscription`], [`SubscriptionSlot`]: disposable handles.
//!
//! # Example
//!
//! ```
//! use pathwatch::{ObjectRef, Observer, PropertyBag, Value};
//!
//! let address = PropertyBag::builder("Address").property("City", "Oslo").build();
//! let person = PropertyBag::builder("Person").property("Address", address.clone()).build();
//! let root: ObjectRef = person.clone();
//!
//! let stream = Observer::new().observe_value(&root, "Address.City").unwrap();
//! let (_consumer, rx) = stream.subscribe_channel();
//!
//! address.set("City", "Bergen").unwrap();
//! assert_eq!(rx.try_recv().unwrap(), Value::from("Bergen"));
//!
//! let moved = PropertyBag::builder("Address").property("City", "Tromsø").build();
//! person.set("Address", moved).unwrap();
//! assert_eq!(rx.try_recv().unwrap(), Value::from("Tromsø"));
//! ```
//!
//! # Invariants
//!
//! 1. The first walk completes before `observe` returns; a path that names a
//!    missing property fails there and leaves nothing subscribed.
//! 2. Replacing an object in the middle of a path disposes every
//!    subscription below it before new ones are installed.
//! 3. A link whose value is `Null` produces no notifications until a later
//!    replacement makes the path navigable again.
//! 4. Disposing (or dropping) a [`ChangeStream`] disposes every link once.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod bag;
pub mod cache;
pub mod capability;
pub mod chain;
pub mod change;
pub mod error;
pub mod events;
pub mod observe;
pub mod path;
pub mod stream;
pub mod subscription;
pub mod value;

pub use bag::{NotifyMode, PropertyBag, PropertyBagBuilder};
pub use cache::{AdapterCache, CacheConfig, CacheStats};
pub use capability::{Capability, CapabilityKind, NotifyAdapter, classify};
pub use chain::Chain;
pub use change::ObservedChange;
pub use error::{ObserveError, Result};
pub use events::{EventSource, PropertyEvents};
pub use observe::{ObserveConfig, Observer, observe, observe_map};
pub use path::{PropertyPath, navigate};
pub use stream::ChangeStream;
pub use subscription::{CompositeSubscription, Subscription, SubscriptionSlot};
pub use value::{
    NotifyPropertyChanged, ObjectRef, ObservableObject, Reflect, Value, object_id, same_object,
};

/// Lock a mutex, recovering the data if a handler panicked while holding it.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
