#![forbid(unsafe_code)]

//! The chain subscription engine.
//!
//! # Design
//!
//! A [`Chain`] observes one [`PropertyPath`] from one root object. State is
//! held in arena style: the path and one [`Link`] per path segment live in a
//! shared `ChainState`, and every recursive step is just "walk from link
//! `i` with value `v`".
//!
//! For a path `A.B.C` rooted at `r`:
//!
//! ```text
//! link 0: r.A   (changing -> snapshot, changed -> rewire links 1.., emit)
//! link 1: a.B   (changing -> snapshot, changed -> rewire links 2.., emit)
//! link 2: b.C   (terminal: changed, or changing if before_change -> emit)
//! ```
//!
//! When a non-terminal link reports "changed", the downstream links are
//! rewired against the new value (each slot disposes its old occupant), the
//! full path is navigated again from the root, and a change is emitted
//! unless navigation failed or the value equals the link's snapshot.
//!
//! Handlers capture only weak references to the chain state and to the
//! object they observe, so neither the graph nor the handlers keep a chain
//! alive.
//!
//! # Invariants
//!
//! 1. Link `i` holds at most one live subscription at a time.
//! 2. Rewiring from link `i` never touches links `0..=i`.
//! 3. When navigation reaches `Null` at link `i`, links `i..` are empty.
//! 4. Disposing the chain closes every link: it stays empty even if a
//!    concurrent rewiring tries to refill it.
//!
//! # Failure Modes
//!
//! - **Missing property**: the walk empties every link it touched and
//!   returns [`ObserveError::PropertyNotFound`]. On the first walk this
//!   surfaces from `observe`; during a later rewiring it is logged and the
//!   already-delivered stream stays valid.
//! - **Concurrent mutation of different links**: each rewiring is internally
//!   consistent, but the chain as a whole is only as consistent as the
//!   objects that notify it.

use std::sync::{Arc, Mutex, Weak};

use crate::cache::AdapterCache;
use crate::capability::Capability;
use crate::change::ObservedChange;
use crate::error::{ObserveError, Result};
use crate::lock;
use crate::path::{PropertyPath, navigate};
use crate::subscription::{CompositeSubscription, Subscription, SubscriptionSlot};
use crate::value::{ObjectRef, Value};

/// Destination for observed changes.
pub(crate) type Sink = Arc<dyn Fn(ObservedChange) + Send + Sync>;

/// Per-segment state.
#[derive(Debug, Default)]
struct Link {
    slot: SubscriptionSlot,
    /// Most recently observed value at the end of the path, as seen from
    /// this link's object.
    snapshot: Mutex<Option<Value>>,
}

impl Link {
    fn reset(&self) {
        self.slot.clear();
        *lock(&self.snapshot) = None;
    }

    fn store_snapshot(&self, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut *lock(&self.snapshot), value)
    }
}

struct ChainState {
    root: ObjectRef,
    path: PropertyPath,
    links: Box<[Link]>,
    before_change: bool,
    cache: Arc<AdapterCache>,
    sink: Sink,
}

impl ChainState {
    fn root_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    fn reset_from(&self, start: usize) {
        for link in &self.links[start..] {
            link.reset();
        }
    }

    fn close(&self) {
        for link in &self.links[..] {
            link.slot.close();
            *lock(&link.snapshot) = None;
        }
    }

    /// Record `observed` as the latest end-of-path value for links
    /// `0..index`.
    fn store_upstream(&self, index: usize, observed: Option<&Value>) {
        for link in &self.links[..index] {
            link.store_snapshot(observed.cloned());
        }
    }

    fn is_closed(&self) -> bool {
        self.links[0].slot.is_closed()
    }

    fn emit(&self, value: Value) {
        if self.is_closed() {
            return;
        }
        (self.sink)(ObservedChange::new(self.root.clone(), self.path.clone(), value));
    }

    fn missing_property(&self, on: &Value, index: usize) -> ObserveError {
        ObserveError::property_not_found(
            on.type_name(),
            &self.path.segments()[index],
            self.path.label(),
        )
    }
}

/// A live subscription to one property path.
pub struct Chain {
    state: Arc<ChainState>,
}

impl Chain {
    /// Walk the whole path once and install every link's subscriptions.
    pub(crate) fn subscribe(
        root: ObjectRef,
        path: PropertyPath,
        before_change: bool,
        cache: Arc<AdapterCache>,
        sink: Sink,
    ) -> Result<Self> {
        let links = (0..path.len()).map(|_| Link::default()).collect();
        let state = Arc::new(ChainState {
            root,
            path,
            links,
            before_change,
            cache,
            sink,
        });
        tracing::debug!(
            message = "chain.subscribe",
            path = state.path.label(),
            links = state.links.len(),
            before_change
        );

        let root = state.root_value();
        walk(&state, 0, root)?;
        Ok(Self { state })
    }

    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.state.path
    }

    /// Number of links currently holding a subscription.
    #[must_use]
    pub fn active_links(&self) -> usize {
        self.state
            .links
            .iter()
            .filter(|link| link.slot.is_occupied())
            .count()
    }

    /// Dispose every link's subscription. Rewiring still in flight on
    /// other threads installs nothing afterwards.
    pub fn dispose(&self) {
        tracing::debug!(message = "chain.dispose", path = self.state.path.label());
        self.state.close();
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("path", &self.state.path.label())
            .field("active_links", &self.active_links())
            .finish()
    }
}

/// Subscribe links `start..` beginning with `current` as link `start`'s
/// object. On a missing property every link from `start` is emptied.
fn walk(state: &Arc<ChainState>, start: usize, current: Value) -> Result<()> {
    let last = state.links.len() - 1;
    let mut current = current;

    for index in start..=last {
        let object = match &current {
            Value::Null => {
                state.reset_from(index);
                return Ok(());
            }
            Value::Object(object) => Arc::clone(object),
            scalar => {
                let err = state.missing_property(scalar, index);
                state.reset_from(start);
                return Err(err);
            }
        };

        let name = &state.path.segments()[index];
        if !object.has_property(name) {
            let err = state.missing_property(&current, index);
            state.reset_from(start);
            return Err(err);
        }

        let link = &state.links[index];
        let capability = state.cache.get(&object);

        if index == last {
            match capability {
                Some(capability) => {
                    link.slot
                        .replace(terminal_subscription(state, &object, &capability, index));
                }
                None => link.reset(),
            }
            return Ok(());
        }

        match capability {
            Some(capability) => {
                let snapshot = navigate(&current, &state.path.segments()[index..]);
                link.store_snapshot(snapshot);
                link.slot
                    .replace(link_subscription(state, &object, &capability, index));
            }
            None => link.reset(),
        }

        current = object.property(name).unwrap_or_default();
    }
    Ok(())
}

/// "Changing" refreshes the snapshot; "changed" rewires and emits.
fn link_subscription(
    state: &Arc<ChainState>,
    object: &ObjectRef,
    capability: &Capability,
    index: usize,
) -> Subscription {
    let name = &state.path.segments()[index];

    let weak_state = Arc::downgrade(state);
    let weak_object = Arc::downgrade(object);
    let changing = capability.changing(name, move |_| {
        let (Some(state), Some(object)) = (weak_state.upgrade(), weak_object.upgrade()) else {
            return;
        };
        let snapshot = navigate(&Value::Object(object), &state.path.segments()[index..]);
        state.links[index].store_snapshot(snapshot);
    });

    let weak_state = Arc::downgrade(state);
    let weak_object = Arc::downgrade(object);
    let changed = capability.changed(name, move |_| {
        let (Some(state), Some(object)) = (weak_state.upgrade(), weak_object.upgrade()) else {
            return;
        };
        on_link_changed(&state, &object, index);
    });

    [changing, changed]
        .into_iter()
        .collect::<CompositeSubscription>()
        .into()
}

fn on_link_changed(state: &Arc<ChainState>, object: &ObjectRef, index: usize) {
    let segments = state.path.segments();
    let next = object.property(&segments[index]).unwrap_or_default();
    tracing::trace!(
        message = "chain.rewire",
        path = state.path.label(),
        link = index,
        property = segments[index].as_str()
    );

    if let Err(err) = walk(state, index + 1, next) {
        tracing::warn!(
            message = "chain.rewire_failed",
            path = state.path.label(),
            link = index,
            error = %err
        );
        return;
    }

    let local = navigate(&Value::Object(Arc::clone(object)), &segments[index..]);
    let previous = state.links[index].store_snapshot(local);

    let Some(value) = navigate(&state.root_value(), segments) else {
        state.store_upstream(index, None);
        tracing::trace!(
            message = "chain.suppress",
            path = state.path.label(),
            link = index,
            reason = "navigation_miss"
        );
        return;
    };
    // Links without a "changing" stream dedup against this value next.
    state.store_upstream(index, Some(&value));
    if previous.as_ref() == Some(&value) {
        tracing::trace!(
            message = "chain.suppress",
            path = state.path.label(),
            link = index,
            reason = "unchanged"
        );
        return;
    }
    state.emit(value);
}

/// One stream at the last link, chosen by `before_change`. Always emits.
fn terminal_subscription(
    state: &Arc<ChainState>,
    object: &ObjectRef,
    capability: &Capability,
    index: usize,
) -> Subscription {
    let name = &state.path.segments()[index];
    let weak_state: Weak<ChainState> = Arc::downgrade(state);
    let weak_object = Arc::downgrade(object);
    let handler = move |property: &str| {
        let (Some(state), Some(object)) = (weak_state.upgrade(), weak_object.upgrade()) else {
            return;
        };
        let value = object.property(property).unwrap_or_default();
        if !state.before_change {
            state.store_upstream(index, Some(&value));
        }
        state.emit(value);
    };

    if state.before_change {
        capability.changing(name, handler)
    } else {
        capability.changed(name, handler)
    }
}
