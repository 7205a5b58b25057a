#![forbid(unsafe_code)]

//! Disposable subscription handles.
//!
//! # Design
//!
//! A [`Subscription`] owns a one-shot disposer. Disposal runs at most once,
//! either explicitly through [`Subscription::dispose`] or implicitly on drop.
//! [`CompositeSubscription`] bundles several handles so they are released
//! together, and [`SubscriptionSlot`] is a single-occupancy cell that
//! disposes its previous occupant before a new one is installed.
//!
//! # Invariants
//!
//! 1. A disposer runs exactly once, no matter how many times `dispose()` is
//!    called or whether the handle is later dropped.
//! 2. A slot never holds two live subscriptions: `replace()` disposes the old
//!    occupant before the new one becomes visible.
//! 3. Disposing a composite disposes every part in insertion order.

use std::fmt;
use std::sync::Mutex;

use crate::lock;

type Disposer = Box<dyn FnOnce() + Send>;

/// RAII handle for a live registration.
///
/// Dropping the handle disposes it.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    disposer: Option<Disposer>,
}

impl Subscription {
    /// Wrap a disposer that runs when the subscription ends.
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { disposer: None }
    }

    /// Release the registration. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }

    /// Whether the disposer has already run (or never existed).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposer.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A group of subscriptions released together.
#[derive(Debug, Default)]
#[must_use]
pub struct CompositeSubscription {
    parts: Vec<Subscription>,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.parts.push(subscription);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Dispose every part, in insertion order.
    pub fn dispose(&mut self) {
        for part in &mut self.parts {
            part.dispose();
        }
        self.parts.clear();
    }
}

impl FromIterator<Subscription> for CompositeSubscription {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

impl From<CompositeSubscription> for Subscription {
    fn from(mut composite: CompositeSubscription) -> Self {
        if composite.is_empty() {
            return Subscription::empty();
        }
        Subscription::new(move || composite.dispose())
    }
}

/// Single-occupancy holder for one subscription.
///
/// Once [`close`](Self::close)d, the slot disposes anything offered to it,
/// so a late `replace` racing a teardown cannot leak a handler.
#[derive(Debug, Default)]
pub struct SubscriptionSlot {
    inner: Mutex<SlotInner>,
}

#[derive(Debug, Default)]
struct SlotInner {
    occupant: Option<Subscription>,
    closed: bool,
}

impl SubscriptionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `subscription`, disposing whatever occupied the slot before.
    /// On a closed slot the new subscription is disposed instead.
    pub fn replace(&self, mut subscription: Subscription) {
        let mut inner = lock(&self.inner);
        if inner.closed {
            subscription.dispose();
            return;
        }
        if let Some(mut previous) = inner.occupant.take() {
            previous.dispose();
        }
        inner.occupant = Some(subscription);
    }

    /// Dispose the occupant, leaving the slot empty.
    pub fn clear(&self) {
        let previous = lock(&self.inner).occupant.take();
        if let Some(mut previous) = previous {
            previous.dispose();
        }
    }

    /// Dispose the occupant and refuse every later occupant.
    pub fn close(&self) {
        let previous = {
            let mut inner = lock(&self.inner);
            inner.closed = true;
            inner.occupant.take()
        };
        if let Some(mut previous) = previous {
            previous.dispose();
        }
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        lock(&self.inner).occupant.is_some()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.inner).closed
    }
}
