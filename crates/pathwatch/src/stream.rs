#![forbid(unsafe_code)]

//! The multicast stream returned by `observe`.
//!
//! # Design
//!
//! A [`ChangeStream<T>`] owns two things with separate lifecycles:
//!
//! - the [`Chain`] that watches the object graph, and
//! - an [`EventSource<T>`] that consumers attach to.
//!
//! The chain pushes every change into the event source. Consumers come and
//! go without affecting the chain; only [`ChangeStream::dispose`] (or
//! dropping the stream) tears the chain down.

use std::sync::{Arc, Mutex, mpsc};

use crate::cache::AdapterCache;
use crate::chain::{Chain, Sink};
use crate::change::ObservedChange;
use crate::error::Result;
use crate::events::EventSource;
use crate::lock;
use crate::path::PropertyPath;
use crate::subscription::Subscription;
use crate::value::ObjectRef;

/// Multicast stream of observed changes, projected to `T`.
pub struct ChangeStream<T: 'static> {
    publisher: Arc<EventSource<T>>,
    path: PropertyPath,
    chain: Mutex<Option<Chain>>,
}

impl<T: Send + Sync + 'static> ChangeStream<T> {
    pub(crate) fn open(
        root: ObjectRef,
        path: PropertyPath,
        before_change: bool,
        cache: Arc<AdapterCache>,
        project: impl Fn(ObservedChange) -> T + Send + Sync + 'static,
    ) -> Result<Self> {
        let publisher = Arc::new(EventSource::<T>::new());
        let target = Arc::clone(&publisher);
        let sink: Sink = Arc::new(move |change: ObservedChange| {
            target.raise(&project(change));
        });
        let chain = Chain::subscribe(root, path.clone(), before_change, cache, sink)?;
        Ok(Self {
            publisher,
            path,
            chain: Mutex::new(Some(chain)),
        })
    }

    /// Attach a consumer. Dropping the returned handle detaches only this
    /// consumer.
    pub fn subscribe(&self, consumer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.publisher.subscribe(consumer)
    }

    /// Attach a consumer that forwards clones into a channel.
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::Receiver<T>)
    where
        T: Clone,
    {
        let (tx, rx) = mpsc::channel();
        let subscription = self.publisher.subscribe(move |item: &T| {
            // A dropped receiver just stops listening.
            let _ = tx.send(item.clone());
        });
        (subscription, rx)
    }
}

impl<T: 'static> ChangeStream<T> {
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.publisher.handler_count()
    }

    /// Number of path links currently holding a subscription.
    #[must_use]
    pub fn active_links(&self) -> usize {
        lock(&self.chain).as_ref().map_or(0, Chain::active_links)
    }

    /// Tear down the chain. Consumers stay attached but receive nothing
    /// further. Idempotent.
    pub fn dispose(&self) {
        let chain = lock(&self.chain).take();
        if let Some(chain) = chain {
            chain.dispose();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        lock(&self.chain).is_none()
    }
}

impl<T: 'static> Drop for ChangeStream<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: 'static> std::fmt::Debug for ChangeStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream")
            .field("path", &self.path.label())
            .field("consumers", &self.consumer_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
