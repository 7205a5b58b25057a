#![forbid(unsafe_code)]

//! Public entry points.
//!
//! [`Observer`] parses a path expression, walks the path once so every
//! reachable link is subscribed before returning, and hands back a
//! [`ChangeStream`]. A path that names a property the graph does not have
//! fails here, synchronously, with [`ObserveError::PropertyNotFound`].
//!
//! [`ObserveError::PropertyNotFound`]: crate::ObserveError::PropertyNotFound

use std::sync::Arc;

use crate::cache::AdapterCache;
use crate::change::ObservedChange;
use crate::error::Result;
use crate::path::PropertyPath;
use crate::stream::ChangeStream;
use crate::value::{ObjectRef, Value};

/// Per-observer defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveConfig {
    /// Deliver the terminal link's "changing" notifications (with the value
    /// about to be replaced) instead of its "changed" notifications.
    pub before_change: bool,
}

impl ObserveConfig {
    #[must_use]
    pub fn with_before_change(mut self, before_change: bool) -> Self {
        self.before_change = before_change;
        self
    }
}

/// Creates path subscriptions against one adapter cache.
#[derive(Debug, Clone)]
pub struct Observer {
    cache: Arc<AdapterCache>,
    config: ObserveConfig,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer {
    /// Observer over the process-wide cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(Arc::clone(AdapterCache::global()))
    }

    /// Observer over a caller-owned cache.
    #[must_use]
    pub fn with_cache(cache: Arc<AdapterCache>) -> Self {
        Self {
            cache,
            config: ObserveConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ObserveConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<AdapterCache> {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> ObserveConfig {
        self.config
    }

    /// Observe `expression` on `root` using the configured defaults.
    pub fn observe(
        &self,
        root: &ObjectRef,
        expression: &str,
    ) -> Result<ChangeStream<ObservedChange>> {
        self.observe_with(root, expression, self.config.before_change)
    }

    /// Observe `expression` on `root` with explicit before/after semantics.
    pub fn observe_with(
        &self,
        root: &ObjectRef,
        expression: &str,
        before_change: bool,
    ) -> Result<ChangeStream<ObservedChange>> {
        let path = PropertyPath::parse(expression)?;
        self.observe_path(root, path, before_change)
    }

    /// Observe an already-parsed path.
    pub fn observe_path(
        &self,
        root: &ObjectRef,
        path: PropertyPath,
        before_change: bool,
    ) -> Result<ChangeStream<ObservedChange>> {
        ChangeStream::open(
            Arc::clone(root),
            path,
            before_change,
            Arc::clone(&self.cache),
            |change| change,
        )
    }

    /// Observe `expression` and project each change through `selector`.
    pub fn observe_map<T, F>(
        &self,
        root: &ObjectRef,
        expression: &str,
        selector: F,
    ) -> Result<ChangeStream<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(ObservedChange) -> T + Send + Sync + 'static,
    {
        let path = PropertyPath::parse(expression)?;
        ChangeStream::open(
            Arc::clone(root),
            path,
            self.config.before_change,
            Arc::clone(&self.cache),
            selector,
        )
    }

    /// Observe `expression` and deliver only the values.
    pub fn observe_value(&self, root: &ObjectRef, expression: &str) -> Result<ChangeStream<Value>> {
        self.observe_map(root, expression, ObservedChange::into_value)
    }
}

/// [`Observer::observe`] on the process-wide cache.
pub fn observe(root: &ObjectRef, expression: &str) -> Result<ChangeStream<ObservedChange>> {
    Observer::new().observe(root, expression)
}

/// [`Observer::observe_map`] on the process-wide cache.
pub fn observe_map<T, F>(root: &ObjectRef, expression: &str, selector: F) -> Result<ChangeStream<T>>
where
    T: Send + Sync + 'static,
    F: Fn(ObservedChange) -> T + Send + Sync + 'static,
{
    Observer::new().observe_map(root, expression, selector)
}
