//! Descriptions of how to build one kind of pooled value.

use std::borrow::Cow;
use std::fmt;

/// Factory invoked on a pool miss.
pub type Factory<B> = Box<dyn Fn() -> Box<B>>;

/// Immutable (key, default capacity, factory) triple.
///
/// Registering a descriptor with a [`KeyedPool`](super::KeyedPool) creates a
/// free list under `key`, pre-sized to `default_capacity` instances. The
/// capacity is advisory: acquiring past it invokes the factory again.
pub struct PoolDescriptor<B: ?Sized> {
    key: Cow<'static, str>,
    default_capacity: usize,
    factory: Factory<B>,
}

impl<B: ?Sized> PoolDescriptor<B> {
    /// Create a descriptor.
    pub fn new<K, F>(key: K, default_capacity: usize, factory: F) -> Self
    where
        K: Into<Cow<'static, str>>,
        F: Fn() -> Box<B> + 'static,
    {
        Self {
            key: key.into(),
            default_capacity,
            factory: Box::new(factory),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    pub(crate) fn into_parts(self) -> (Cow<'static, str>, usize, Factory<B>) {
        (self.key, self.default_capacity, self.factory)
    }
}

impl<B: ?Sized> fmt::Debug for PoolDescriptor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolDescriptor")
            .field("key", &self.key)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}
