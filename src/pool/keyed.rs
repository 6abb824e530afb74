//! Keyed object pool: one free list per key.

use super::descriptor::{Factory, PoolDescriptor};
use super::error::PoolError;
use super::guard::PoolGuard;
use super::pooled::Pooled;
use crate::config::PoolSettings;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Counters for one key's free list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Instances built by the factory, including pre-sizing.
    pub created: u64,
    /// Successful acquisitions.
    pub acquires: u64,
    /// Acquisitions served from the free list.
    pub hits: u64,
    /// Acquisitions that had to invoke the factory.
    pub misses: u64,
    /// Values handed back to the free list.
    pub releases: u64,
    /// Released values disposed because of `max_retained`.
    pub evictions: u64,
    /// Instances currently free.
    pub free: usize,
}

struct FreeList<B: ?Sized> {
    free: Vec<Box<B>>,
    factory: Factory<B>,
    stats: PoolStats,
}

impl<B: ?Sized + Pooled> FreeList<B> {
    fn build(&mut self) -> Box<B> {
        self.stats.created += 1;
        (self.factory)()
    }

    fn dispose_all(&mut self) -> usize {
        let disposed = self.free.len();
        for mut value in self.free.drain(..) {
            value.on_disposed();
        }
        disposed
    }
}

/// A registry of free lists, each holding reusable instances of `B`.
///
/// `B` is usually a trait object shared by every pooled kind (for the state
/// machine it is `dyn State<C, I>`), and each key conventionally holds one
/// concrete type. Acquire and release are O(1) and do not allocate once a
/// key's free list is warm.
///
/// The pool is not thread-safe. Several machines may share one pool through
/// an `Rc<RefCell<_>>` as long as they are driven from the same thread.
///
/// # Example
///
/// ```rust
/// use statepool::{KeyedPool, PoolDescriptor, Pooled};
///
/// struct Bullet;
/// impl Pooled for Bullet {}
///
/// let mut pool: KeyedPool<Bullet> = KeyedPool::new();
/// pool.register_pool(PoolDescriptor::new("Bullet", 2, || Box::new(Bullet))).unwrap();
/// assert_eq!(pool.free_count("Bullet"), Some(2));
///
/// let bullet = pool.acquire("Bullet").unwrap();
/// assert_eq!(pool.free_count("Bullet"), Some(1));
///
/// pool.release(bullet, "Bullet").unwrap();
/// assert_eq!(pool.free_count("Bullet"), Some(2));
///
/// assert!(pool.acquire("Missile").is_err());
/// ```
pub struct KeyedPool<B: ?Sized + Pooled> {
    lists: HashMap<Cow<'static, str>, FreeList<B>>,
    settings: PoolSettings,
}

impl<B: ?Sized + Pooled> KeyedPool<B> {
    /// Create an empty pool with default settings.
    pub fn new() -> Self {
        Self::with_settings(PoolSettings::default())
    }

    /// Create an empty pool with the given settings.
    pub fn with_settings(settings: PoolSettings) -> Self {
        Self {
            lists: HashMap::new(),
            settings,
        }
    }

    /// Create a pool and register every descriptor.
    pub fn from_descriptors<D>(descriptors: D) -> Result<Self, PoolError>
    where
        D: IntoIterator<Item = PoolDescriptor<B>>,
    {
        let mut pool = Self::new();
        pool.register_pools(descriptors)?;
        Ok(pool)
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Register a free list built from the descriptor.
    ///
    /// The list is filled eagerly up to the descriptor's capacity (or the
    /// override from [`PoolSettings::capacities`]).
    pub fn register_pool(&mut self, descriptor: PoolDescriptor<B>) -> Result<(), PoolError> {
        if self.lists.contains_key(descriptor.key()) {
            return Err(PoolError::DuplicateKey {
                key: descriptor.key().to_string(),
            });
        }

        let (key, default_capacity, factory) = descriptor.into_parts();
        let capacity = self.settings.capacity_for(&key, default_capacity);
        let mut list = FreeList {
            free: Vec::with_capacity(capacity),
            factory,
            stats: PoolStats::default(),
        };
        for _ in 0..capacity {
            let value = list.build();
            list.free.push(value);
        }

        tracing::debug!(key = %key, capacity, "registered pool");
        self.lists.insert(key, list);
        Ok(())
    }

    /// Register a free list from its parts.
    pub fn register<K, F>(
        &mut self,
        key: K,
        default_capacity: usize,
        factory: F,
    ) -> Result<(), PoolError>
    where
        K: Into<Cow<'static, str>>,
        F: Fn() -> Box<B> + 'static,
    {
        self.register_pool(PoolDescriptor::new(key, default_capacity, factory))
    }

    /// Register several descriptors at once.
    ///
    /// Either every descriptor is registered or none is: all keys are checked
    /// against the pool and against each other first.
    pub fn register_pools<D>(&mut self, descriptors: D) -> Result<(), PoolError>
    where
        D: IntoIterator<Item = PoolDescriptor<B>>,
    {
        let descriptors: Vec<PoolDescriptor<B>> = descriptors.into_iter().collect();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let repeated = descriptors[..index]
                .iter()
                .any(|earlier| earlier.key() == descriptor.key());
            if repeated || self.lists.contains_key(descriptor.key()) {
                return Err(PoolError::DuplicateKey {
                    key: descriptor.key().to_string(),
                });
            }
        }

        for descriptor in descriptors {
            self.register_pool(descriptor)?;
        }
        Ok(())
    }

    /// Dispose every free instance under `key` and remove the key.
    ///
    /// Instances currently in use are not reclaimed; releasing one of them
    /// later fails with [`PoolError::UnknownKey`]. Returns the number of
    /// instances disposed.
    pub fn unregister_pool(&mut self, key: &str) -> Result<usize, PoolError> {
        let Some(mut list) = self.lists.remove(key) else {
            tracing::warn!(key, "cannot unregister unknown pool");
            return Err(PoolError::UnknownKey {
                key: key.to_string(),
            });
        };

        let disposed = list.dispose_all();
        tracing::debug!(key, disposed, "unregistered pool");
        Ok(disposed)
    }

    /// Unregister several keys, skipping unknown ones.
    ///
    /// Returns the total number of instances disposed.
    pub fn unregister_pools<'k, K>(&mut self, keys: K) -> usize
    where
        K: IntoIterator<Item = &'k str>,
    {
        keys.into_iter()
            .filter_map(|key| self.unregister_pool(key).ok())
            .sum()
    }

    /// Take an instance from `key`'s free list, building one on a miss.
    ///
    /// Fires [`Pooled::on_dequeued`] on the returned value. An unknown key is
    /// logged and leaves the pool untouched.
    pub fn acquire(&mut self, key: &str) -> Result<Box<B>, PoolError> {
        let Some(list) = self.lists.get_mut(key) else {
            tracing::warn!(key, "acquire from unregistered pool");
            return Err(PoolError::UnknownKey {
                key: key.to_string(),
            });
        };

        list.stats.acquires += 1;
        let mut value = match list.free.pop() {
            Some(value) => {
                list.stats.hits += 1;
                value
            }
            None => {
                list.stats.misses += 1;
                list.build()
            }
        };

        value.on_dequeued();
        tracing::trace!(key, free = list.free.len(), "acquired pooled value");
        Ok(value)
    }

    /// Like [`acquire`](Self::acquire), but verifies the value is a `T`.
    ///
    /// On a mismatch the value goes straight back to its free list and
    /// [`PoolError::TypeMismatch`] is returned.
    pub fn acquire_checked<T: Any>(&mut self, key: &str) -> Result<Box<B>, PoolError> {
        self.acquire_matching(key, TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub(crate) fn acquire_matching(
        &mut self,
        key: &str,
        expected: TypeId,
        expected_name: &'static str,
    ) -> Result<Box<B>, PoolError> {
        let value = self.acquire(key)?;
        if Any::type_id((*value).as_any()) == expected {
            return Ok(value);
        }

        let found = (*value).concrete_type_name();
        tracing::warn!(key, expected = expected_name, found, "pooled value has an unexpected type");
        self.release(value, key)?;
        Err(PoolError::TypeMismatch {
            key: key.to_string(),
            expected: expected_name,
            found,
        })
    }

    /// Hand `value` back to `key`'s free list.
    ///
    /// Fires [`Pooled::on_enqueued`] first. Under an unknown key the value is
    /// disposed instead of pooled and [`PoolError::UnknownKey`] is returned.
    pub fn release(&mut self, mut value: Box<B>, key: &str) -> Result<(), PoolError> {
        let max_retained = self.settings.max_retained;
        let Some(list) = self.lists.get_mut(key) else {
            tracing::warn!(key, "release to unregistered pool; disposing value");
            value.on_disposed();
            return Err(PoolError::UnknownKey {
                key: key.to_string(),
            });
        };

        value.on_enqueued();
        list.stats.releases += 1;

        if max_retained.is_some_and(|max| list.free.len() >= max) {
            list.stats.evictions += 1;
            value.on_disposed();
            tracing::trace!(key, "free list full; disposed released value");
            return Ok(());
        }

        list.free.push(value);
        tracing::trace!(key, free = list.free.len(), "released pooled value");
        Ok(())
    }

    /// Acquire a value that returns to `key` when the guard is dropped.
    pub fn scoped(&mut self, key: &str) -> Result<PoolGuard<'_, B>, PoolError> {
        let value = self.acquire(key)?;
        let key = self
            .lists
            .get_key_value(key)
            .map(|(registered, _)| registered.clone())
            .unwrap_or_else(|| Cow::Owned(key.to_string()));
        Ok(PoolGuard::new(self, key, value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lists.contains_key(key)
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.lists.keys().map(|key| key.as_ref())
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Number of free instances under `key`.
    pub fn free_count(&self, key: &str) -> Option<usize> {
        self.lists.get(key).map(|list| list.free.len())
    }

    /// Counters for `key`.
    pub fn stats(&self, key: &str) -> Option<PoolStats> {
        self.lists.get(key).map(|list| PoolStats {
            free: list.free.len(),
            ..list.stats
        })
    }
}

impl<B: ?Sized + Pooled> Default for KeyedPool<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized + Pooled> Drop for KeyedPool<B> {
    fn drop(&mut self) {
        for list in self.lists.values_mut() {
            list.dispose_all();
        }
    }
}

impl<B: ?Sized + Pooled> fmt::Debug for KeyedPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, list) in &self.lists {
            map.entry(key, &list.free.len());
        }
        map.finish()
    }
}
