//! Scoped acquisition: a value that returns to its pool when dropped.

use super::keyed::KeyedPool;
use super::pooled::Pooled;
use std::borrow::Cow;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A pooled value borrowed for the lifetime of the guard.
///
/// Created by [`KeyedPool::scoped`]. Dropping the guard releases the value
/// back to the key it was acquired from.
///
/// # Example
///
/// ```rust
/// use statepool::{KeyedPool, Pooled};
///
/// #[derive(Default)]
/// struct Scratch(Vec<u8>);
///
/// impl Pooled for Scratch {
///     fn on_enqueued(&mut self) {
///         self.0.clear();
///     }
/// }
///
/// let mut pool: KeyedPool<Scratch> = KeyedPool::new();
/// pool.register("Scratch", 1, || Box::new(Scratch::default())).unwrap();
///
/// {
///     let mut scratch = pool.scoped("Scratch").unwrap();
///     scratch.0.extend_from_slice(b"frame data");
/// }
///
/// assert_eq!(pool.free_count("Scratch"), Some(1));
/// ```
pub struct PoolGuard<'p, B: ?Sized + Pooled> {
    pool: &'p mut KeyedPool<B>,
    key: Cow<'static, str>,
    value: Option<Box<B>>,
}

impl<'p, B: ?Sized + Pooled> PoolGuard<'p, B> {
    pub(crate) fn new(pool: &'p mut KeyedPool<B>, key: Cow<'static, str>, value: Box<B>) -> Self {
        Self {
            pool,
            key,
            value: Some(value),
        }
    }

    /// Key the value will be released to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Detach the value from the guard; it will not be released on drop.
    pub fn into_inner(mut self) -> Box<B> {
        self.value
            .take()
            .expect("pool guard holds its value until dropped")
    }
}

impl<B: ?Sized + Pooled> Deref for PoolGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.value
            .as_deref()
            .expect("pool guard holds its value until dropped")
    }
}

impl<B: ?Sized + Pooled> DerefMut for PoolGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.value
            .as_deref_mut()
            .expect("pool guard holds its value until dropped")
    }
}

impl<B: ?Sized + Pooled> Drop for PoolGuard<'_, B> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            if let Err(err) = self.pool.release(value, &self.key) {
                tracing::warn!(key = %self.key, error = %err, "scoped value was not returned");
            }
        }
    }
}

impl<B: ?Sized + Pooled> fmt::Debug for PoolGuard<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolGuard")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolError;

    #[derive(Default)]
    struct Buffer {
        bytes: Vec<u8>,
    }

    impl Pooled for Buffer {
        fn on_enqueued(&mut self) {
            self.bytes.clear();
        }
    }

    fn buffer_pool() -> KeyedPool<Buffer> {
        let mut pool = KeyedPool::new();
        pool.register("Buffer", 1, || Box::new(Buffer::default()))
            .unwrap();
        pool
    }

    #[test]
    fn guard_returns_value_on_drop() {
        let mut pool = buffer_pool();

        {
            let mut guard = pool.scoped("Buffer").unwrap();
            guard.bytes.push(1);
            assert_eq!(guard.key(), "Buffer");
        }

        assert_eq!(pool.free_count("Buffer"), Some(1));
        assert_eq!(pool.stats("Buffer").unwrap().releases, 1);
        assert!(pool.acquire("Buffer").unwrap().bytes.is_empty());
    }

    #[test]
    fn into_inner_detaches_value() {
        let mut pool = buffer_pool();

        let value = pool.scoped("Buffer").unwrap().into_inner();

        assert_eq!(pool.free_count("Buffer"), Some(0));
        pool.release(value, "Buffer").unwrap();
        assert_eq!(pool.free_count("Buffer"), Some(1));
    }

    #[test]
    fn scoped_unknown_key_fails() {
        let mut pool = buffer_pool();
        assert!(matches!(pool.scoped("Missing"), Err(PoolError::UnknownKey { .. })));
    }
}
