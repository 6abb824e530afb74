//! Hooks a pooled value may implement to follow its own pooled lifecycle.
//!
//! These hooks are driven by the pool, not by the state machine: they fire
//! when a value leaves or re-enters a free list, or when the pool destroys it.

use std::any::Any;

/// Type-erased view of a pooled value's concrete type.
///
/// Implemented for every `'static` type. Pools use it to check that a
/// factory really produced the type a caller asked for.
pub trait AsAny: Any {
    /// Borrow the value as `dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow the value as `dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Full type name of the concrete value, for diagnostics.
    fn concrete_type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Activation, deactivation and disposal hooks for pooled values.
///
/// All hooks are no-ops by default; implement only the ones a value needs.
/// Per-activation transient data should be reset in [`Pooled::on_dequeued`]
/// (or in the state's `enter` hook) since the same instance is cycled across
/// unrelated activations.
///
/// # Example
///
/// ```rust
/// use statepool::{KeyedPool, PoolDescriptor, Pooled};
///
/// #[derive(Default)]
/// struct Particle {
///     age: f32,
/// }
///
/// impl Pooled for Particle {
///     fn on_dequeued(&mut self) {
///         self.age = 0.0;
///     }
/// }
///
/// let mut pool: KeyedPool<Particle> = KeyedPool::new();
/// pool.register_pool(PoolDescriptor::new("Particle", 4, || Box::new(Particle::default())))
///     .unwrap();
///
/// let mut particle = pool.acquire("Particle").unwrap();
/// particle.age = 3.5;
/// pool.release(particle, "Particle").unwrap();
///
/// let particle = pool.acquire("Particle").unwrap();
/// assert_eq!(particle.age, 0.0);
/// ```
pub trait Pooled: AsAny {
    /// Called when the value leaves its free list.
    fn on_dequeued(&mut self) {}

    /// Called when the value is handed back to its free list.
    fn on_enqueued(&mut self) {}

    /// Called right before the pool destroys the value.
    fn on_disposed(&mut self) {}
}
