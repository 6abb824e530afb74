//! Keyed object pool.
//!
//! A [`KeyedPool`] owns one free list per key. Each free list is described by
//! a [`PoolDescriptor`] (key, default capacity, factory) and holds reusable
//! instances of a common base type `B`, usually a trait object.
//!
//! - **Acquire** pops a free instance or builds one on a miss
//! - **Release** pushes an instance back onto its key's free list
//! - **Hooks** ([`Pooled`]) let a value react to leaving or re-entering a list
//!
//! Lookup failures are recoverable: they are logged and returned as
//! [`PoolError`], never raised as panics.

mod descriptor;
mod error;
mod guard;
mod keyed;
mod pooled;

pub use descriptor::{Factory, PoolDescriptor};
pub use error::PoolError;
pub use guard::PoolGuard;
pub use keyed::{KeyedPool, PoolStats};
pub use pooled::{AsAny, Pooled};
