//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::{MachineSettings, PoolSettings};
use crate::core::State;
use crate::machine::{SharedStatePool, StateMachine, StatePool};
use crate::pool::PoolDescriptor;
use std::cell::RefCell;
use std::rc::Rc;

/// Builder for constructing state machines with a fluent API.
///
/// Without [`shared_pool`](Self::shared_pool) the machine gets its own pool,
/// built with [`pool_settings`](Self::pool_settings). Either way every
/// registered state is added to the pool by [`build`](Self::build).
pub struct MachineBuilder<C: 'static, I: 'static> {
    descriptors: Vec<PoolDescriptor<dyn State<C, I>>>,
    shared_pool: Option<SharedStatePool<C, I>>,
    pool_settings: Option<PoolSettings>,
    settings: MachineSettings,
}

impl<C: 'static, I: 'static> MachineBuilder<C, I> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            shared_pool: None,
            pool_settings: None,
            settings: MachineSettings::default(),
        }
    }

    /// Draw states from a pool shared with other machines.
    ///
    /// States the shared pool already holds a key for are reused, so every
    /// machine on the pool can name the states it needs.
    pub fn shared_pool(mut self, pool: SharedStatePool<C, I>) -> Self {
        self.shared_pool = Some(pool);
        self
    }

    /// Settings for the machine's own pool.
    pub fn pool_settings(mut self, settings: PoolSettings) -> Self {
        self.pool_settings = Some(settings);
        self
    }

    /// Register a pool of `T` under its type key, pre-sized to `capacity`.
    pub fn state<T>(self, capacity: usize) -> Self
    where
        T: State<C, I> + Default,
    {
        self.descriptor(PoolDescriptor::state::<T>(capacity))
    }

    /// Register a pool of `T` under its type key, built with `make`.
    pub fn state_with<T, F>(self, capacity: usize, make: F) -> Self
    where
        T: State<C, I>,
        F: Fn() -> T + 'static,
    {
        self.descriptor(PoolDescriptor::state_with::<T, F>(capacity, make))
    }

    /// Register a pool from a descriptor, e.g. one with an explicit key.
    pub fn descriptor(mut self, descriptor: PoolDescriptor<dyn State<C, I>>) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn settings(mut self, settings: MachineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.settings.history_capacity = capacity;
        self
    }

    /// Whether `fixed_update` also runs `check_switch_states`.
    pub fn fixed_update_checks(mut self, enabled: bool) -> Self {
        self.settings.fixed_update_checks = enabled;
        self
    }

    /// Build the machine, registering every state pool.
    ///
    /// Registration is all-or-nothing: a duplicate key leaves the pool as it
    /// was. With a shared pool, keys it already holds are skipped and only
    /// repeats within this builder count as duplicates.
    pub fn build(self) -> Result<StateMachine<C, I>, BuildError> {
        let pool = match self.shared_pool {
            Some(pool) => {
                if self.pool_settings.is_some() {
                    return Err(BuildError::SettingsWithSharedPool);
                }
                let mut shared = pool.try_borrow_mut().map_err(|_| BuildError::PoolBorrowed)?;
                let fresh: Vec<_> = self
                    .descriptors
                    .into_iter()
                    .filter(|descriptor| {
                        let known = shared.contains(descriptor.key());
                        if known {
                            tracing::debug!(
                                key = descriptor.key(),
                                "state already pooled; reusing shared registration"
                            );
                        }
                        !known
                    })
                    .collect();
                shared.register_pools(fresh)?;
                drop(shared);
                pool
            }
            None => {
                let mut pool = StatePool::with_settings(self.pool_settings.unwrap_or_default());
                pool.register_pools(self.descriptors)?;
                Rc::new(RefCell::new(pool))
            }
        };

        Ok(StateMachine::with_settings(pool, self.settings))
    }
}

impl<C: 'static, I: 'static> Default for MachineBuilder<C, I> {
    fn default() -> Self {
        Self::new()
    }
}
