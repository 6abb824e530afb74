//! The `State` capability set every behavior implements.
//!
//! A state is a plain value drawn from a pool. The machine drives it through
//! six hooks, all no-ops by default, and hands every hook a
//! [`StateContext`] giving access to the host's context and input and
//! accepting transition requests.

use super::context::StateContext;
use crate::pool::{PoolDescriptor, Pooled};

/// Hooks for one behavior in a hierarchical state machine.
///
/// `C` is the host context a state reads and writes, `I` the input source it
/// polls. Neither is inspected by the machine.
///
/// Hook order, for a chain `A/B` (root `A`, sub-state `B`):
///
/// - entering: `A.init_sub_state` (which attaches and fully enters `B`),
///   then `A.enter`
/// - each tick: `A.update`, `B.update`, `B.check_switch_states`,
///   `A.check_switch_states`
/// - exiting: `B.exit`, then `A.exit`
///
/// # Example
///
/// ```rust
/// use statepool::{Pooled, State, StateContext};
///
/// struct Hud {
///     visible: bool,
/// }
///
/// struct Keys {
///     toggle: bool,
/// }
///
/// #[derive(Default)]
/// struct Shown;
///
/// impl Pooled for Shown {}
///
/// impl State<Hud, Keys> for Shown {
///     fn enter(&mut self, cx: &mut StateContext<'_, Hud, Keys>) {
///         cx.context_mut().visible = true;
///     }
///
///     fn check_switch_states(&mut self, cx: &mut StateContext<'_, Hud, Keys>) {
///         if cx.input().toggle {
///             cx.switch_state::<Hidden>();
///         }
///     }
/// }
///
/// #[derive(Default)]
/// struct Hidden;
///
/// impl Pooled for Hidden {}
///
/// impl State<Hud, Keys> for Hidden {
///     fn enter(&mut self, cx: &mut StateContext<'_, Hud, Keys>) {
///         cx.context_mut().visible = false;
///     }
/// }
/// ```
pub trait State<C, I>: Pooled {
    /// Called once the state (and any sub-state it attached) is in the chain.
    fn enter(&mut self, _cx: &mut StateContext<'_, C, I>) {}

    /// Called after every sub-state has exited, right before the state
    /// returns to its pool.
    fn exit(&mut self, _cx: &mut StateContext<'_, C, I>) {}

    /// Per-frame update, root to leaf.
    fn update(&mut self, _cx: &mut StateContext<'_, C, I>) {}

    /// Per-physics-step update, root to leaf.
    fn fixed_update(&mut self, _cx: &mut StateContext<'_, C, I>) {}

    /// Transition check, leaf to root, after the sub-chain has updated.
    fn check_switch_states(&mut self, _cx: &mut StateContext<'_, C, I>) {}

    /// Decide whether to attach a sub-state right away.
    fn init_sub_state(&mut self, _cx: &mut StateContext<'_, C, I>) {}
}

/// Default pool key for a type: its name without module path or generics.
///
/// Generic arguments are dropped, so `Wrapper<A>` and `Wrapper<B>` share the
/// key `"Wrapper"` and registering both fails with
/// [`PoolError::DuplicateKey`](crate::PoolError::DuplicateKey). Pool such
/// types under explicit keys with [`PoolDescriptor::new`] and address them
/// through `start_keyed`, `switch_state_keyed` or `set_sub_state_keyed`.
pub fn type_key<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<C: 'static, I: 'static> PoolDescriptor<dyn State<C, I>> {
    /// Descriptor for `T` under its [`type_key`], built with `T::default()`.
    pub fn state<T>(default_capacity: usize) -> Self
    where
        T: State<C, I> + Default,
    {
        Self::new(type_key::<T>(), default_capacity, || -> Box<dyn State<C, I>> {
            Box::new(T::default())
        })
    }

    /// Descriptor for `T` under its [`type_key`], built with `make`.
    pub fn state_with<T, F>(default_capacity: usize, make: F) -> Self
    where
        T: State<C, I>,
        F: Fn() -> T + 'static,
    {
        Self::new(type_key::<T>(), default_capacity, move || -> Box<dyn State<C, I>> {
            Box::new(make())
        })
    }
}
