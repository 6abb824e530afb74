//! Statepool: a hierarchical state machine over pooled states
//!
//! Statepool pairs a keyed object pool with a hierarchical finite-state
//! machine that draws its states from that pool. A host loop can switch
//! between nested behavior states every frame without allocating once the
//! pool is warm.
//!
//! # Core Concepts
//!
//! - **Pool**: `KeyedPool` keeps one free list per key, with activation hooks via `Pooled`
//! - **State**: behaviors implement the `State` hooks and request transitions
//!   through `StateContext`
//! - **Machine**: `StateMachine` owns the active chain (a root plus nested sub-states)
//!   and drives the enter, tick and exit protocols
//! - **History**: a bounded journal of every transition a machine performed
//!
//! # Example
//!
//! ```rust
//! use statepool::{MachineBuilder, Pooled, State, StateContext};
//!
//! struct Lamp {
//!     lit: bool,
//! }
//!
//! struct Switch {
//!     pressed: bool,
//! }
//!
//! #[derive(Default)]
//! struct Off;
//! impl Pooled for Off {}
//! impl State<Lamp, Switch> for Off {
//!     fn enter(&mut self, cx: &mut StateContext<'_, Lamp, Switch>) {
//!         cx.context_mut().lit = false;
//!     }
//!
//!     fn check_switch_states(&mut self, cx: &mut StateContext<'_, Lamp, Switch>) {
//!         if cx.input().pressed {
//!             cx.switch_state::<On>();
//!         }
//!     }
//! }
//!
//! #[derive(Default)]
//! struct On;
//! impl Pooled for On {}
//! impl State<Lamp, Switch> for On {
//!     fn enter(&mut self, cx: &mut StateContext<'_, Lamp, Switch>) {
//!         cx.context_mut().lit = true;
//!     }
//! }
//!
//! let mut machine = MachineBuilder::<Lamp, Switch>::new()
//!     .state::<Off>(1)
//!     .state::<On>(1)
//!     .build()
//!     .unwrap();
//!
//! let mut lamp = Lamp { lit: true };
//! machine.start::<Off>(&mut lamp, &Switch { pressed: false }).unwrap();
//! assert!(!lamp.lit);
//!
//! machine.update(&mut lamp, &Switch { pressed: true });
//! assert!(lamp.lit);
//! assert_eq!(machine.describe_hierarchy(), "On");
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod pool;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use config::{ConfigError, MachineSettings, PoolSettings};
pub use core::{
    type_key, RequestKind, State, StateContext, TransitionHistory, TransitionKind,
    TransitionRecord, TransitionRequest,
};
pub use machine::{
    MachineId, MachineStatus, SharedStatePool, StateMachine, StatePool, HIERARCHY_SEPARATOR,
};
pub use pool::{AsAny, KeyedPool, PoolDescriptor, PoolError, PoolGuard, PoolStats, Pooled};
