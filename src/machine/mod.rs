//! The hierarchical state machine.
//!
//! A [`StateMachine`] owns one active chain of states and drives it through
//! the enter, tick and exit protocols. States are acquired from and released
//! to a [`StatePool`], which may be shared between machines.

mod hfsm;
mod id;

pub use hfsm::{MachineStatus, SharedStatePool, StateMachine, StatePool, HIERARCHY_SEPARATOR};
pub use id::MachineId;
