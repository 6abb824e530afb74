//! Core state types.
//!
//! This module contains what a behavior author works with:
//! - The `State` hook set every behavior implements
//! - The `StateContext` handed to each hook, through which transitions are requested
//! - The bounded transition journal a machine keeps

mod context;
mod history;
mod state;

pub use context::{RequestKind, StateContext, TransitionRequest};
pub(crate) use context::Target;
pub use history::{TransitionHistory, TransitionKind, TransitionRecord};
pub use state::{type_key, State};
