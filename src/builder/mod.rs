//! Builder API for ergonomic state machine construction.
//!
//! [`MachineBuilder`] collects the state pools a machine draws from and the
//! machine's settings, then registers the pools and builds the machine in
//! one step.
//!
//! # Example
//!
//! ```rust
//! use statepool::builder::MachineBuilder;
//! use statepool::{Pooled, State};
//!
//! #[derive(Default)]
//! struct Patrol;
//! impl Pooled for Patrol {}
//! impl State<(), ()> for Patrol {}
//!
//! let mut machine = MachineBuilder::<(), ()>::new()
//!     .state::<Patrol>(1)
//!     .history_capacity(8)
//!     .build()
//!     .unwrap();
//!
//! machine.start::<Patrol>(&mut (), &()).unwrap();
//! assert_eq!(machine.describe_hierarchy(), "Patrol");
//! ```

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::MachineBuilder;
