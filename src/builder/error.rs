//! Errors raised while building a machine.

use crate::pool::PoolError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to register state pools: {0}")]
    Pool(#[from] PoolError),

    #[error("shared pool is borrowed elsewhere. Release it before calling .build()")]
    PoolBorrowed,

    #[error("pool settings only apply to an owned pool. Configure a shared pool when creating it")]
    SettingsWithSharedPool,
}
