//! Error types for the resource pool

use std::sync::Arc;
use thiserror::Error;

/// Error produced by a resource factory, shared so [`PoolError`] stays `Clone`
pub type FactoryError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Resource pool is closed")]
    Closed,

    #[error("Capacity {requested} is out of range (maximum is {max})")]
    CapacityOutOfRange { requested: usize, max: usize },

    /// The factory's own error, unchanged
    #[error(transparent)]
    Factory(FactoryError),

    #[error("Acquisition task ended without producing a resource")]
    AcquireAborted,
}

impl PoolError {
    /// Downcast a [`PoolError::Factory`] back to the factory's error type
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::PoolError;
    /// use std::io;
    /// use std::sync::Arc;
    ///
    /// let err = PoolError::Factory(Arc::new(io::Error::other("refused")));
    /// assert_eq!(err.factory_error::<io::Error>().unwrap().to_string(), "refused");
    /// assert!(PoolError::Closed.factory_error::<io::Error>().is_none());
    /// ```
    pub fn factory_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            PoolError::Factory(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
