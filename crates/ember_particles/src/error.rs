//! # Particle Engine Error Types
//!
//! All errors that can occur while configuring or stepping a particle system.
//! A "buffer full" spawn is NOT an error; see [`crate::SpawnOutcome::Full`].

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur in the particle engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    /// A template parameter is out of range or not finite.
    #[error("invalid emitter template: {parameter} = {value} ({reason})")]
    InvalidTemplate {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The frame delta handed to `update` was negative or not finite.
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f32),

    /// Requested capacity is above the engine limit.
    #[error("capacity {requested} exceeds the maximum of {max} particles")]
    CapacityTooLarge {
        /// Requested particle count.
        requested: u64,
        /// The engine limit.
        max: usize,
    },

    /// Particle storage could not be allocated.
    #[error("failed to allocate storage for {requested} particles")]
    Allocation {
        /// Requested particle count.
        requested: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
}

impl ParticleError {
    /// Shorthand for [`ParticleError::InvalidTemplate`].
    #[must_use]
    pub fn invalid(parameter: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
        Self::InvalidTemplate {
            parameter,
            value: value.into(),
            reason,
        }
    }
}

/// Result type for particle engine operations.
pub type ParticleResult<T> = Result<T, ParticleError>;
