//! # Effect Error Types

use ember_particles::ParticleError;
use thiserror::Error;

use crate::presets::EffectKind;

/// Errors that can occur while spawning or stepping effects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// Too many live effects of one kind.
    #[error("live limit reached for {kind}: {limit}")]
    LiveLimitReached {
        /// The kind that was requested.
        kind: EffectKind,
        /// Its live limit.
        limit: usize,
    },

    /// An emitter layer failed.
    #[error("particle engine error: {0}")]
    Particle(#[from] ParticleError),
}

/// Result type for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;
