//! # EMBER Particles
//!
//! CPU particle engine for real-time effects (explosions, sparks, ambient
//! motion).
//!
//! ## Design Principles
//!
//! 1. **Fixed capacity** - storage is reserved once; the frame loop never allocates
//! 2. **Dense packing** - live particles always occupy `[0, count)`, retirement is swap-to-end
//! 3. **Deterministic** - every random draw comes from an injected, seeded generator
//! 4. **Renderer agnostic** - resolved particles are pushed to a [`ParticleRenderer`]
//!
//! ## Motion Models
//!
//! - **Gravity**: velocity + gravity + radial/tangential acceleration
//! - **Radius**: polar motion (angle + radius) around the source position
//!
//! The model is recorded per particle, so switching an emitter's mode never
//! disturbs particles already in flight.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_particles::{ParticleSystem, RenderedParticle};
//!
//! let mut sparks = ParticleSystem::with_seed(256, 7)?;
//! sparks.set_emission_rate(60.0)?;
//! sparks.set_life(0.8, 0.2)?;
//! sparks.set_blend_additive(true);
//! sparks.start_system();
//!
//! // Once per frame
//! sparks.update(dt, &mut |p: &RenderedParticle| batch.push(*p))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod blend;
pub mod config;
pub mod error;
pub mod particle;
pub mod renderer;
pub mod rng;
pub mod storage;
pub mod system;

pub use blend::{BlendFactor, BlendFunc, BlendMode, TextureHandle};
pub use config::{
    EmitterConfig, EmitterMode, GravityModeConfig, PositionType, RadiusModeConfig, DEFAULT_CAPACITY,
    MAX_CAPACITY,
};
pub use error::{ParticleError, ParticleResult};
pub use particle::{Motion, Particle};
pub use renderer::{FrameCollector, FrameInfo, NullRenderer, ParticleRenderer, RenderedParticle};
pub use rng::VarianceRng;
pub use storage::ParticleBuffer;
pub use system::{EmitterState, FrameReport, ParticleSystem, SpawnOutcome};

pub use ember_shared::{Color4F, Transform2D, Vec2};
