//! # EMBER Effects
//!
//! Canned one-shot effects (small and big explosions) on top of the
//! particle engine, with per-kind pools so the engines behind finished
//! effects are recycled instead of rebuilt.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_effects::EffectManager;
//! use ember_shared::Vec2;
//!
//! let mut effects = EffectManager::new(seed);
//! effects.create_big_explosion(Vec2::new(120.0, 40.0))?;
//!
//! // Once per frame
//! effects.update(dt, &mut sprite_batch)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod manager;
pub mod presets;

pub use error::{EffectError, EffectResult};
pub use manager::{EffectId, EffectManager};
pub use presets::EffectKind;
