//! # Emitter Templates
//!
//! The base +/- variance parameters every new particle is drawn from.
//!
//! An [`EmitterConfig`] is plain data: a config loader fills it from whatever
//! format it likes (it derives `serde`), then hands it to
//! [`ParticleSystem::apply_config`](crate::ParticleSystem::apply_config).
//! Missing fields fall back to the defaults below.
//!
//! ## Defaults
//!
//! | Parameter | Default |
//! |-----------|---------|
//! | capacity | keep the engine's current capacity ([`DEFAULT_CAPACITY`] for a new engine) |
//! | emission rate | [`DEFAULT_EMISSION_RATE`] particles/s |
//! | life | [`DEFAULT_LIFE`] s, no variance |
//! | angle | [`DEFAULT_ANGLE`] degrees (straight up) |
//! | size | 1 → same as start |
//! | colour | opaque white → transparent white |
//! | duration | infinite |
//! | mode / positioning | gravity / free |
//!
//! Angles are degrees. Radius-mode rotation is degrees per second and may be
//! negative (clockwise).

use ember_shared::{Color4F, Vec2};
use serde::{Deserialize, Serialize};

use crate::blend::TextureHandle;
use crate::error::{ParticleError, ParticleResult};

/// Default emission rate (particles per second).
pub const DEFAULT_EMISSION_RATE: f32 = 10.0;
/// Default particle life in seconds.
pub const DEFAULT_LIFE: f32 = 1.0;
/// Default spawn angle in degrees.
pub const DEFAULT_ANGLE: f32 = 90.0;
/// Default start size.
pub const DEFAULT_SIZE: f32 = 1.0;
/// Capacity used when a config built from scratch names none.
pub const DEFAULT_CAPACITY: usize = 100;
/// Hard limit on particles per emitter.
pub const MAX_CAPACITY: usize = 1_000_000;

/// Motion model used for particles spawned from now on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterMode {
    /// Direction + gravity + radial/tangential acceleration
    #[default]
    Gravity,
    /// Polar motion (angle + radius) around the source position
    Radius,
}

/// How live particles relate to the emitter's transform after spawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    /// Decoupled: stays where the emitter was at spawn time
    #[default]
    Free,
    /// Follows the emitter's translation
    Relative,
    /// Rigidly attached: translation, rotation and scale
    Grouped,
}

/// Gravity-mode template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityModeConfig {
    /// Constant acceleration applied to every particle
    pub gravity: Vec2,
    /// Initial speed along the spawn angle
    pub speed: f32,
    /// Speed variance
    pub speed_var: f32,
    /// Acceleration perpendicular to the radial vector
    pub tangential_accel: f32,
    /// Tangential acceleration variance
    pub tangential_accel_var: f32,
    /// Acceleration away from the source position
    pub radial_accel: f32,
    /// Radial acceleration variance
    pub radial_accel_var: f32,
    /// Initial rotation follows the direction of travel
    pub rotation_is_dir: bool,
}

impl Default for GravityModeConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            speed: 0.0,
            speed_var: 0.0,
            tangential_accel: 0.0,
            tangential_accel_var: 0.0,
            radial_accel: 0.0,
            radial_accel_var: 0.0,
            rotation_is_dir: false,
        }
    }
}

/// Radius-mode template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusModeConfig {
    /// Radius at spawn
    pub start_radius: f32,
    /// Start radius variance
    pub start_radius_var: f32,
    /// Radius at death; `None` keeps the start radius
    pub end_radius: Option<f32>,
    /// End radius variance
    pub end_radius_var: f32,
    /// Degrees per second, signed
    pub rotate_per_second: f32,
    /// Rotation variance
    pub rotate_per_second_var: f32,
}

impl Default for RadiusModeConfig {
    fn default() -> Self {
        Self {
            start_radius: 0.0,
            start_radius_var: 0.0,
            end_radius: None,
            end_radius_var: 0.0,
            rotate_per_second: 0.0,
            rotate_per_second_var: 0.0,
        }
    }
}

/// Complete emitter template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Maximum particle count; `None` keeps the current capacity
    pub capacity: Option<i64>,
    /// Particles per second
    pub emission_rate: f32,
    /// Emission window in seconds; `None` emits forever
    pub duration: Option<f32>,
    /// Particle life in seconds
    pub life: f32,
    /// Life variance
    pub life_var: f32,
    /// Spawn angle in degrees
    pub angle: f32,
    /// Spawn angle variance
    pub angle_var: f32,
    /// Local spawn origin, also the reference point for both motion modes
    pub source_position: Vec2,
    /// Per-axis spawn jitter
    pub pos_var: Vec2,
    /// Size at spawn
    pub start_size: f32,
    /// Start size variance
    pub start_size_var: f32,
    /// Size at death; `None` keeps the start size
    pub end_size: Option<f32>,
    /// End size variance
    pub end_size_var: f32,
    /// Colour at spawn
    pub start_color: Color4F,
    /// Start colour variance, per channel
    pub start_color_var: Color4F,
    /// Colour at death
    pub end_color: Color4F,
    /// End colour variance, per channel
    pub end_color_var: Color4F,
    /// Rotation at spawn, degrees
    pub start_spin: f32,
    /// Start spin variance
    pub start_spin_var: f32,
    /// Rotation at death, degrees
    pub end_spin: f32,
    /// End spin variance
    pub end_spin_var: f32,
    /// Motion model for new particles
    pub mode: EmitterMode,
    /// Gravity-mode parameters
    pub gravity: GravityModeConfig,
    /// Radius-mode parameters
    pub radius: RadiusModeConfig,
    /// Position coupling
    pub position_type: PositionType,
    /// Additive blending
    pub blend_additive: bool,
    /// Texture forwarded to the renderer
    pub texture: Option<TextureHandle>,
    /// Ask the owner to remove the emitter once it has finished
    pub auto_remove_on_finish: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            emission_rate: DEFAULT_EMISSION_RATE,
            duration: None,
            life: DEFAULT_LIFE,
            life_var: 0.0,
            angle: DEFAULT_ANGLE,
            angle_var: 0.0,
            source_position: Vec2::ZERO,
            pos_var: Vec2::ZERO,
            start_size: DEFAULT_SIZE,
            start_size_var: 0.0,
            end_size: None,
            end_size_var: 0.0,
            start_color: Color4F::WHITE,
            start_color_var: Color4F::TRANSPARENT,
            end_color: Color4F::new(1.0, 1.0, 1.0, 0.0),
            end_color_var: Color4F::TRANSPARENT,
            start_spin: 0.0,
            start_spin_var: 0.0,
            end_spin: 0.0,
            end_spin_var: 0.0,
            mode: EmitterMode::Gravity,
            gravity: GravityModeConfig::default(),
            radius: RadiusModeConfig::default(),
            position_type: PositionType::Free,
            blend_additive: false,
            texture: None,
            auto_remove_on_finish: false,
        }
    }
}

fn finite(parameter: &'static str, value: f32) -> ParticleResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParticleError::invalid(parameter, value, "must be finite"))
    }
}

fn finite_vec(parameter: &'static str, value: Vec2) -> ParticleResult<()> {
    finite(parameter, value.x)?;
    finite(parameter, value.y)
}

fn finite_color(parameter: &'static str, value: Color4F) -> ParticleResult<()> {
    for channel in value.to_array() {
        finite(parameter, channel)?;
    }
    Ok(())
}

impl EmitterConfig {
    /// Checks every template invariant.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidTemplate`] naming the first offending
    /// parameter, or [`ParticleError::CapacityTooLarge`].
    pub fn validate(&self) -> ParticleResult<()> {
        if let Some(capacity) = self.capacity {
            Self::checked_capacity(capacity)?;
        }

        finite("emission_rate", self.emission_rate)?;
        if self.emission_rate < 0.0 {
            return Err(ParticleError::invalid("emission_rate", self.emission_rate, "must not be negative"));
        }

        if let Some(duration) = self.duration {
            finite("duration", duration)?;
            if duration < 0.0 {
                return Err(ParticleError::invalid("duration", duration, "must not be negative"));
            }
        }

        // Every drawn life must stay strictly positive: life - life_var > 0.
        finite("life", self.life)?;
        if self.life <= 0.0 {
            return Err(ParticleError::invalid("life", self.life, "must be positive"));
        }
        finite("life_var", self.life_var)?;
        if self.life_var < 0.0 || self.life_var >= self.life {
            return Err(ParticleError::invalid("life_var", self.life_var, "must be in [0, life)"));
        }

        finite("angle", self.angle)?;
        finite("angle_var", self.angle_var)?;
        finite_vec("source_position", self.source_position)?;
        finite_vec("pos_var", self.pos_var)?;
        finite("start_size", self.start_size)?;
        finite("start_size_var", self.start_size_var)?;
        if let Some(end_size) = self.end_size {
            finite("end_size", end_size)?;
        }
        finite("end_size_var", self.end_size_var)?;
        finite_color("start_color", self.start_color)?;
        finite_color("start_color_var", self.start_color_var)?;
        finite_color("end_color", self.end_color)?;
        finite_color("end_color_var", self.end_color_var)?;
        finite("start_spin", self.start_spin)?;
        finite("start_spin_var", self.start_spin_var)?;
        finite("end_spin", self.end_spin)?;
        finite("end_spin_var", self.end_spin_var)?;

        let g = &self.gravity;
        finite_vec("gravity", g.gravity)?;
        finite("speed", g.speed)?;
        finite("speed_var", g.speed_var)?;
        finite("tangential_accel", g.tangential_accel)?;
        finite("tangential_accel_var", g.tangential_accel_var)?;
        finite("radial_accel", g.radial_accel)?;
        finite("radial_accel_var", g.radial_accel_var)?;

        let r = &self.radius;
        finite("start_radius", r.start_radius)?;
        finite("start_radius_var", r.start_radius_var)?;
        if let Some(end_radius) = r.end_radius {
            finite("end_radius", end_radius)?;
        }
        finite("end_radius_var", r.end_radius_var)?;
        finite("rotate_per_second", r.rotate_per_second)?;
        finite("rotate_per_second_var", r.rotate_per_second_var)?;

        Ok(())
    }

    /// Converts a loader-supplied capacity into a storage size.
    ///
    /// # Errors
    ///
    /// Negative values are [`ParticleError::InvalidTemplate`]; values above
    /// [`MAX_CAPACITY`] are [`ParticleError::CapacityTooLarge`].
    pub fn checked_capacity(capacity: i64) -> ParticleResult<usize> {
        if capacity < 0 {
            return Err(ParticleError::InvalidTemplate {
                parameter: "capacity",
                value: capacity as f64,
                reason: "must not be negative",
            });
        }
        let requested = capacity.unsigned_abs();
        match usize::try_from(requested) {
            Ok(n) if n <= MAX_CAPACITY => Ok(n),
            _ => Err(ParticleError::CapacityTooLarge {
                requested,
                max: MAX_CAPACITY,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EmitterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_life_must_be_positive() {
        let config = EmitterConfig {
            life: 0.0,
            ..Default::default()
        };
        match config.validate() {
            Err(ParticleError::InvalidTemplate { parameter, .. }) => assert_eq!(parameter, "life"),
            other => panic!("expected life error, got {other:?}"),
        }
    }

    #[test]
    fn test_life_var_cannot_reach_zero() {
        let config = EmitterConfig {
            life: 1.0,
            life_var: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EmitterConfig {
            life: 1.0,
            life_var: 0.99,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capacity_range() {
        assert_eq!(EmitterConfig::checked_capacity(10), Ok(10));
        assert!(matches!(
            EmitterConfig::checked_capacity(-1),
            Err(ParticleError::InvalidTemplate { parameter: "capacity", .. })
        ));
        assert!(matches!(
            EmitterConfig::checked_capacity(i64::MAX),
            Err(ParticleError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut config = EmitterConfig::default();
        config.gravity.gravity = Vec2::new(f32::NAN, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ParticleError::InvalidTemplate { parameter: "gravity", .. })
        ));

        let config = EmitterConfig {
            end_color_var: Color4F::new(0.0, f32::INFINITY, 0.0, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ParticleError::InvalidTemplate { parameter: "end_color_var", .. })
        ));

        let config = EmitterConfig {
            duration: Some(-1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
