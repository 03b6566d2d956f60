//! # Effect Presets
//!
//! Each effect kind is a stack of emitter layers started together. Every
//! layer emits for a short window and asks to be removed once drained, so an
//! effect finishes on its own.
//!
//! | Kind | Layers | Live limit |
//! |------|--------|------------|
//! | [`EffectKind::SmallExplosion`] | flash, debris | 32 |
//! | [`EffectKind::BigExplosion`] | flash, shockwave, debris, smoke | 8 |

use std::fmt;

use ember_particles::{Color4F, EmitterConfig, EmitterMode, GravityModeConfig, RadiusModeConfig, Vec2};

/// Canned effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Two-layer hit spark
    SmallExplosion,
    /// Four-layer blast with shockwave and smoke
    BigExplosion,
}

impl EffectKind {
    /// Every kind, in pool order.
    pub const ALL: [Self; 2] = [Self::SmallExplosion, Self::BigExplosion];

    /// Maximum simultaneously live effects of this kind.
    #[must_use]
    pub const fn live_limit(self) -> usize {
        match self {
            Self::SmallExplosion => 32,
            Self::BigExplosion => 8,
        }
    }

    /// Emitter templates for each layer, bottom first.
    #[must_use]
    pub fn layers(self) -> Vec<EmitterConfig> {
        match self {
            Self::SmallExplosion => vec![flash(24, 40.0), debris(32, 160.0)],
            Self::BigExplosion => vec![flash(48, 90.0), shockwave(), debris(64, 260.0), smoke()],
        }
    }

    /// Position in [`EffectKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::SmallExplosion => 0,
            Self::BigExplosion => 1,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmallExplosion => write!(f, "small explosion"),
            Self::BigExplosion => write!(f, "big explosion"),
        }
    }
}

/// A burst: emits `capacity` particles over 0.1 s.
fn burst(capacity: usize) -> EmitterConfig {
    EmitterConfig {
        capacity: Some(capacity as i64),
        emission_rate: capacity as f32 * 10.0,
        duration: Some(0.1),
        angle: 0.0,
        angle_var: 180.0,
        auto_remove_on_finish: true,
        ..EmitterConfig::default()
    }
}

fn flash(capacity: usize, size: f32) -> EmitterConfig {
    EmitterConfig {
        life: 0.25,
        life_var: 0.05,
        start_size: size,
        start_size_var: size * 0.25,
        end_size: Some(size * 0.25),
        start_color: Color4F::new(1.0, 0.95, 0.7, 1.0),
        end_color: Color4F::new(1.0, 0.45, 0.1, 0.0),
        gravity: GravityModeConfig {
            speed: 30.0,
            speed_var: 10.0,
            ..GravityModeConfig::default()
        },
        blend_additive: true,
        ..burst(capacity)
    }
}

fn debris(capacity: usize, speed: f32) -> EmitterConfig {
    EmitterConfig {
        life: 0.6,
        life_var: 0.2,
        start_size: 6.0,
        start_size_var: 2.0,
        end_size: Some(1.0),
        start_color: Color4F::new(1.0, 0.75, 0.25, 1.0),
        start_color_var: Color4F::new(0.0, 0.1, 0.1, 0.0),
        end_color: Color4F::new(0.6, 0.1, 0.0, 0.0),
        start_spin_var: 180.0,
        end_spin: 720.0,
        end_spin_var: 180.0,
        gravity: GravityModeConfig {
            gravity: Vec2::new(0.0, -200.0),
            speed,
            speed_var: speed * 0.25,
            rotation_is_dir: true,
            ..GravityModeConfig::default()
        },
        blend_additive: true,
        ..burst(capacity)
    }
}

fn shockwave() -> EmitterConfig {
    EmitterConfig {
        life: 0.5,
        life_var: 0.05,
        start_size: 16.0,
        end_size: Some(4.0),
        start_color: Color4F::new(1.0, 0.9, 0.8, 0.8),
        end_color: Color4F::new(1.0, 0.6, 0.3, 0.0),
        mode: EmitterMode::Radius,
        radius: RadiusModeConfig {
            start_radius: 10.0,
            start_radius_var: 2.0,
            end_radius: Some(120.0),
            end_radius_var: 20.0,
            rotate_per_second: 30.0,
            rotate_per_second_var: 30.0,
        },
        blend_additive: true,
        ..burst(64)
    }
}

fn smoke() -> EmitterConfig {
    EmitterConfig {
        emission_rate: 160.0,
        duration: Some(0.2),
        life: 1.5,
        life_var: 0.5,
        angle: 90.0,
        angle_var: 60.0,
        start_size: 30.0,
        start_size_var: 8.0,
        end_size: Some(60.0),
        start_color: Color4F::new(0.3, 0.3, 0.3, 0.6),
        end_color: Color4F::new(0.2, 0.2, 0.2, 0.0),
        gravity: GravityModeConfig {
            gravity: Vec2::new(0.0, 15.0),
            speed: 20.0,
            speed_var: 10.0,
            ..GravityModeConfig::default()
        },
        ..burst(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_layer_is_valid_and_self_removing() {
        for kind in EffectKind::ALL {
            let layers = kind.layers();
            assert!(!layers.is_empty());
            for layer in layers {
                assert!(layer.validate().is_ok(), "{kind}: {layer:?}");
                assert!(layer.auto_remove_on_finish);
                assert!(layer.duration.is_some());
            }
        }
    }

    #[test]
    fn test_index_matches_all() {
        for (i, kind) in EffectKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_big_explosion_has_a_radius_layer() {
        assert!(EffectKind::BigExplosion
            .layers()
            .iter()
            .any(|l| l.mode == EmitterMode::Radius));
    }
}
