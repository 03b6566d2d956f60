//! # Particle Record
//!
//! One live particle and its motion state.
//!
//! The motion fields are a tagged variant: a particle carries exactly the
//! state of the mode it was spawned under, so switching the emitter's mode
//! mid-flight leaves existing particles on their original trajectory.

use ember_shared::{Color4F, Vec2};

use crate::config::EmitterMode;

/// Mode-specific motion state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Gravity mode
    Gravity {
        /// Velocity (direction scaled by speed)
        dir: Vec2,
        /// Acceleration along the radial vector
        radial_accel: f32,
        /// Acceleration perpendicular to the radial vector
        tangential_accel: f32,
    },
    /// Radius mode
    Radius {
        /// Current angle in radians
        angle: f32,
        /// Angular velocity in degrees per second, signed
        degrees_per_second: f32,
        /// Current radius
        radius: f32,
        /// Radius at spawn
        start_radius: f32,
        /// Radius change per second of life
        delta_radius: f32,
    },
}

impl Motion {
    /// The mode this state belongs to.
    #[must_use]
    pub const fn mode(&self) -> EmitterMode {
        match self {
            Self::Gravity { .. } => EmitterMode::Gravity,
            Self::Radius { .. } => EmitterMode::Radius,
        }
    }
}

/// A single live particle.
///
/// `pos` is emitter-local; the engine resolves it into world space when it
/// publishes the particle to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Emitter-local position
    pub pos: Vec2,
    /// Emitter world position at spawn time
    pub start_pos: Vec2,
    /// Current colour
    pub color: Color4F,
    /// Colour change per second
    pub delta_color: Color4F,
    /// Current size, never negative
    pub size: f32,
    /// Size change per second
    pub delta_size: f32,
    /// Current rotation in degrees
    pub rotation: f32,
    /// Rotation change per second
    pub delta_rotation: f32,
    /// Remaining life in seconds
    pub time_to_live: f32,
    /// Total life drawn at spawn
    pub life: f32,
    /// Renderer-side slot; only valid within the frame that published it
    pub renderer_index: u32,
    /// Mode-specific state
    pub motion: Motion,
}

impl Particle {
    /// Advances motion and visual attributes by `dt`.
    ///
    /// `time_to_live` must already have been decremented for this frame.
    /// `reference` is the point gravity-mode particles accelerate away from
    /// and radius-mode particles orbit.
    pub fn integrate(&mut self, dt: f32, gravity: Vec2, reference: Vec2) {
        match &mut self.motion {
            Motion::Gravity {
                dir,
                radial_accel,
                tangential_accel,
            } => {
                // Zero-length radial vector at the reference point stays zero.
                let radial = (self.pos - reference).normalize_or_zero();
                let tangential = radial.perp();
                let accel = radial * *radial_accel + tangential * *tangential_accel + gravity;
                *dir += accel * dt;
                self.pos += *dir * dt;
            }
            Motion::Radius {
                angle,
                degrees_per_second,
                radius,
                start_radius,
                delta_radius,
            } => {
                *angle += degrees_per_second.to_radians() * dt;
                // Interpolated from the elapsed share of life so the end
                // radius is hit exactly when time_to_live reaches zero.
                *radius = *start_radius + *delta_radius * (self.life - self.time_to_live);
                self.pos = reference + Vec2::from_angle(*angle) * *radius;
            }
        }

        self.color += self.delta_color * dt;
        self.size = (self.size + self.delta_size * dt).max(0.0);
        self.rotation += self.delta_rotation * dt;
    }

    /// The mode this particle was spawned under.
    #[must_use]
    pub const fn mode(&self) -> EmitterMode {
        self.motion.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gravity_particle(pos: Vec2, dir: Vec2) -> Particle {
        Particle {
            pos,
            start_pos: Vec2::ZERO,
            color: Color4F::WHITE,
            delta_color: Color4F::TRANSPARENT,
            size: 1.0,
            delta_size: 0.0,
            rotation: 0.0,
            delta_rotation: 0.0,
            time_to_live: 1.0,
            life: 1.0,
            renderer_index: 0,
            motion: Motion::Gravity {
                dir,
                radial_accel: 0.0,
                tangential_accel: 0.0,
            },
        }
    }

    #[test]
    fn test_gravity_accelerates_direction() {
        let mut p = gravity_particle(Vec2::ZERO, Vec2::ZERO);
        p.integrate(0.5, Vec2::new(0.0, -10.0), Vec2::ZERO);
        // dir = -5 after the step, pos = dir * dt
        assert_eq!(p.pos, Vec2::new(0.0, -2.5));
    }

    #[test]
    fn test_radial_accel_at_reference_point_is_zero() {
        let mut p = gravity_particle(Vec2::ZERO, Vec2::ZERO);
        p.motion = Motion::Gravity {
            dir: Vec2::ZERO,
            radial_accel: 100.0,
            tangential_accel: 100.0,
        };
        p.integrate(0.1, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(p.pos, Vec2::ZERO);
        assert!(p.pos.x.is_finite());
    }

    #[test]
    fn test_radial_pushes_outward() {
        let mut p = gravity_particle(Vec2::new(2.0, 0.0), Vec2::ZERO);
        p.motion = Motion::Gravity {
            dir: Vec2::ZERO,
            radial_accel: 10.0,
            tangential_accel: 0.0,
        };
        p.integrate(0.1, Vec2::ZERO, Vec2::ZERO);
        assert!(p.pos.x > 2.0);
        assert_eq!(p.pos.y, 0.0);
    }

    #[test]
    fn test_size_floor_at_zero() {
        let mut p = gravity_particle(Vec2::ZERO, Vec2::ZERO);
        p.delta_size = -10.0;
        p.integrate(1.0, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(p.size, 0.0);
    }

    #[test]
    fn test_radius_mode_orbits_reference() {
        let mut p = gravity_particle(Vec2::ZERO, Vec2::ZERO);
        p.motion = Motion::Radius {
            angle: 0.0,
            degrees_per_second: -90.0,
            radius: 2.0,
            start_radius: 2.0,
            delta_radius: 0.0,
        };
        p.time_to_live = 0.0;
        p.integrate(1.0, Vec2::ZERO, Vec2::new(1.0, 1.0));
        // quarter turn clockwise around (1, 1) at radius 2
        assert!((p.pos.x - 1.0).abs() < 1e-5);
        assert!((p.pos.y + 1.0).abs() < 1e-5);
        assert_eq!(p.mode(), EmitterMode::Radius);
    }
}
