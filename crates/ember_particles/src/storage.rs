//! # Particle Storage
//!
//! Fixed-capacity buffer that keeps live particles packed in a dense
//! prefix `[0, len)`.
//!
//! ## Design
//!
//! Memory is reserved once, when the buffer is built. After that:
//! - `push` never reallocates (it refuses once full)
//! - retirement is swap-to-end, O(1), and does not preserve order
//! - nothing is freed until the buffer itself is replaced

use crate::error::{ParticleError, ParticleResult};
use crate::particle::Particle;

/// Dense, fixed-capacity particle array.
///
/// # Thread Safety
///
/// Not thread-safe. One buffer belongs to one emitter.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    /// Live particles; `len` is the live count.
    particles: Vec<Particle>,
    /// Logical capacity (the allocation may be larger).
    capacity: usize,
}

impl ParticleBuffer {
    /// Creates an empty buffer able to hold `capacity` particles.
    ///
    /// All memory is reserved upfront.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Allocation`] if the reservation fails or its byte
    /// size overflows.
    pub fn with_capacity(capacity: usize) -> ParticleResult<Self> {
        let mut particles = Vec::new();
        particles
            .try_reserve_exact(capacity)
            .map_err(|source| ParticleError::Allocation {
                requested: capacity,
                source,
            })?;

        Ok(Self { particles, capacity })
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live particles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when no particle is alive.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// True when `len >= capacity` (always true for a zero-capacity buffer).
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Appends a particle at slot `len`.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    ///
    /// # Returns
    ///
    /// The slot index, or None if the buffer is full.
    pub fn push(&mut self, particle: Particle) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.particles.len();
        self.particles.push(particle);
        Some(index)
    }

    /// Retires the particle at `index` by moving the last live particle into
    /// its slot.
    ///
    /// The moved particle inherits the vacated slot's renderer index.
    ///
    /// # Returns
    ///
    /// The renderer index that is no longer in use, or None if `index` is
    /// out of range.
    pub fn swap_retire(&mut self, index: usize) -> Option<u32> {
        if index >= self.particles.len() {
            return None;
        }
        let last = self.particles.len() - 1;
        let released = self.particles[last].renderer_index;
        let vacated = self.particles[index].renderer_index;
        self.particles.swap_remove(index);
        if index < last {
            self.particles[index].renderer_index = vacated;
        }
        Some(released)
    }

    /// Drops every live particle. Capacity is kept.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// The live particles, `[0, len)`.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to one live particle.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Motion;
    use ember_shared::{Color4F, Vec2};

    fn particle(ttl: f32, renderer_index: u32) -> Particle {
        Particle {
            pos: Vec2::ZERO,
            start_pos: Vec2::ZERO,
            color: Color4F::WHITE,
            delta_color: Color4F::TRANSPARENT,
            size: 1.0,
            delta_size: 0.0,
            rotation: 0.0,
            delta_rotation: 0.0,
            time_to_live: ttl,
            life: ttl,
            renderer_index,
            motion: Motion::Gravity {
                dir: Vec2::ZERO,
                radial_accel: 0.0,
                tangential_accel: 0.0,
            },
        }
    }

    #[test]
    fn test_push_until_full() {
        let mut buffer = ParticleBuffer::with_capacity(2).unwrap();
        assert_eq!(buffer.push(particle(1.0, 0)), Some(0));
        assert_eq!(buffer.push(particle(1.0, 1)), Some(1));
        assert!(buffer.is_full());
        assert_eq!(buffer.push(particle(1.0, 2)), None);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_full() {
        let buffer = ParticleBuffer::with_capacity(0).unwrap();
        assert!(buffer.is_full());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_swap_retire_keeps_prefix_dense() {
        let mut buffer = ParticleBuffer::with_capacity(3).unwrap();
        buffer.push(particle(1.0, 0));
        buffer.push(particle(2.0, 1));
        buffer.push(particle(3.0, 2));

        let released = buffer.swap_retire(0).unwrap();
        assert_eq!(released, 2);
        assert_eq!(buffer.len(), 2);
        // Last particle moved into slot 0 and took over its renderer index
        assert_eq!(buffer.as_slice()[0].time_to_live, 3.0);
        assert_eq!(buffer.as_slice()[0].renderer_index, 0);
        assert_eq!(buffer.as_slice()[1].renderer_index, 1);
    }

    #[test]
    fn test_swap_retire_last() {
        let mut buffer = ParticleBuffer::with_capacity(2).unwrap();
        buffer.push(particle(1.0, 0));
        buffer.push(particle(2.0, 1));
        assert_eq!(buffer.swap_retire(1), Some(1));
        assert_eq!(buffer.swap_retire(5), None);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        match ParticleBuffer::with_capacity(usize::MAX) {
            Err(ParticleError::Allocation { requested, .. }) => assert_eq!(requested, usize::MAX),
            other => panic!("expected allocation error, got {other:?}"),
        }
    }
}
