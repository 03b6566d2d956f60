//! # Renderer Boundary
//!
//! The engine never builds geometry. Once per frame it hands the renderer:
//! 1. a [`FrameInfo`] header (count, blend state, texture, storage generation)
//! 2. one [`RenderedParticle`] per live particle, in world space
//! 3. the renderer indices that stopped being used this frame
//!
//! Nothing handed over may be retained past the frame: storage is rewritten
//! in place on the next update.

use bytemuck::{Pod, Zeroable};
use ember_shared::{Color4F, Vec2};

use crate::blend::{BlendFunc, TextureHandle};

/// Resolved per-particle attributes, ready for a vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderedParticle {
    /// World-space position
    pub position: Vec2,
    /// Colour, pre-multiplied when the frame says so
    pub color: Color4F,
    /// Size, never negative
    pub size: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Slot in the renderer's index table for this frame
    pub renderer_index: u32,
}

impl RenderedParticle {
    /// Size in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Per-frame header sent before any particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Number of particles about to be drawn
    pub particle_count: usize,
    /// Storage capacity
    pub capacity: usize,
    /// Bumped whenever storage is reallocated; index tables from an older
    /// generation are stale
    pub generation: u32,
    /// Blend factors for this frame
    pub blend_func: BlendFunc,
    /// Whether colours carry RGB multiplied by alpha
    pub opacity_modify_rgb: bool,
    /// Texture to sample, if any
    pub texture: Option<TextureHandle>,
}

/// Consumer of resolved particles.
///
/// Only [`draw_particle`](Self::draw_particle) is required. Any
/// `FnMut(&RenderedParticle)` closure is a renderer.
pub trait ParticleRenderer {
    /// Called once per frame before any particle.
    fn begin_frame(&mut self, _info: &FrameInfo) {}

    /// Called once per live particle per frame.
    fn draw_particle(&mut self, particle: &RenderedParticle);

    /// A renderer index is no longer backed by a live particle.
    fn release_index(&mut self, _index: u32) {}

    /// Called once per frame after the last particle.
    fn end_frame(&mut self) {}
}

impl<F> ParticleRenderer for F
where
    F: FnMut(&RenderedParticle),
{
    fn draw_particle(&mut self, particle: &RenderedParticle) {
        self(particle);
    }
}

/// Renderer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl ParticleRenderer for NullRenderer {
    fn draw_particle(&mut self, _particle: &RenderedParticle) {}
}

/// Renderer that keeps a copy of the most recent frame.
///
/// Useful for tests and for CPU-side batching that uploads after the update.
#[derive(Debug, Clone, Default)]
pub struct FrameCollector {
    /// Header of the last frame
    pub info: Option<FrameInfo>,
    /// Particles of the last frame, in publish order
    pub particles: Vec<RenderedParticle>,
    /// Indices released during the last frame
    pub released: Vec<u32>,
    /// Completed frames
    pub frames: u64,
}

impl FrameCollector {
    /// Creates an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last frame's particles as raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}

impl ParticleRenderer for FrameCollector {
    fn begin_frame(&mut self, info: &FrameInfo) {
        self.info = Some(*info);
        self.particles.clear();
        self.released.clear();
    }

    fn draw_particle(&mut self, particle: &RenderedParticle) {
        self.particles.push(*particle);
    }

    fn release_index(&mut self, index: u32) {
        self.released.push(index);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendMode;

    #[test]
    fn test_rendered_particle_size() {
        assert_eq!(RenderedParticle::SIZE, 36);
    }

    #[test]
    fn test_closure_is_renderer() {
        let mut count = 0;
        {
            let mut renderer = |_: &RenderedParticle| count += 1;
            renderer.begin_frame(&FrameInfo {
                particle_count: 2,
                capacity: 4,
                generation: 0,
                blend_func: BlendMode::Alpha.blend_func(),
                opacity_modify_rgb: false,
                texture: None,
            });
            renderer.draw_particle(&RenderedParticle::default());
            renderer.draw_particle(&RenderedParticle::default());
            renderer.end_frame();
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_collector_resets_each_frame() {
        let info = FrameInfo {
            particle_count: 1,
            capacity: 1,
            generation: 3,
            blend_func: BlendMode::Additive.blend_func(),
            opacity_modify_rgb: false,
            texture: None,
        };
        let mut collector = FrameCollector::new();
        for _ in 0..2 {
            collector.begin_frame(&info);
            collector.draw_particle(&RenderedParticle::default());
            collector.release_index(5);
            collector.end_frame();
        }
        assert_eq!(collector.particles.len(), 1);
        assert_eq!(collector.released, vec![5]);
        assert_eq!(collector.frames, 2);
        assert_eq!(collector.as_bytes().len(), RenderedParticle::SIZE);
        assert_eq!(collector.info.map(|i| i.generation), Some(3));
    }
}
