//! # Variance RNG
//!
//! The only randomness source in the engine. Every `base +/- variance`
//! draw goes through here, so a fixed seed and a fixed sequence of frame
//! deltas reproduce a run bit for bit.

use ember_shared::{Color4F, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded generator for symmetric variance draws.
#[derive(Debug, Clone)]
pub struct VarianceRng {
    rng: ChaCha8Rng,
}

impl VarianceRng {
    /// Creates a generator from a 64-bit seed.
    #[must_use]
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Wraps an already-seeded ChaCha stream.
    #[must_use]
    pub const fn from_rng(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    /// Uniform sample in `[-1, 1)`.
    #[inline]
    pub fn minus_one_to_one(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// `base + variance * uniform(-1, 1)`.
    #[inline]
    pub fn vary(&mut self, base: f32, variance: f32) -> f32 {
        base + variance * self.minus_one_to_one()
    }

    /// Per-axis variance draw.
    #[inline]
    pub fn vary_vec2(&mut self, base: Vec2, variance: Vec2) -> Vec2 {
        let x = self.vary(base.x, variance.x);
        let y = self.vary(base.y, variance.y);
        Vec2::new(x, y)
    }

    /// Per-channel variance draw.
    #[inline]
    pub fn vary_color(&mut self, base: Color4F, variance: Color4F) -> Color4F {
        let r = self.vary(base.r, variance.r);
        let g = self.vary(base.g, variance.g);
        let b = self.vary(base.b, variance.b);
        let a = self.vary(base.a, variance.a);
        Color4F::new(r, g, b, a)
    }

    /// Raw 64-bit draw, used to derive independent child streams.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.gen()
    }
}
