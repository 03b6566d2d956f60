//! # Explosion Integration Test
//!
//! Drives the effect layer through a renderer defined outside the engine
//! crate, the way a game's sprite batcher would.

use ember_effects::{EffectError, EffectKind, EffectManager};
use ember_particles::{FrameInfo, ParticleRenderer, RenderedParticle};
use ember_shared::Vec2;

const DT: f32 = 1.0 / 60.0;

/// Sprite batch stand-in: accumulates every particle of every layer.
#[derive(Default)]
struct SpriteBatch {
    particles: Vec<RenderedParticle>,
    open_frames: usize,
    frames: usize,
    additive_frames: usize,
}

impl SpriteBatch {
    fn flush(&mut self) -> Vec<RenderedParticle> {
        std::mem::take(&mut self.particles)
    }
}

impl ParticleRenderer for SpriteBatch {
    fn begin_frame(&mut self, info: &FrameInfo) {
        self.open_frames += 1;
        if info.blend_func.dst == ember_particles::BlendFactor::One {
            self.additive_frames += 1;
        }
    }

    fn draw_particle(&mut self, particle: &RenderedParticle) {
        assert_eq!(self.open_frames, 1, "particle drawn outside a frame");
        self.particles.push(*particle);
    }

    fn end_frame(&mut self) {
        self.open_frames -= 1;
        self.frames += 1;
    }
}

/// Test: First-frame particles sit around the explosion point.
#[test]
fn test_explosions_start_at_their_position() {
    let mut manager = EffectManager::new(7);
    let mut batch = SpriteBatch::default();

    let small_at = Vec2::new(100.0, 50.0);
    manager.create_explosion(small_at).unwrap();
    manager.update(DT, &mut batch).unwrap();
    let drawn = batch.flush();
    assert!(!drawn.is_empty());
    assert!(drawn.iter().all(|p| p.position.distance(small_at) < 30.0));
    // One frame per layer, both additive
    assert_eq!(batch.frames, EffectKind::SmallExplosion.layers().len());
    assert_eq!(batch.additive_frames, 2);

    manager.clear();
    let big_at = Vec2::new(-40.0, 300.0);
    manager.create_big_explosion(big_at).unwrap();
    manager.update(DT, &mut batch).unwrap();
    let drawn = batch.flush();
    assert!(!drawn.is_empty());
    assert!(drawn.iter().all(|p| p.position.distance(big_at) < 30.0));
}

/// Test: Same seed and same calls replay identically, pooled or not.
#[test]
fn test_effect_runs_are_deterministic() {
    fn run(seed: u64) -> Vec<Vec<RenderedParticle>> {
        let mut manager = EffectManager::new(seed);
        let mut batch = SpriteBatch::default();
        let mut frames = Vec::new();
        for frame in 0..240 {
            if frame % 40 == 0 {
                manager.create_explosion(Vec2::new(frame as f32, 0.0)).unwrap();
            }
            if frame % 90 == 0 {
                manager.create_big_explosion(Vec2::new(0.0, frame as f32)).unwrap();
            }
            manager.update(DT, &mut batch).unwrap();
            frames.push(batch.flush());
        }
        frames
    }

    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

/// Test: A sustained barrage stays within the live limits and pools stay bounded.
#[test]
fn test_barrage_is_bounded() {
    let mut manager = EffectManager::new(11);
    let mut batch = SpriteBatch::default();
    let mut rejected = 0;

    for frame in 0..600 {
        for kind in EffectKind::ALL {
            match manager.spawn(kind, Vec2::new((frame % 17) as f32, (frame % 5) as f32)) {
                Ok(_) => {}
                Err(EffectError::LiveLimitReached { kind: k, limit }) => {
                    assert_eq!(k, kind);
                    assert_eq!(limit, kind.live_limit());
                    rejected += 1;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        manager.update(DT, &mut batch).unwrap();
        batch.flush();

        for kind in EffectKind::ALL {
            assert!(manager.live_count(kind) <= kind.live_limit());
            assert!(manager.live_count(kind) + manager.pool_len(kind) <= kind.live_limit());
        }
    }

    assert!(rejected > 0);
    assert_eq!(batch.open_frames, 0);
}
